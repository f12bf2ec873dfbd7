//! Command line tokenizing and chat trigger detection

/// Public chat trigger (message shown in chat)
pub const PUBLIC_TRIGGER: char = '!';

/// Silent chat trigger (message hidden from chat)
pub const SILENT_TRIGGER: char = '/';

/// Split a console line into arguments
///
/// Arguments are separated by whitespace. Double quotes group an argument
/// and are not part of it; an unterminated quote runs to the end of the line.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }
    args
}

/// Check if a chat message starts with a command trigger
///
/// Returns `(is_silent, command_text)` if a trigger is found.
pub fn check_chat_trigger(message: &str) -> Option<(bool, &str)> {
    let first_char = message.chars().next()?;

    if first_char == PUBLIC_TRIGGER {
        Some((false, &message[first_char.len_utf8()..]))
    } else if first_char == SILENT_TRIGGER {
        Some((true, &message[first_char.len_utf8()..]))
    } else {
        None
    }
}
