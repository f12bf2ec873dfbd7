//! Command information types

use crate::events::HookResult;
use crate::host::PlayerInfo;

use super::print;

/// Command callback: `(caller, info) -> result`
pub type CommandCallback = dyn Fn(Option<&PlayerInfo>, &CommandInfo) -> CommandResult + Send + Sync;

/// Command listener callback, runs before the command is handled
pub type ListenerCallback = dyn Fn(Option<&PlayerInfo>, &CommandInfo) -> HookResult + Send + Sync;

/// Context from which a command was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandContext {
    /// Called from server console (no player)
    ServerConsole,
    /// Called from client console
    ClientConsole,
    /// Called from public chat (!cmd)
    ChatPublic,
    /// Called from silent chat (/cmd)
    ChatSilent,
}

impl CommandContext {
    /// Returns true if command was triggered from chat
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::ChatPublic | Self::ChatSilent)
    }

    /// Returns true if command was triggered from console
    pub fn is_console(&self) -> bool {
        matches!(self, Self::ServerConsole | Self::ClientConsole)
    }

    /// Returns true if this is a silent chat command (should not show in chat)
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::ChatSilent)
    }
}

/// Result of command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum CommandResult {
    /// Continue processing, allow other handlers
    #[default]
    Continue = 0,
    /// Command was handled, stop processing
    Handled = 1,
    /// Block the command entirely (prevent original behavior)
    Block = 2,
}

/// Information about a command invocation
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// Raw command arguments (index 0 is the command name)
    args: Vec<String>,

    /// Full command string including command name
    raw_string: String,

    /// Player who executed command (None if server console)
    player: Option<PlayerInfo>,

    /// Context of command invocation
    context: CommandContext,
}

impl CommandInfo {
    /// Create new CommandInfo
    pub fn new(
        args: Vec<String>,
        raw_string: String,
        player: Option<PlayerInfo>,
        context: CommandContext,
    ) -> Self {
        Self {
            args,
            raw_string,
            player,
            context,
        }
    }

    /// Build from a raw console line, tokenizing it
    pub fn from_line(line: &str, player: Option<PlayerInfo>, context: CommandContext) -> Self {
        Self::new(super::parse::tokenize(line), line.to_string(), player, context)
    }

    /// Get the number of arguments (including command name at index 0)
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get argument by index (0 = command name)
    ///
    /// Returns empty string if index is out of bounds.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    /// Get the command name (alias for arg(0))
    pub fn command_name(&self) -> &str {
        self.arg(0)
    }

    /// Get all arguments after command name as a single string
    pub fn arg_string(&self) -> String {
        if self.args.len() > 1 {
            self.args[1..].join(" ")
        } else {
            String::new()
        }
    }

    /// Get all arguments as a slice
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the full raw command string
    pub fn get_command_string(&self) -> &str {
        &self.raw_string
    }

    /// Get the player who executed the command (None for server console)
    pub fn player(&self) -> Option<&PlayerInfo> {
        self.player.as_ref()
    }

    /// Get the calling context
    pub fn context(&self) -> CommandContext {
        self.context
    }

    /// Get player slot (-1 for server console)
    pub fn player_slot(&self) -> i32 {
        self.player.as_ref().map(|p| p.slot).unwrap_or(-1)
    }

    /// Reply to the command (auto-routes to console or chat based on context)
    pub fn reply(&self, message: &str) {
        match (self.context, self.player.as_ref()) {
            (CommandContext::ClientConsole, Some(player)) => {
                print::print_to_console(player.slot, message);
            }
            (CommandContext::ChatPublic | CommandContext::ChatSilent, Some(player)) => {
                print::print_to_chat(player.slot, message);
            }
            _ => print::print_to_server_console(message),
        }
    }

    /// Reply with formatted message
    pub fn reply_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.reply(&args.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context() {
        assert!(CommandContext::ChatPublic.is_chat());
        assert!(CommandContext::ChatSilent.is_chat());
        assert!(!CommandContext::ServerConsole.is_chat());

        assert!(CommandContext::ServerConsole.is_console());
        assert!(CommandContext::ClientConsole.is_console());
        assert!(!CommandContext::ChatPublic.is_console());

        assert!(CommandContext::ChatSilent.is_silent());
        assert!(!CommandContext::ChatPublic.is_silent());
    }

    #[test]
    fn test_command_info() {
        let info = CommandInfo::from_line("css_zeus_mode 1 extra", None, CommandContext::ServerConsole);

        assert_eq!(info.arg_count(), 3);
        assert_eq!(info.command_name(), "css_zeus_mode");
        assert_eq!(info.arg(1), "1");
        assert_eq!(info.arg(2), "extra");
        assert_eq!(info.arg(999), "");
        assert_eq!(info.arg_string(), "1 extra");
        assert_eq!(info.get_command_string(), "css_zeus_mode 1 extra");
        assert_eq!(info.player_slot(), -1);
        assert!(info.player().is_none());
    }
}
