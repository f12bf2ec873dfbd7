//! Command manager - registration and dispatch

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use super::info::{CommandCallback, CommandContext, CommandInfo, CommandResult, ListenerCallback};
use super::parse::check_chat_trigger;
use crate::events::HookResult;
use crate::host::PlayerInfo;

new_key_type! {
    /// Handle for a registered command
    pub struct CommandKey;

    /// Handle for a registered command listener
    pub struct CommandListenerKey;
}

/// Default command prefix
pub const DEFAULT_PREFIX: &str = "csr_";

/// CounterStrikeSharp compatibility prefix
pub const CSS_PREFIX: &str = "css_";

/// Registered command information
struct CommandEntry {
    /// Full command name (e.g., "css_spawns")
    name: String,
    /// Short name without prefix (e.g., "spawns")
    short_name: String,
    description: String,
    callback: Arc<CommandCallback>,
    /// Whether this is server-only
    server_only: bool,
}

struct ListenerEntry {
    /// Lowercased command name
    name: String,
    callback: Arc<ListenerCallback>,
}

/// Global command manager
pub struct CommandManager {
    commands: SlotMap<CommandKey, CommandEntry>,

    /// Lookup by full command name (lowercase)
    by_name: HashMap<String, CommandKey>,

    /// Lookup by short name for chat commands (lowercase)
    by_short_name: HashMap<String, CommandKey>,

    /// Listeners that run before the command is handled
    listeners: SlotMap<CommandListenerKey, ListenerEntry>,
}

impl CommandManager {
    fn new() -> Self {
        Self {
            commands: SlotMap::with_key(),
            by_name: HashMap::new(),
            by_short_name: HashMap::new(),
            listeners: SlotMap::with_key(),
        }
    }

    fn register(
        &mut self,
        name: &str,
        description: &str,
        server_only: bool,
        callback: Arc<CommandCallback>,
    ) -> Option<CommandKey> {
        let name_lower = name.to_lowercase();

        if self.by_name.contains_key(&name_lower) {
            tracing::warn!("Command '{}' already registered", name);
            return None;
        }

        let short_name = strip_prefix(&name_lower).to_string();

        let entry = CommandEntry {
            name: name.to_string(),
            short_name: short_name.clone(),
            description: description.to_string(),
            callback,
            server_only,
        };

        let key = self.commands.insert(entry);

        // Only register short name if it's different from the full name
        if short_name != name_lower {
            self.by_short_name.insert(short_name, key);
        }
        self.by_name.insert(name_lower, key);

        tracing::debug!("Registered command: {}", name);
        Some(key)
    }

    fn unregister(&mut self, key: CommandKey) -> bool {
        let Some(entry) = self.commands.remove(key) else {
            return false;
        };

        self.by_name.remove(&entry.name.to_lowercase());
        if self.by_short_name.get(&entry.short_name) == Some(&key) {
            self.by_short_name.remove(&entry.short_name);
        }
        tracing::debug!("Unregistered command: {}", entry.name);
        true
    }

    /// Find command by full name
    pub fn find_by_name(&self, name: &str) -> Option<CommandKey> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    /// Find command by short name (for chat commands)
    pub fn find_by_short_name(&self, name: &str) -> Option<CommandKey> {
        self.by_short_name.get(&name.to_lowercase()).copied()
    }

    /// Resolve a chat command: short name, then `csr_`, then `css_`
    fn resolve_chat(&self, short_name: &str) -> Option<CommandKey> {
        self.find_by_short_name(short_name)
            .or_else(|| self.find_by_name(&format!("{}{}", DEFAULT_PREFIX, short_name)))
            .or_else(|| self.find_by_name(&format!("{}{}", CSS_PREFIX, short_name)))
    }

    /// Get command description
    pub fn get_description(&self, key: CommandKey) -> Option<&str> {
        self.commands.get(key).map(|e| e.description.as_str())
    }

    /// Get command name
    pub fn get_name(&self, key: CommandKey) -> Option<&str> {
        self.commands.get(key).map(|e| e.name.as_str())
    }

    /// Iterate over all registered commands as `(key, name, description)`
    pub fn iter(&self) -> impl Iterator<Item = (CommandKey, &str, &str)> {
        self.commands
            .iter()
            .map(|(key, entry)| (key, entry.name.as_str(), entry.description.as_str()))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn add_listener(&mut self, name: &str, callback: Arc<ListenerCallback>) -> CommandListenerKey {
        self.listeners.insert(ListenerEntry {
            name: name.to_lowercase(),
            callback,
        })
    }

    fn remove_listener(&mut self, key: CommandListenerKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    /// Snapshot listeners for a command, in registration order
    fn listeners_for(&self, name: &str) -> Vec<Arc<ListenerCallback>> {
        let name = name.to_lowercase();
        self.listeners
            .values()
            .filter(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.callback))
            .collect()
    }

    fn command(&self, key: CommandKey) -> Option<(Arc<CommandCallback>, bool)> {
        self.commands
            .get(key)
            .map(|entry| (Arc::clone(&entry.callback), entry.server_only))
    }
}

fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(DEFAULT_PREFIX)
        .or_else(|| name.strip_prefix(CSS_PREFIX))
        .unwrap_or(name)
}

/// Global command manager instance
pub static COMMANDS: LazyLock<RwLock<CommandManager>> =
    LazyLock::new(|| RwLock::new(CommandManager::new()));

/// Register a command
///
/// Names are case-insensitive. Names carrying the `csr_` or `css_` prefix can
/// also be called from chat without it (`!spawns`, `/spawns`).
///
/// # Example
/// ```ignore
/// use cs2modes_core::commands::{register_command, CommandResult};
///
/// let key = register_command("css_spawns", "Generate extra spawns", |_player, info| {
///     info.reply("[ExtraSpawns] Extra spawns generated.");
///     CommandResult::Handled
/// });
/// ```
pub fn register_command<F>(name: &str, description: &str, callback: F) -> Option<CommandKey>
where
    F: Fn(Option<&PlayerInfo>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
{
    register_command_ex(name, description, false, callback)
}

/// Register a command with extended options
///
/// Called by the `#[console_command]` macro.
pub fn register_command_ex<F>(
    name: &str,
    description: &str,
    server_only: bool,
    callback: F,
) -> Option<CommandKey>
where
    F: Fn(Option<&PlayerInfo>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
{
    COMMANDS
        .write()
        .register(name, description, server_only, Arc::new(callback))
}

/// Register a server-only command
///
/// Server-only commands can only be executed from the server console.
pub fn register_server_command<F>(name: &str, description: &str, callback: F) -> Option<CommandKey>
where
    F: Fn(Option<&PlayerInfo>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
{
    register_command_ex(name, description, true, callback)
}

/// Unregister a command
pub fn unregister_command(key: CommandKey) -> bool {
    COMMANDS.write().unregister(key)
}

/// Listen to a command before it is handled
///
/// Works for engine commands such as `buy` as well as registered ones.
/// Returning [`HookResult::Handled`] or higher blocks the command.
pub fn add_command_listener<F>(name: &str, callback: F) -> CommandListenerKey
where
    F: Fn(Option<&PlayerInfo>, &CommandInfo) -> HookResult + Send + Sync + 'static,
{
    COMMANDS.write().add_listener(name, Arc::new(callback))
}

/// Remove a command listener
pub fn remove_command_listener(key: CommandListenerKey) -> bool {
    COMMANDS.write().remove_listener(key)
}

/// Dispatch a console command line
///
/// Listeners for the command run first; a blocking listener result returns
/// [`CommandResult::Block`] without running the command.
pub fn dispatch_command(player: Option<PlayerInfo>, line: &str) -> CommandResult {
    let context = if player.is_some() {
        CommandContext::ClientConsole
    } else {
        CommandContext::ServerConsole
    };

    let info = CommandInfo::from_line(line, player, context);
    if info.arg_count() == 0 {
        return CommandResult::Continue;
    }

    let name = info.command_name().to_string();
    let (listeners, command) = {
        let manager = COMMANDS.read();
        let command = manager.find_by_name(&name).and_then(|key| manager.command(key));
        (manager.listeners_for(&name), command)
    };

    for listener in listeners {
        if listener(info.player(), &info).blocks() {
            tracing::debug!("Command '{}' blocked by listener", name);
            return CommandResult::Block;
        }
    }

    match command {
        Some((callback, server_only)) => execute(&*callback, server_only, &info),
        None => CommandResult::Continue,
    }
}

/// Dispatch a chat message, running it as a command if it has a trigger
///
/// Returns [`CommandResult::Block`] for silent (`/`) commands so the bridge
/// suppresses the original message.
pub fn dispatch_chat(player: PlayerInfo, message: &str) -> CommandResult {
    let Some((is_silent, command_text)) = check_chat_trigger(message.trim()) else {
        return CommandResult::Continue;
    };

    let context = if is_silent {
        CommandContext::ChatSilent
    } else {
        CommandContext::ChatPublic
    };

    let info = CommandInfo::from_line(command_text, Some(player), context);
    if info.arg_count() == 0 {
        return CommandResult::Continue;
    }

    let command = {
        let manager = COMMANDS.read();
        manager
            .resolve_chat(info.command_name())
            .and_then(|key| manager.command(key))
    };

    let Some((callback, server_only)) = command else {
        return CommandResult::Continue;
    };

    let result = execute(&*callback, server_only, &info);
    if is_silent {
        CommandResult::Block
    } else {
        result
    }
}

fn execute(callback: &CommandCallback, server_only: bool, info: &CommandInfo) -> CommandResult {
    if server_only && info.player().is_some() {
        info.reply("This command can only be executed from the server console.");
        return CommandResult::Handled;
    }
    callback(info.player(), info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Team;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn handled() -> Arc<CommandCallback> {
        Arc::new(|_: Option<&PlayerInfo>, _: &CommandInfo| CommandResult::Handled)
    }

    fn player(slot: i32) -> PlayerInfo {
        PlayerInfo {
            slot,
            steam_id: 76561198000000000 + slot as u64,
            name: format!("player{}", slot),
            team: Team::Terrorist,
            is_valid: true,
            pawn_alive: true,
        }
    }

    #[test]
    fn test_register_command() {
        let mut manager = CommandManager::new();

        let key = manager
            .register("csr_test", "Test command", false, handled())
            .unwrap();

        assert!(manager.find_by_name("csr_test").is_some());
        assert!(manager.find_by_name("CSR_TEST").is_some());
        assert!(manager.find_by_short_name("test").is_some());
        assert_eq!(manager.get_description(key), Some("Test command"));
        assert_eq!(manager.get_name(key), Some("csr_test"));
    }

    #[test]
    fn test_register_css_prefix() {
        let mut manager = CommandManager::new();
        manager
            .register("css_slap", "Slap command", false, handled())
            .unwrap();

        assert!(manager.find_by_name("css_slap").is_some());
        assert_eq!(manager.resolve_chat("slap"), manager.find_by_name("css_slap"));
        assert!(manager.resolve_chat("unknown").is_none());
    }

    #[test]
    fn test_unregister_command() {
        let mut manager = CommandManager::new();
        let key = manager.register("csr_temp", "Temporary", false, handled()).unwrap();

        assert!(manager.unregister(key));
        assert!(manager.find_by_name("csr_temp").is_none());
        assert!(manager.find_by_short_name("temp").is_none());
        assert!(!manager.unregister(key));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut manager = CommandManager::new();

        assert!(manager.register("csr_dupe", "First", false, handled()).is_some());
        assert!(manager.register("CSR_DUPE", "Second", false, handled()).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_dispatch_command_passes_args() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = Arc::clone(&seen);
        let key = register_command("css_dispatch_args_test", "", move |player, info| {
            assert!(player.is_none());
            assert_eq!(info.context(), CommandContext::ServerConsole);
            seen_cb.store(info.arg(1).parse().unwrap_or(0), Ordering::SeqCst);
            CommandResult::Handled
        })
        .unwrap();

        assert_eq!(dispatch_command(None, "css_dispatch_args_test 7"), CommandResult::Handled);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
        assert_eq!(dispatch_command(None, "not_registered_anywhere"), CommandResult::Continue);
        assert_eq!(dispatch_command(None, "   "), CommandResult::Continue);

        unregister_command(key);
    }

    #[test]
    fn test_listener_blocks_command() {
        let key = add_command_listener("dispatch_listener_test", |player, info| {
            if player.is_some() && info.arg(1) == "awp" {
                HookResult::Stop
            } else {
                HookResult::Continue
            }
        });

        assert_eq!(
            dispatch_command(Some(player(1)), "dispatch_listener_test awp"),
            CommandResult::Block
        );
        assert_eq!(
            dispatch_command(Some(player(1)), "dispatch_listener_test taser"),
            CommandResult::Continue
        );

        assert!(remove_command_listener(key));
        assert_eq!(
            dispatch_command(Some(player(1)), "dispatch_listener_test awp"),
            CommandResult::Continue
        );
    }

    #[test]
    fn test_server_only_rejects_players() {
        let key = register_server_command("csr_server_only_test", "", |_, _| CommandResult::Block)
            .unwrap();

        assert_eq!(dispatch_command(Some(player(2)), "csr_server_only_test"), CommandResult::Handled);
        assert_eq!(dispatch_command(None, "csr_server_only_test"), CommandResult::Block);

        unregister_command(key);
    }

    #[test]
    fn test_dispatch_chat_triggers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let key = register_command("css_chat_trigger_test", "", move |player, info| {
            assert_eq!(player.map(|p| p.slot), Some(3));
            assert!(info.context().is_chat());
            calls_cb.fetch_add(1, Ordering::SeqCst);
            CommandResult::Handled
        })
        .unwrap();

        assert_eq!(dispatch_chat(player(3), "!chat_trigger_test"), CommandResult::Handled);
        assert_eq!(dispatch_chat(player(3), "/chat_trigger_test"), CommandResult::Block);
        assert_eq!(dispatch_chat(player(3), "chat_trigger_test"), CommandResult::Continue);
        assert_eq!(dispatch_chat(player(3), "/no_such_chat_command"), CommandResult::Continue);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        unregister_command(key);
    }
}
