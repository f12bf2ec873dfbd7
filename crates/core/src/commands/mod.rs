//! Console and Chat Command System
//!
//! The bridge forwards client console commands to [`dispatch_command`] and
//! chat messages to [`dispatch_chat`].
//!
//! # Prefixes
//!
//! - Commands with `csr_` or `css_` prefix also register as chat commands
//! - Example: `css_spawns` can be called as `!spawns` or `/spawns` in chat
//! - `/` commands are silent: the original chat message is suppressed
//!
//! # Example
//!
//! ```ignore
//! use cs2modes_core::commands::{add_command_listener, register_command, CommandResult};
//! use cs2modes_core::events::HookResult;
//!
//! register_command("css_spawns", "Generate extra spawns", |_player, info| {
//!     info.reply("[ExtraSpawns] Extra spawns generated.");
//!     CommandResult::Handled
//! });
//!
//! add_command_listener("buy", |_player, info| {
//!     if info.arg(1) == "awp" { HookResult::Stop } else { HookResult::Continue }
//! });
//! ```

mod info;
mod manager;
mod parse;
pub mod print;

pub use info::{CommandCallback, CommandContext, CommandInfo, CommandResult, ListenerCallback};
pub use manager::{
    add_command_listener, dispatch_chat, dispatch_command, register_command, register_command_ex,
    register_server_command, remove_command_listener, unregister_command, CommandKey,
    CommandListenerKey, CommandManager, COMMANDS, CSS_PREFIX, DEFAULT_PREFIX,
};
pub use parse::{check_chat_trigger, tokenize, PUBLIC_TRIGGER, SILENT_TRIGGER};
