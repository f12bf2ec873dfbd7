//! cs2modes proc macros
//!
//! - `#[console_command]` - Register console/chat commands
//!
//! # Example
//!
//! ```ignore
//! use cs2modes_core::commands::{CommandInfo, CommandResult};
//! use cs2modes_core::host::PlayerInfo;
//! use cs2modes_macros::console_command;
//!
//! #[console_command("css_spawns", "Generate extra spawns")]
//! fn cmd_spawns(player: Option<&PlayerInfo>, info: &CommandInfo) -> CommandResult {
//!     info.reply("[ExtraSpawns] Extra spawns generated.");
//!     CommandResult::Handled
//! }
//!
//! // Generated:
//! // - cmd_spawns() - The command handler
//! // - cmd_spawns_register() - Register the command
//! // - cmd_spawns_unregister() - Unregister the command
//! ```

mod console_command;

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

/// Attribute macro for console command registration
///
/// # Arguments
///
/// - First argument: Command name (e.g., `"css_zeus_mode"`)
/// - Second argument: Command description
/// - Optional: `server_only` - reject calls from players
///
/// The function must take `(Option<&PlayerInfo>, &CommandInfo)` and return
/// `CommandResult`. A `{name}_register()` / `{name}_unregister()` pair is
/// generated alongside it; the pair can be called again after a reload.
#[proc_macro_attribute]
pub fn console_command(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as console_command::ConsoleCommandArgs);
    let func = parse_macro_input!(item as ItemFn);
    console_command::generate_console_command(args, func).into()
}
