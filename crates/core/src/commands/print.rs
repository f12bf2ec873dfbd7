//! Message output routed through the installed host
//!
//! Falls back to logging when no host is installed (unit tests, early load).

use crate::host;

/// Print a message to a player's chat
pub fn print_to_chat(slot: i32, message: &str) {
    match host::host() {
        Some(host) => host.print_to_chat(slot, message),
        None => tracing::info!("[Chat -> {}] {}", slot, message),
    }
}

/// Print a message to a player's console
pub fn print_to_console(slot: i32, message: &str) {
    match host::host() {
        Some(host) => host.print_to_console(slot, message),
        None => tracing::info!("[Console -> {}] {}", slot, message),
    }
}

/// Print a message to all players' chat
pub fn print_to_chat_all(message: &str) {
    match host::host() {
        Some(host) => host.print_to_chat_all(message),
        None => tracing::info!("[ChatAll] {}", message),
    }
}

/// Print a message to the server console
pub fn print_to_server_console(message: &str) {
    match host::host() {
        Some(host) => host.print_to_server_console(message),
        None => tracing::info!("[Server] {}", message),
    }
}
