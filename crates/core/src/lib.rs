//! cs2modes core runtime
//!
//! Event, listener, command and timer registries shared by the game mode
//! plugins, plus the [`GameHost`] seam through which every game-state read
//! and mutation goes.
//!
//! The plugin crate installs a host backed by the C++ bridge at load time and
//! forwards engine callbacks into the `fire_*`/`dispatch_*` functions here.

// Allow the crate to refer to itself as `cs2modes_core` for proc macro compatibility
extern crate self as cs2modes_core;

use tracing::info;

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod listeners;
#[cfg(any(test, feature = "test-host"))]
pub mod testing;
pub mod timers;

pub use commands::{
    add_command_listener, register_command, register_server_command, remove_command_listener,
    unregister_command, CommandContext, CommandInfo, CommandKey, CommandListenerKey, CommandResult,
};
pub use config::{duration_from_secs, ConfigError, ConfigResult, CoreConfig, PluginConfig};
pub use error::HostError;
pub use events::{
    register_event, register_typed_event, unregister_event, EventInfo, EventSource, GameEvent,
    HookResult,
};
pub use host::{
    host, install_host, uninstall_host, ConVarValue, EntityIndex, GameHost, PlayerInfo, QAngle,
    Team, Vector,
};
pub use listeners::{
    on_client_put_in_server, on_map_end, on_map_start, on_tick, remove_listener, ListenerKey,
};
pub use timers::{
    add_repeating_timer, add_timer, add_timer_with_flags, remove_timer, TimerFlags, TimerKey,
};

pub use cs2modes_macros::console_command;

/// Shut the runtime down
///
/// Drops pending timers and releases the host. Called from the FFI layer
/// after the plugins have unloaded.
pub fn shutdown() {
    info!("cs2modes shutting down...");
    timers::clear_timers();
    if host::uninstall_host().is_some() {
        info!("Game host released");
    }
}
