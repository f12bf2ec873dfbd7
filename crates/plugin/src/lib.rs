//! cs2modes plugin - FFI layer
//!
//! Compiles to the cdylib loaded by the C++ Metamod bridge. The bridge hands
//! over a [`ffi::HostBridge`] function table at load time and forwards engine
//! callbacks to the `rust_*` exports, which drive the game mode plugins.

mod error;
pub mod ffi;

pub use error::BridgeError;

/// Plugins hosted by this binary, in load order
pub(crate) fn load_plugins() -> Result<(), cs2modes_core::HostError> {
    extra_spawns::init()?;
    zeus_mode::init()?;
    Ok(())
}

/// Unload plugins in reverse order, then shut the runtime down
pub(crate) fn shutdown() {
    zeus_mode::unload();
    extra_spawns::unload();
    cs2modes_core::shutdown();
}
