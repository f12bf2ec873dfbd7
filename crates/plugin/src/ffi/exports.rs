//! C-compatible exports called by the C++ bridge

use std::ffi::{c_char, c_int, CStr};
use std::sync::Arc;

use tracing::instrument;
use tracing_subscriber::EnvFilter;

use cs2modes_core::commands::{self, CommandResult};
use cs2modes_core::events::{fire_event_post, fire_event_pre};
use cs2modes_core::host::{self, PlayerInfo};
use cs2modes_core::{listeners, timers, CoreConfig};

use super::bridge::{BridgedEvent, EventBridge, HostBridge, NativeHost};
use crate::BridgeError;

// Plugin metadata - static strings with null terminators for C compatibility
static AUTHOR: &[u8] = b"dollan\0";
static NAME: &[u8] = b"cs2modes\0";
static DESCRIPTION: &[u8] = b"Extra Spawns and Zeus Only Mode for Counter-Strike 2\0";
static URL: &[u8] = b"https://github.com/dollannn/cs2-gamemodes\0";
static LICENSE: &[u8] = b"MIT\0";
static VERSION: &[u8] = b"0.1.0\0";
static DATE: &[u8] = b"2025-01-15\0";
static LOG_TAG: &[u8] = b"CS2MODES\0";

/// Initialize tracing once, level from `core.toml` unless `RUST_LOG` is set
fn init_logging() {
    let config = CoreConfig::load().unwrap_or_default();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Install the native host and load every plugin
///
/// # Safety
/// `host_table` must be null or point to a valid [`HostBridge`].
unsafe fn load(host_table: *const HostBridge) -> Result<(), BridgeError> {
    let native = NativeHost::from_raw(host_table)?;
    host::install_host(Arc::new(native))?;
    crate::load_plugins()?;
    Ok(())
}

/// Called when the plugin is loaded by Metamod
///
/// # Safety
/// - `host_table` must point to a [`HostBridge`] that outlives the plugin
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn rust_plugin_load(
    host_table: *const HostBridge,
    error: *mut c_char,
    maxlen: usize,
    late: bool,
) -> bool {
    init_logging();
    tracing::info!("cs2modes loading (late: {})...", late);

    if let Err(e) = load(host_table) {
        tracing::error!("Failed to load: {}", e);
        write_error(error, maxlen, &e.to_string());
        crate::shutdown();
        return false;
    }

    tracing::info!("cs2modes loaded successfully!");
    tracing::debug!("Main thread ID: {:?}", std::thread::current().id());
    true
}

/// Called when the plugin is unloaded by Metamod
///
/// # Safety
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn rust_plugin_unload(error: *mut c_char, maxlen: usize) -> bool {
    tracing::info!("cs2modes unloading...");

    match std::panic::catch_unwind(crate::shutdown) {
        Ok(()) => true,
        Err(_) => {
            write_error(error, maxlen, "Panic during shutdown");
            false
        }
    }
}

// Metadata exports - these return static strings for Metamod to display

#[no_mangle]
pub extern "C" fn rust_get_author() -> *const c_char {
    AUTHOR.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_name() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_description() -> *const c_char {
    DESCRIPTION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_url() -> *const c_char {
    URL.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_license() -> *const c_char {
    LICENSE.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_date() -> *const c_char {
    DATE.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rust_get_log_tag() -> *const c_char {
    LOG_TAG.as_ptr() as *const c_char
}

/// Called from C++ SourceHook every server frame
#[no_mangle]
pub extern "C" fn rust_on_game_frame(_simulating: bool, _first_tick: bool, _last_tick: bool) {
    timers::process();
    listeners::fire_tick();
}

// === Listener FFI exports ===

/// Called from C++ when a map starts (ServerActivate hook)
///
/// # Safety
/// - `map_name` must be a valid null-terminated C string or null
#[no_mangle]
pub unsafe extern "C" fn rust_on_map_start(map_name: *const c_char) {
    let Some(name) = cstr(map_name) else {
        return;
    };
    listeners::fire_map_start(&name);
}

/// Called from C++ when a map ends (GameShutdown hook)
#[no_mangle]
pub extern "C" fn rust_on_map_end() {
    listeners::fire_map_end();
}

/// Called from C++ when a client is put in server (ClientPutInServer hook)
#[no_mangle]
pub extern "C" fn rust_on_client_put_in_server(slot: c_int) {
    listeners::fire_client_put_in_server(slot);
}

// === Event FFI exports ===

/// Called from C++ before the engine fires a game event
///
/// Returns false when a handler blocked the event. The possibly changed
/// broadcast flag is written to `out_dont_broadcast`.
///
/// # Safety
/// - `event` must point to an [`EventBridge`] valid for this call, or be null
/// - `out_dont_broadcast` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn rust_on_fire_event(
    event: *const EventBridge,
    dont_broadcast: bool,
    out_dont_broadcast: *mut bool,
) -> bool {
    let Some(event) = event.as_ref().and_then(|e| BridgedEvent::new(e)) else {
        return true;
    };

    let outcome = fire_event_pre(&event, dont_broadcast);
    if !out_dont_broadcast.is_null() {
        *out_dont_broadcast = outcome.dont_broadcast;
    }
    outcome.should_fire
}

/// Called from C++ after the engine fired a game event
///
/// # Safety
/// - `event` must point to an [`EventBridge`] valid for this call, or be null
#[no_mangle]
pub unsafe extern "C" fn rust_on_fire_event_post(event: *const EventBridge, dont_broadcast: bool) {
    if let Some(event) = event.as_ref().and_then(|e| BridgedEvent::new(e)) {
        fire_event_post(&event, dont_broadcast);
    }
}

// === Command FFI exports ===

/// Resolve the caller of a command, `None` for the server console
fn caller(slot: c_int) -> Option<PlayerInfo> {
    if slot < 0 {
        return None;
    }
    host::host()?.player(slot)
}

/// Called from C++ before a console command is dispatched
///
/// `slot` is -1 for the server console. Returns a [`CommandResult`] as an
/// integer; [`CommandResult::Block`] means the engine must not run it.
///
/// # Safety
/// - `line` must be a valid null-terminated C string or null
#[no_mangle]
pub unsafe extern "C" fn rust_on_client_command(slot: c_int, line: *const c_char) -> c_int {
    let Some(line) = cstr(line) else {
        return CommandResult::Continue as c_int;
    };
    commands::dispatch_command(caller(slot), &line) as c_int
}

/// Called from C++ when a player sends a chat message (Host_Say hook)
///
/// [`CommandResult::Block`] means the original message must be suppressed.
///
/// # Safety
/// - `message` must be a valid null-terminated C string or null
#[no_mangle]
pub unsafe extern "C" fn rust_on_client_say(slot: c_int, message: *const c_char) -> c_int {
    let (Some(message), Some(player)) = (cstr(message), caller(slot)) else {
        return CommandResult::Continue as c_int;
    };
    commands::dispatch_chat(player, &message) as c_int
}

/// Copy a C string, lossily
///
/// # Safety
/// - `ptr` must be a valid null-terminated C string or null
unsafe fn cstr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Helper to write an error message to a C buffer
///
/// # Safety
/// - `error` must be a valid pointer or null
/// - `maxlen` must accurately reflect the buffer size
unsafe fn write_error(error: *mut c_char, maxlen: usize, msg: &str) {
    if !error.is_null() && maxlen > 0 {
        let bytes = msg.as_bytes();
        let len = bytes.len().min(maxlen - 1);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), error as *mut u8, len);
        *error.add(len) = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_truncates() {
        let mut buf = [0x7f as c_char; 8];
        unsafe { write_error(buf.as_mut_ptr(), buf.len(), "Host function table is null") };
        let written = unsafe { CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(written.to_bytes(), b"Host fu");

        // Null buffer is ignored
        unsafe { write_error(std::ptr::null_mut(), 16, "ignored") };
    }

    #[test]
    fn test_load_rejects_null_table() {
        let result = unsafe { load(std::ptr::null()) };
        assert!(matches!(result, Err(BridgeError::NullTable)));
    }

    #[test]
    fn test_null_strings_are_ignored() {
        unsafe {
            assert_eq!(
                rust_on_client_command(-1, std::ptr::null()),
                CommandResult::Continue as c_int
            );
            assert_eq!(
                rust_on_client_say(0, std::ptr::null()),
                CommandResult::Continue as c_int
            );
            assert!(rust_on_fire_event(std::ptr::null(), false, std::ptr::null_mut()));
            rust_on_map_start(std::ptr::null());
        }
    }

    #[test]
    fn test_metadata_strings_terminated() {
        for ptr in [rust_get_name(), rust_get_version(), rust_get_log_tag()] {
            let value = unsafe { CStr::from_ptr(ptr) };
            assert!(!value.to_bytes().is_empty());
        }
    }
}
