//! Global listeners for server lifecycle and client events
//!
//! Callbacks are stored in thread-safe registries and invoked when the
//! corresponding FFI entry point fires. Every listener gets its key from one
//! shared key registry, and each listener type stores its callbacks in a
//! secondary map under that same key.
//!
//! # Example
//!
//! ```ignore
//! use cs2modes_core::listeners;
//!
//! // Register a map start callback
//! let key = listeners::on_map_start(|map_name| {
//!     tracing::info!("Map started: {}", map_name);
//! });
//!
//! // Later, unregister if needed
//! listeners::remove_listener(key);
//! ```

pub mod client;
pub mod server;

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Key for registered listeners, used for removal
    pub struct ListenerKey;
}

/// Internal enum to track which registry a listener belongs to
#[derive(Clone, Copy, Debug)]
enum ListenerType {
    Tick,
    MapStart,
    MapEnd,
    ClientPutInServer,
}

/// Mapping from ListenerKey to its type for removal
struct KeyRegistry {
    keys: SlotMap<ListenerKey, ListenerType>,
}

static KEY_REGISTRY: LazyLock<RwLock<KeyRegistry>> = LazyLock::new(|| {
    RwLock::new(KeyRegistry {
        keys: SlotMap::with_key(),
    })
});

/// Register a key in the global registry
fn register_key(listener_type: ListenerType) -> ListenerKey {
    KEY_REGISTRY.write().keys.insert(listener_type)
}

/// Callbacks of one listener type, keyed by their global listener key
pub(crate) struct CallbackRegistry<C: ?Sized> {
    callbacks: SecondaryMap<ListenerKey, Arc<C>>,
}

impl<C: ?Sized> CallbackRegistry<C> {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: SecondaryMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: ListenerKey, callback: Arc<C>) {
        self.callbacks.insert(key, callback);
    }

    pub(crate) fn remove(&mut self, key: ListenerKey) -> bool {
        self.callbacks.remove(key).is_some()
    }

    /// Clone out the callbacks so they can run without the lock held
    pub(crate) fn snapshot(&self) -> Vec<Arc<C>> {
        self.callbacks.values().cloned().collect()
    }
}

/// Remove a listener by its key
///
/// Returns `true` if the listener was found and removed.
pub fn remove_listener(key: ListenerKey) -> bool {
    let listener_type = KEY_REGISTRY.write().keys.remove(key);

    match listener_type {
        Some(ListenerType::Tick) => server::remove_tick(key),
        Some(ListenerType::MapStart) => server::remove_map_start(key),
        Some(ListenerType::MapEnd) => server::remove_map_end(key),
        Some(ListenerType::ClientPutInServer) => client::remove_client_put_in_server(key),
        None => false,
    }
}

// Re-export public API
pub use client::on_client_put_in_server;
pub use server::{on_map_end, on_map_start, on_tick};

// Re-export fire functions for FFI layer (used by plugin crate)
pub use client::fire_client_put_in_server;
pub use server::{fire_map_end, fire_map_start, fire_tick};
