//! Client listeners
//!
//! - OnClientPutInServer: Called when a client fully enters the game

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::{register_key, CallbackRegistry, ListenerKey, ListenerType};

/// Callback for client put in server: (slot)
pub type ClientPutInServerCallback = dyn Fn(i32) + Send + Sync;

static CLIENT_PUT_IN_SERVER_REGISTRY: LazyLock<RwLock<CallbackRegistry<ClientPutInServerCallback>>> =
    LazyLock::new(|| RwLock::new(CallbackRegistry::new()));

/// Register a callback to be called when a client is put in server
///
/// This is called after the client has fully connected and entered the game.
/// The callback receives the player slot (0-63).
///
/// # Returns
/// A key that can be used to unregister the callback via `remove_listener`.
pub fn on_client_put_in_server<F>(callback: F) -> ListenerKey
where
    F: Fn(i32) + Send + Sync + 'static,
{
    let key = register_key(ListenerType::ClientPutInServer);
    CLIENT_PUT_IN_SERVER_REGISTRY
        .write()
        .insert(key, Arc::new(callback));
    key
}

pub(super) fn remove_client_put_in_server(key: ListenerKey) -> bool {
    CLIENT_PUT_IN_SERVER_REGISTRY.write().remove(key)
}

/// Fire all client put in server callbacks
pub fn fire_client_put_in_server(slot: i32) {
    tracing::debug!("Firing OnClientPutInServer: slot={}", slot);
    let callbacks = CLIENT_PUT_IN_SERVER_REGISTRY.read().snapshot();
    for callback in callbacks {
        callback(slot);
    }
}
