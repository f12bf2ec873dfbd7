//! Server lifecycle listeners
//!
//! - OnTick: Called every server tick (simplified GameFrame)
//! - OnMapStart: Called when a map is loaded
//! - OnMapEnd: Called when a map is unloaded

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::{register_key, CallbackRegistry, ListenerKey, ListenerType};

// Callback types
pub type TickCallback = dyn Fn() + Send + Sync;
pub type MapStartCallback = dyn Fn(&str) + Send + Sync;
pub type MapEndCallback = dyn Fn() + Send + Sync;

static TICK_REGISTRY: LazyLock<RwLock<CallbackRegistry<TickCallback>>> =
    LazyLock::new(|| RwLock::new(CallbackRegistry::new()));

static MAP_START_REGISTRY: LazyLock<RwLock<CallbackRegistry<MapStartCallback>>> =
    LazyLock::new(|| RwLock::new(CallbackRegistry::new()));

static MAP_END_REGISTRY: LazyLock<RwLock<CallbackRegistry<MapEndCallback>>> =
    LazyLock::new(|| RwLock::new(CallbackRegistry::new()));

// === OnTick ===

/// Register a callback to be called every server tick
///
/// # Returns
/// A key that can be used to unregister the callback via `remove_listener`.
pub fn on_tick<F>(callback: F) -> ListenerKey
where
    F: Fn() + Send + Sync + 'static,
{
    let key = register_key(ListenerType::Tick);
    TICK_REGISTRY.write().insert(key, Arc::new(callback));
    key
}

pub(super) fn remove_tick(key: ListenerKey) -> bool {
    TICK_REGISTRY.write().remove(key)
}

/// Fire all tick callbacks (called from GameFrame)
pub fn fire_tick() {
    let callbacks = TICK_REGISTRY.read().snapshot();
    for callback in callbacks {
        callback();
    }
}

// === OnMapStart ===

/// Register a callback to be called when a map starts
///
/// The callback receives the map name (e.g., "de_dust2").
pub fn on_map_start<F>(callback: F) -> ListenerKey
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let key = register_key(ListenerType::MapStart);
    MAP_START_REGISTRY.write().insert(key, Arc::new(callback));
    key
}

pub(super) fn remove_map_start(key: ListenerKey) -> bool {
    MAP_START_REGISTRY.write().remove(key)
}

/// Fire all map start callbacks
pub fn fire_map_start(map_name: &str) {
    tracing::info!("Firing OnMapStart: {}", map_name);
    let callbacks = MAP_START_REGISTRY.read().snapshot();
    for callback in callbacks {
        callback(map_name);
    }
}

// === OnMapEnd ===

/// Register a callback to be called when a map ends
pub fn on_map_end<F>(callback: F) -> ListenerKey
where
    F: Fn() + Send + Sync + 'static,
{
    let key = register_key(ListenerType::MapEnd);
    MAP_END_REGISTRY.write().insert(key, Arc::new(callback));
    key
}

pub(super) fn remove_map_end(key: ListenerKey) -> bool {
    MAP_END_REGISTRY.write().remove(key)
}

/// Fire all map end callbacks
///
/// Timers flagged `STOP_ON_MAPCHANGE` are removed before the callbacks run.
pub fn fire_map_end() {
    tracing::info!("Firing OnMapEnd");

    crate::timers::remove_mapchange_timers();

    let callbacks = MAP_END_REGISTRY.read().snapshot();
    for callback in callbacks {
        callback();
    }
}
