//! Event manager - registration and dispatch
//!
//! The FFI layer calls [`fire_event_pre`] from the host's `FireEvent` detour
//! and [`fire_event_post`] after the original has run.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use super::raw::EventSource;
use super::types::{EventCallback, EventInfo, HookResult};

new_key_type! {
    /// Handle for a registered event handler
    pub struct EventHandlerKey;
}

/// Storage for a single registered handler
struct EventHandler {
    name: String,
    post: bool,
    callback: Arc<EventCallback>,
}

/// Global event manager
pub static EVENTS: LazyLock<RwLock<EventManager>> =
    LazyLock::new(|| RwLock::new(EventManager::new()));

/// Event manager for registering and dispatching event handlers
pub struct EventManager {
    handlers: SlotMap<EventHandlerKey, EventHandler>,

    /// Event name to handler keys, in registration order
    by_name: HashMap<String, Vec<EventHandlerKey>>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            handlers: SlotMap::with_key(),
            by_name: HashMap::new(),
        }
    }

    /// Add a handler for `name`
    pub fn register(&mut self, name: &str, post: bool, callback: Arc<EventCallback>) -> EventHandlerKey {
        let key = self.handlers.insert(EventHandler {
            name: name.to_string(),
            post,
            callback,
        });
        let keys = self.by_name.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!("Registering new event hook: {}", name);
            Vec::new()
        });
        keys.push(key);

        tracing::trace!(
            "Added {} handler for event '{}' (total: {})",
            if post { "post" } else { "pre" },
            name,
            keys.len()
        );
        key
    }

    /// Remove a single handler
    pub fn remove(&mut self, key: EventHandlerKey) -> bool {
        let Some(handler) = self.handlers.remove(key) else {
            return false;
        };
        if let Some(keys) = self.by_name.get_mut(&handler.name) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.by_name.remove(&handler.name);
            }
        }
        true
    }

    /// Remove every handler for `name`
    pub fn remove_all(&mut self, name: &str) -> bool {
        let Some(keys) = self.by_name.remove(name) else {
            return false;
        };
        for key in keys {
            self.handlers.remove(key);
        }
        true
    }

    /// Whether any handler is registered for `name`
    pub fn has_handlers(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Snapshot of the callbacks for one phase, in registration order
    pub fn callbacks(&self, name: &str, post: bool) -> Vec<Arc<EventCallback>> {
        self.by_name
            .get(name)
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| self.handlers.get(*k))
                    .filter(|h| h.post == post)
                    .map(|h| Arc::clone(&h.callback))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Outcome of the pre-fire phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreFireOutcome {
    /// Whether the host should fire the original event
    pub should_fire: bool,
    /// Possibly modified broadcast flag
    pub dont_broadcast: bool,
}

/// Run pre-hooks for an event
///
/// Handlers run in registration order. The first result of `Handled` or
/// above blocks the event and stops the chain. The registry lock is not held
/// while callbacks run, so handlers may register or remove handlers.
pub fn fire_event_pre(event: &dyn EventSource, dont_broadcast: bool) -> PreFireOutcome {
    let callbacks = EVENTS.read().callbacks(event.name(), false);
    let mut local_dont_broadcast = dont_broadcast;

    for callback in callbacks {
        let mut info = EventInfo::new(local_dont_broadcast);
        let result = callback(event, &mut info);
        local_dont_broadcast = info.dont_broadcast;

        if result.blocks() {
            tracing::debug!("Event '{}' blocked by pre-hook ({:?})", event.name(), result);
            return PreFireOutcome {
                should_fire: false,
                dont_broadcast: local_dont_broadcast,
            };
        }
    }

    PreFireOutcome {
        should_fire: true,
        dont_broadcast: local_dont_broadcast,
    }
}

/// Run post-hooks for an event
pub fn fire_event_post(event: &dyn EventSource, dont_broadcast: bool) {
    let callbacks = EVENTS.read().callbacks(event.name(), true);
    let mut info = EventInfo::new(dont_broadcast);
    for callback in callbacks {
        callback(event, &mut info);
    }
}

/// Register an event handler
///
/// # Arguments
/// * `name` - Event name (e.g., "item_pickup", "round_start")
/// * `post` - If true, handler runs after event fires; otherwise before
/// * `callback` - Function to call when event fires
pub fn register_event<F>(name: &str, post: bool, callback: F) -> EventHandlerKey
where
    F: Fn(&dyn EventSource, &mut EventInfo) -> HookResult + Send + Sync + 'static,
{
    EVENTS.write().register(name, post, Arc::new(callback))
}

/// Unregister all handlers for an event
///
/// # Returns
/// true if the event was found and removed
pub fn unregister_event(name: &str) -> bool {
    let removed = EVENTS.write().remove_all(name);
    if removed {
        tracing::debug!("Unregistered all handlers for event: {}", name);
    }
    removed
}

/// Unregister a single handler
pub fn remove_event_handler(key: EventHandlerKey) -> bool {
    EVENTS.write().remove(key)
}
