//! Game Event System
//!
//! Subscribe to and handle Source 2 game events (round_start, item_pickup, etc.)
//!
//! # Architecture
//!
//! ```text
//! IGameEventManager2::FireEvent → C++ bridge → rust_on_fire_event → Event dispatcher → Rust callbacks
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cs2modes_core::events::{register_event, HookResult};
//!
//! register_event("item_pickup", true, |event, _info| {
//!     tracing::info!("picked up {}", event.get_string("item", ""));
//!     HookResult::Continue
//! });
//!
//! // Or use typed events for better ergonomics:
//! use cs2modes_core::events::typed::{register_typed_event, EventRoundStart};
//!
//! register_typed_event::<EventRoundStart, _>(true, |event, _info| {
//!     tracing::info!("Round started: {}", event.objective);
//!     HookResult::Continue
//! });
//! ```

mod manager;
mod raw;
pub mod typed;
mod types;

pub use manager::{
    fire_event_post, fire_event_pre, register_event, remove_event_handler, unregister_event,
    EventHandlerKey, EventManager, PreFireOutcome, EVENTS,
};
pub use raw::{EventSource, EventValue, GameEventData};
pub use types::{EventCallback, EventInfo, HookResult};

pub use typed::{
    register_typed_event, EventGameEnd, EventItemPickup, EventRoundStart, GameEvent,
};
