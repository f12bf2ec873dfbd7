//! Typed game event structures
//!
//! Provides strongly-typed wrappers around the game events the plugins handle.

use super::raw::EventSource;

/// Trait for typed game events
pub trait GameEvent: Sized {
    /// The event name (e.g., "round_start")
    const NAME: &'static str;

    /// Create from a raw event
    fn from_raw(event: &dyn EventSource) -> Self;
}

/// Round start event
#[derive(Debug, Clone)]
pub struct EventRoundStart {
    /// Time limit for the round
    pub timelimit: i32,
    /// Frag limit for the round
    pub fraglimit: i32,
    /// Round objective
    pub objective: String,
}

impl GameEvent for EventRoundStart {
    const NAME: &'static str = "round_start";

    fn from_raw(event: &dyn EventSource) -> Self {
        Self {
            timelimit: event.get_int("timelimit", 0),
            fraglimit: event.get_int("fraglimit", 0),
            objective: event.get_string("objective", ""),
        }
    }
}

/// Item pickup event
///
/// Fired after the item is already in the player's inventory.
#[derive(Debug, Clone)]
pub struct EventItemPickup {
    /// User ID of the player who picked the item up
    pub userid: i32,
    /// Item name, usually without the `weapon_` prefix (e.g. "ak47")
    pub item: String,
    /// Whether the pickup was silent
    pub silent: bool,
    /// Item definition index
    pub defindex: i32,
}

impl GameEvent for EventItemPickup {
    const NAME: &'static str = "item_pickup";

    fn from_raw(event: &dyn EventSource) -> Self {
        Self {
            userid: event.get_int("userid", -1),
            item: event.get_string("item", ""),
            silent: event.get_bool("silent", false),
            defindex: event.get_int("defindex", 0),
        }
    }
}

/// Game end event (match over)
#[derive(Debug, Clone)]
pub struct EventGameEnd {
    /// Winning team
    pub winner: i32,
}

impl GameEvent for EventGameEnd {
    const NAME: &'static str = "game_end";

    fn from_raw(event: &dyn EventSource) -> Self {
        Self {
            winner: event.get_int("winner", 0),
        }
    }
}

/// Helper function to register a typed event handler
pub fn register_typed_event<E, F>(post: bool, callback: F) -> super::EventHandlerKey
where
    E: GameEvent,
    F: Fn(E, &mut super::EventInfo) -> super::HookResult + Send + Sync + 'static,
{
    super::register_event(E::NAME, post, move |event, info| {
        let typed = E::from_raw(event);
        callback(typed, info)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventValue, GameEventData};

    #[test]
    fn test_item_pickup_from_raw() {
        let raw = GameEventData::new("item_pickup")
            .with("userid", EventValue::Int(4))
            .with("item", EventValue::String("awp".to_string()))
            .with("silent", EventValue::Bool(true))
            .with("defindex", EventValue::Int(9));

        let event = EventItemPickup::from_raw(&raw);
        assert_eq!(event.userid, 4);
        assert_eq!(event.item, "awp");
        assert!(event.silent);
        assert_eq!(event.defindex, 9);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let raw = GameEventData::new("item_pickup");
        let event = EventItemPickup::from_raw(&raw);
        assert_eq!(event.userid, -1);
        assert!(event.item.is_empty());

        let end = EventGameEnd::from_raw(&GameEventData::new("game_end"));
        assert_eq!(end.winner, 0);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventRoundStart::NAME, "round_start");
        assert_eq!(EventItemPickup::NAME, "item_pickup");
        assert_eq!(EventGameEnd::NAME, "game_end");
    }
}
