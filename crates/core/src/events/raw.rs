//! Raw game event access
//!
//! The host's `IGameEvent` is read through the [`EventSource`] trait so that
//! typed events can be built from either the native event (FFI layer) or an
//! owned [`GameEventData`] (tests, synthesized events).

use std::collections::HashMap;

/// Read access to a game event's name and key/value payload
pub trait EventSource {
    /// The event name (e.g. `round_start`)
    fn name(&self) -> &str;

    /// Get a boolean value from the event
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Get an integer value from the event
    fn get_int(&self, key: &str, default: i32) -> i32;

    /// Get a 64-bit unsigned integer value from the event
    fn get_uint64(&self, key: &str, default: u64) -> u64;

    /// Get a float value from the event
    fn get_float(&self, key: &str, default: f32) -> f32;

    /// Get a string value from the event
    fn get_string(&self, key: &str, default: &str) -> String;
}

/// A single event field value
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Bool(bool),
    Int(i32),
    UInt64(u64),
    Float(f32),
    String(String),
}

/// Owned game event
///
/// Getters coerce between numeric kinds the way the engine's keyvalues do,
/// and fall back to the default when the key is missing.
#[derive(Debug, Clone, Default)]
pub struct GameEventData {
    name: String,
    fields: HashMap<String, EventValue>,
}

impl GameEventData {
    /// Create an empty event with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, key: &str, value: EventValue) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field value
    pub fn set(&mut self, key: &str, value: EventValue) {
        self.fields.insert(key.to_string(), value);
    }

    /// Get the raw field value
    pub fn get(&self, key: &str) -> Option<&EventValue> {
        self.fields.get(key)
    }
}

impl EventSource for GameEventData {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.fields.get(key) {
            Some(EventValue::Bool(b)) => *b,
            Some(EventValue::Int(i)) => *i != 0,
            Some(EventValue::UInt64(u)) => *u != 0,
            Some(EventValue::Float(f)) => *f != 0.0,
            Some(EventValue::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.fields.get(key) {
            Some(EventValue::Bool(b)) => *b as i32,
            Some(EventValue::Int(i)) => *i,
            Some(EventValue::UInt64(u)) => *u as i32,
            Some(EventValue::Float(f)) => *f as i32,
            Some(EventValue::String(s)) => s.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn get_uint64(&self, key: &str, default: u64) -> u64 {
        match self.fields.get(key) {
            Some(EventValue::Bool(b)) => *b as u64,
            Some(EventValue::Int(i)) => *i as u64,
            Some(EventValue::UInt64(u)) => *u,
            Some(EventValue::Float(f)) => *f as u64,
            Some(EventValue::String(s)) => s.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.fields.get(key) {
            Some(EventValue::Bool(b)) => *b as i32 as f32,
            Some(EventValue::Int(i)) => *i as f32,
            Some(EventValue::UInt64(u)) => *u as f32,
            Some(EventValue::Float(f)) => *f,
            Some(EventValue::String(s)) => s.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.fields.get(key) {
            Some(EventValue::String(s)) => s.clone(),
            Some(EventValue::Bool(b)) => (*b as i32).to_string(),
            Some(EventValue::Int(i)) => i.to_string(),
            Some(EventValue::UInt64(u)) => u.to_string(),
            Some(EventValue::Float(f)) => f.to_string(),
            None => default.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let event = GameEventData::new("round_start");
        assert_eq!(event.name(), "round_start");
        assert_eq!(event.get_int("timelimit", 7), 7);
        assert!(event.get_bool("silent", true));
        assert_eq!(event.get_string("objective", "none"), "none");
        assert_eq!(event.get_uint64("id", 9), 9);
        assert_eq!(event.get_float("x", 0.5), 0.5);
    }

    #[test]
    fn test_numeric_coercion() {
        let event = GameEventData::new("item_pickup")
            .with("userid", EventValue::Int(3))
            .with("silent", EventValue::Int(1))
            .with("defindex", EventValue::String("31".to_string()))
            .with("item", EventValue::String("ak47".to_string()));

        assert_eq!(event.get_int("userid", -1), 3);
        assert!(event.get_bool("silent", false));
        assert_eq!(event.get_int("defindex", 0), 31);
        assert_eq!(event.get_string("userid", ""), "3");
        assert_eq!(event.get_int("item", -1), -1);
    }
}
