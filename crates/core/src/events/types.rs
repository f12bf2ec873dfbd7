//! Event system types

use super::EventSource;

/// Result from an event handler determining how to proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum HookResult {
    /// Continue processing, call other listeners and fire the event normally
    #[default]
    Continue = 0,

    /// Result changed (reserved for future use)
    Changed = 1,

    /// Block original event from firing, but continue calling other hooks
    Handled = 3,

    /// Block original event AND stop processing other hooks
    Stop = 4,
}

impl HookResult {
    /// Whether the original event or command should be suppressed
    pub fn blocks(self) -> bool {
        self >= Self::Handled
    }
}

/// Information passed to event handlers that can be modified
#[derive(Debug, Clone)]
pub struct EventInfo {
    /// If true, event will not be broadcast to clients
    pub dont_broadcast: bool,
}

impl EventInfo {
    /// Create new EventInfo with the given broadcast setting
    pub fn new(dont_broadcast: bool) -> Self {
        Self { dont_broadcast }
    }
}

/// Type alias for event callback functions
///
/// # Arguments
/// * `event` - The game event data
/// * `info` - Mutable event info (can modify dont_broadcast)
///
/// # Returns
/// `HookResult` indicating how to proceed
pub type EventCallback = dyn Fn(&dyn EventSource, &mut EventInfo) -> HookResult + Send + Sync;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_result_ordering() {
        assert!(HookResult::Continue < HookResult::Changed);
        assert!(HookResult::Handled < HookResult::Stop);
        assert!(!HookResult::Continue.blocks());
        assert!(!HookResult::Changed.blocks());
        assert!(HookResult::Handled.blocks());
        assert!(HookResult::Stop.blocks());
        assert_eq!(HookResult::default(), HookResult::Continue);
    }
}
