//! Timer system for scheduling delayed and repeating callbacks
//!
//! Timers are processed every GameFrame tick and can be configured to:
//! - Fire once after a delay
//! - Repeat at a fixed interval
//! - Be automatically cleaned up on map change
//!
//! Callbacks run after the registry lock is released, so a callback may kill
//! its own timer (or any other) and schedule new ones.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use cs2modes_core::timers::{add_timer, add_repeating_timer, remove_timer, TimerFlags};
//!
//! // One-shot timer
//! let key = add_timer(Duration::from_secs(5), || {
//!     tracing::info!("5 seconds passed!");
//! });
//!
//! // Repeating timer
//! let key = add_repeating_timer(Duration::from_millis(100), || {
//!     tracing::info!("Tick!");
//! });
//!
//! // Cancel a timer
//! remove_timer(key);
//! ```

mod timer;

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use slotmap::SlotMap;

use timer::{Timer, TimerCallback};
pub use timer::{TimerFlags, TimerKey};

/// Timer registry
pub struct TimerRegistry {
    timers: SlotMap<TimerKey, Timer>,
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
        }
    }

    /// Schedule a timer relative to `now`
    pub fn insert<F>(&mut self, interval: Duration, flags: TimerFlags, now: Instant, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.timers.insert(Timer::new(interval, flags, now, callback))
    }

    /// Cancel a timer
    pub fn remove(&mut self, key: TimerKey) -> bool {
        self.timers.remove(key).is_some()
    }

    pub fn contains(&self, key: TimerKey) -> bool {
        self.timers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// When the timer will next fire
    pub fn next_fire(&self, key: TimerKey) -> Option<Instant> {
        self.timers.get(key).map(|t| t.next_fire)
    }

    /// Remove all timers with the STOP_ON_MAPCHANGE flag, returning how many were removed
    pub fn remove_mapchange(&mut self) -> usize {
        let before = self.timers.len();
        self.timers
            .retain(|_, timer| !timer.flags.contains(TimerFlags::STOP_ON_MAPCHANGE));
        before - self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Timers due at `now`, in key order
    fn due(&self, now: Instant) -> Vec<(TimerKey, TimerCallback)> {
        self.timers
            .iter()
            .filter(|(_, timer)| now >= timer.next_fire)
            .map(|(key, timer)| (key, Arc::clone(&timer.callback)))
            .collect()
    }

    /// Reschedule a repeating timer or drop a one-shot after it fired
    ///
    /// A timer that was killed during its own callback is already gone.
    fn finish(&mut self, key: TimerKey, now: Instant) {
        let repeating = match self.timers.get_mut(key) {
            Some(timer) if timer.is_repeating() => {
                timer.next_fire = now + timer.interval;
                true
            }
            Some(_) => false,
            None => return,
        };
        if !repeating {
            self.timers.remove(key);
        }
    }
}

/// Fire every timer in `registry` that is due at `now`
///
/// One-shot timers are removed after firing, while repeating timers are
/// rescheduled. Returns the number of callbacks run.
pub fn process_registry(registry: &RwLock<TimerRegistry>, now: Instant) -> usize {
    let due = registry.read().due(now);
    let mut fired = 0;

    for (key, callback) in due {
        // Killed by a callback that ran earlier in this pass
        if !registry.read().contains(key) {
            continue;
        }
        {
            let mut callback = callback.lock();
            (*callback)();
        }
        fired += 1;
        registry.write().finish(key, now);
    }

    fired
}

static REGISTRY: LazyLock<RwLock<TimerRegistry>> =
    LazyLock::new(|| RwLock::new(TimerRegistry::new()));

/// Add a one-shot timer that fires after the specified delay
///
/// # Arguments
/// * `delay` - How long to wait before firing
/// * `callback` - Function to call when the timer fires
///
/// # Returns
/// A key that can be used to cancel the timer via `remove_timer`
pub fn add_timer<F>(delay: Duration, callback: F) -> TimerKey
where
    F: FnMut() + Send + 'static,
{
    add_timer_with_flags(delay, TimerFlags::empty(), callback)
}

/// Add a repeating timer that fires at the specified interval
///
/// The timer will continue firing until cancelled via `remove_timer`.
pub fn add_repeating_timer<F>(interval: Duration, callback: F) -> TimerKey
where
    F: FnMut() + Send + 'static,
{
    add_timer_with_flags(interval, TimerFlags::REPEAT, callback)
}

/// Add a timer with custom flags
///
/// # Arguments
/// * `interval` - Delay (one-shot) or interval between executions (repeating)
/// * `flags` - Combination of `TimerFlags` to control behavior
/// * `callback` - Function to call when the timer fires
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use cs2modes_core::timers::{add_timer_with_flags, TimerFlags};
///
/// // One-shot timer that is dropped if the map changes first
/// let key = add_timer_with_flags(
///     Duration::from_secs(10),
///     TimerFlags::STOP_ON_MAPCHANGE,
///     || { /* ... */ }
/// );
/// ```
pub fn add_timer_with_flags<F>(interval: Duration, flags: TimerFlags, callback: F) -> TimerKey
where
    F: FnMut() + Send + 'static,
{
    REGISTRY
        .write()
        .insert(interval, flags, Instant::now(), callback)
}

/// Remove/cancel a timer
///
/// # Returns
/// `true` if the timer was found and removed, `false` if not found
pub fn remove_timer(key: TimerKey) -> bool {
    REGISTRY.write().remove(key)
}

/// Check if a timer is still scheduled
pub fn is_timer_active(key: TimerKey) -> bool {
    REGISTRY.read().contains(key)
}

/// Process all timers (called from GameFrame)
pub fn process() {
    process_at(Instant::now());
}

/// Process all timers as if the current time were `now`
pub fn process_at(now: Instant) -> usize {
    process_registry(&REGISTRY, now)
}

/// Remove all timers with the STOP_ON_MAPCHANGE flag
///
/// Called from the map end listener to clean up map-specific timers.
pub fn remove_mapchange_timers() {
    let removed = REGISTRY.write().remove_mapchange();
    if removed > 0 {
        tracing::debug!("Removed {} timers on map change", removed);
    }
}

/// Remove every timer (plugin unload)
pub fn clear_timers() {
    REGISTRY.write().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_one_shot_fires_once() {
        let registry = RwLock::new(TimerRegistry::new());
        let start = Instant::now();
        let (count, cb) = counter();
        let key = registry
            .write()
            .insert(Duration::from_secs(10), TimerFlags::empty(), start, cb);

        assert_eq!(process_registry(&registry, start + Duration::from_secs(9)), 0);
        assert_eq!(process_registry(&registry, start + Duration::from_secs(10)), 1);
        assert_eq!(process_registry(&registry, start + Duration::from_secs(30)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!registry.read().contains(key));
    }

    #[test]
    fn test_repeating_reschedules() {
        let registry = RwLock::new(TimerRegistry::new());
        let start = Instant::now();
        let (count, cb) = counter();
        let key = registry
            .write()
            .insert(Duration::from_secs(5), TimerFlags::REPEAT, start, cb);

        let t1 = start + Duration::from_secs(5);
        process_registry(&registry, t1);
        assert_eq!(registry.read().next_fire(key), Some(t1 + Duration::from_secs(5)));

        process_registry(&registry, t1 + Duration::from_secs(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        process_registry(&registry, t1 + Duration::from_secs(5));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(registry.read().contains(key));
    }

    #[test]
    fn test_mapchange_removal() {
        let mut registry = TimerRegistry::new();
        let now = Instant::now();
        let keep = registry.insert(Duration::from_secs(1), TimerFlags::REPEAT, now, || {});
        let drop = registry.insert(
            Duration::from_secs(1),
            TimerFlags::STOP_ON_MAPCHANGE,
            now,
            || {},
        );

        assert_eq!(registry.remove_mapchange(), 1);
        assert!(registry.contains(keep));
        assert!(!registry.contains(drop));
    }

    #[test]
    fn test_global_timer_kills_itself() {
        let slot: Arc<parking_lot::Mutex<Option<TimerKey>>> = Arc::new(parking_lot::Mutex::new(None));
        let fired = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&slot);
        let f = Arc::clone(&fired);
        let key = add_repeating_timer(Duration::from_secs(3600), move || {
            f.fetch_add(1, Ordering::SeqCst);
            if let Some(key) = s.lock().take() {
                remove_timer(key);
            }
        });
        *slot.lock() = Some(key);

        process_at(Instant::now() + Duration::from_secs(3600));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!is_timer_active(key));

        // Nothing left to fire for this timer
        process_at(Instant::now() + Duration::from_secs(7200));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_can_schedule_another_timer() {
        let registry = Arc::new(RwLock::new(TimerRegistry::new()));
        let start = Instant::now();

        let r = Arc::clone(&registry);
        registry.write().insert(Duration::from_secs(1), TimerFlags::empty(), start, move || {
            r.write()
                .insert(Duration::from_secs(1), TimerFlags::empty(), start, || {});
        });

        process_registry(&registry, start + Duration::from_secs(1));
        assert_eq!(registry.read().len(), 1);
    }
}
