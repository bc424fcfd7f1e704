//! Timer system for Horizon Grid.
//!
//! The grid never sleeps or spawns threads. Timers are registered against a
//! [`Clock`] and the host polls [`TimerManager::process_expired`] (directly or
//! through a [`Debouncer`]) from its event loop. Tests drive time with a
//! [`ManualClock`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};
use crate::logging::targets;

new_key_type! {
    /// Handle for a scheduled deadline.
    pub struct TimerId;
}

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// A shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    fire_time: Instant,
}

/// Queued deadline; stale entries are skipped when popped.
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest deadline on top.
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages one-shot timers.
pub struct TimerManager {
    clock: SharedClock,
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<TimerQueueEntry>,
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerManager")
            .field("active", &self.timers.len())
            .finish()
    }
}

impl TimerManager {
    /// Create a timer manager on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a timer manager on the given clock.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            clock,
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
        }
    }

    /// The clock this manager reads.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Schedules a deadline `duration` from now.
    pub fn start_one_shot(&mut self, duration: Duration) -> TimerId {
        let fire_time = self.clock.now() + duration;
        let id = self.timers.insert(TimerData { fire_time });
        self.queue.push(TimerQueueEntry { id, fire_time });
        id
    }

    /// Cancels a deadline. Unknown ids are an error.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        if self.timers.remove(id).is_some() {
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId.into())
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Time left before a pending timer fires.
    pub fn remaining(&self, id: TimerId) -> Option<Duration> {
        let timer = self.timers.get(id)?;
        Some(timer.fire_time.saturating_duration_since(self.clock.now()))
    }

    /// Time left until the earliest live deadline.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        // Drop stopped timers from the front of the queue.
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }

        let now = self.clock.now();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(now))
    }

    /// Remove and return every timer whose fire time has passed.
    #[tracing::instrument(skip(self), target = "horizon_grid_core::timer", level = "trace")]
    pub fn process_expired(&mut self) -> Vec<TimerId> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            // Stopped timers leave their queue entry behind.
            if self.timers.remove(entry.id).is_none() {
                continue;
            }

            tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
            fired.push(entry.id);
        }

        fired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Coalesces bursts of values into one delivery after a quiet period.
///
/// Every [`schedule`](Self::schedule) replaces the pending value and restarts
/// the delay, so the value delivered by [`poll`](Self::poll) is always the last
/// one scheduled.
pub struct Debouncer<T> {
    timers: TimerManager,
    delay: Duration,
    pending: Option<(TimerId, T)>,
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration, clock: SharedClock) -> Self {
        Self {
            timers: TimerManager::with_clock(clock),
            delay,
            pending: None,
        }
    }

    /// The configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the delay.
    pub fn schedule(&mut self, value: T) {
        if let Some((old, _)) = self.pending.take() {
            // The old timer may already have expired unpolled.
            let _ = self.timers.stop(old);
        }
        let id = self.timers.start_one_shot(self.delay);
        self.pending = Some((id, value));
    }

    /// Whether a value is waiting for delivery.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending value is delivered.
    pub fn remaining(&self) -> Option<Duration> {
        let (id, _) = self.pending.as_ref()?;
        self.timers.remaining(*id)
    }

    /// Deliver the pending value if its delay has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        let fired = self.timers.process_expired();
        match &self.pending {
            Some((id, _)) if fired.contains(id) => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    /// Deliver the pending value immediately, regardless of the delay.
    pub fn flush(&mut self) -> Option<T> {
        let (id, value) = self.pending.take()?;
        let _ = self.timers.stop(id);
        Some(value)
    }

    /// Drop the pending value without delivering it.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((id, _)) => {
                let _ = self.timers.stop(id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn manual() -> (ManualClock, SharedClock) {
        let clock = ManualClock::new();
        let shared: SharedClock = Arc::new(clock.clone());
        (clock, shared)
    }

    #[test]
    fn test_one_shot_fires_once() {
        let (clock, shared) = manual();
        let mut timers = TimerManager::with_clock(shared);
        let id = timers.start_one_shot(Duration::from_millis(100));

        assert!(timers.process_expired().is_empty());
        clock.advance(Duration::from_millis(100));
        assert_eq!(timers.process_expired(), vec![id]);
        assert!(timers.process_expired().is_empty());
        assert!(!timers.is_active(id));
    }

    #[test]
    fn test_timers_fire_in_order() {
        let (clock, shared) = manual();
        let mut timers = TimerManager::with_clock(shared);
        let late = timers.start_one_shot(Duration::from_millis(50));
        let early = timers.start_one_shot(Duration::from_millis(10));

        clock.advance(Duration::from_millis(60));
        assert_eq!(timers.process_expired(), vec![early, late]);
    }

    #[test]
    fn test_stop_timer() {
        let (clock, shared) = manual();
        let mut timers = TimerManager::with_clock(shared);
        let id = timers.start_one_shot(Duration::from_millis(10));

        assert!(timers.stop(id).is_ok());
        assert_eq!(
            timers.stop(id),
            Err(CoreError::Timer(TimerError::InvalidTimerId))
        );
        clock.advance(Duration::from_millis(20));
        assert!(timers.process_expired().is_empty());
    }

    #[test]
    fn test_time_until_next() {
        let (clock, shared) = manual();
        let mut timers = TimerManager::with_clock(shared);
        assert_eq!(timers.time_until_next(), None);

        let id = timers.start_one_shot(Duration::from_millis(300));
        clock.advance(Duration::from_millis(100));
        assert_eq!(timers.time_until_next(), Some(Duration::from_millis(200)));
        assert_eq!(timers.remaining(id), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_debouncer_last_write_wins() {
        let (clock, shared) = manual();
        let mut debouncer = Debouncer::new(Duration::from_millis(300), shared);

        debouncer.schedule(1);
        clock.advance(Duration::from_millis(200));
        debouncer.schedule(2);
        clock.advance(Duration::from_millis(200));
        // The first value's deadline passed, but it was superseded.
        assert_eq!(debouncer.poll(), None);

        debouncer.schedule(3);
        clock.advance(Duration::from_millis(300));
        assert_eq!(debouncer.poll(), Some(3));
        assert_eq!(debouncer.poll(), None);
    }

    #[test]
    fn test_debouncer_flush_and_cancel() {
        let (_clock, shared) = manual();
        let mut debouncer = Debouncer::new(Duration::from_millis(300), shared);

        debouncer.schedule("a");
        assert_eq!(debouncer.flush(), Some("a"));
        assert!(!debouncer.is_pending());

        debouncer.schedule("b");
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
    }
}
