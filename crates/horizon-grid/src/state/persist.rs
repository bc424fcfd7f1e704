//! Debounced view-state persistence.

use std::sync::Arc;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Debouncer, SharedClock};

use super::{StateStore, ViewState};
use crate::selectors::STATE_WRITE_TIMEOUT;

/// Loads a table's view state once and writes it back after changes settle.
///
/// Saves are coalesced: a burst of changes within [`STATE_WRITE_TIMEOUT`]
/// produces one write of the last state.
pub struct StatePersister {
    store: Option<Arc<dyn StateStore>>,
    key: String,
    pending: Debouncer<ViewState>,
    writes: u64,
}

impl std::fmt::Debug for StatePersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePersister")
            .field("key", &self.key)
            .field("enabled", &self.store.is_some())
            .field("pending", &self.pending.is_pending())
            .field("writes", &self.writes)
            .finish()
    }
}

impl StatePersister {
    pub fn new(store: Arc<dyn StateStore>, key: impl Into<String>, clock: SharedClock) -> Self {
        Self {
            store: Some(store),
            key: key.into(),
            pending: Debouncer::new(STATE_WRITE_TIMEOUT, clock),
            writes: 0,
        }
    }

    /// A persister that never loads nor writes.
    pub fn disabled(key: impl Into<String>, clock: SharedClock) -> Self {
        Self {
            store: None,
            key: key.into(),
            pending: Debouncer::new(STATE_WRITE_TIMEOUT, clock),
            writes: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// The stored state, `None` when nothing usable is stored.
    ///
    /// Read and parse failures are logged and treated as no state.
    pub fn load(&self) -> Option<ViewState> {
        let store = self.store.as_ref()?;
        let json = match store.load(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(target: targets::STATE, key = %self.key, error = %err, "view state could not be read");
                return None;
            }
        };
        match ViewState::from_json(&self.key, &json) {
            Ok(state) => {
                tracing::debug!(target: targets::STATE, key = %self.key, "view state loaded");
                Some(state)
            }
            Err(err) => {
                tracing::warn!(target: targets::STATE, error = %err, "discarding malformed view state");
                None
            }
        }
    }

    /// Schedule a write of `state`, replacing any pending one.
    pub fn schedule(&mut self, state: ViewState) {
        if self.store.is_some() {
            self.pending.schedule(state);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Write the pending state if its delay has elapsed. Returns whether a
    /// write happened.
    pub fn poll(&mut self) -> bool {
        match self.pending.poll() {
            Some(state) => self.write(&state),
            None => false,
        }
    }

    /// Write the pending state now.
    pub fn flush(&mut self) -> bool {
        match self.pending.flush() {
            Some(state) => self.write(&state),
            None => false,
        }
    }

    /// Drop the pending state unwritten.
    pub fn cancel(&mut self) -> bool {
        self.pending.cancel()
    }

    /// Completed writes.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    fn write(&mut self, state: &ViewState) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let result = state.to_json().and_then(|json| store.save(&self.key, &json));
        match result {
            Ok(()) => {
                self.writes += 1;
                tracing::debug!(target: targets::STATE, key = %self.key, "view state saved");
                true
            }
            Err(err) => {
                tracing::warn!(target: targets::STATE, key = %self.key, error = %err, "view state could not be saved");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use horizon_grid_core::ManualClock;

    use super::*;
    use crate::state::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, StatePersister) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let persister = StatePersister::new(store.clone(), "DataTables_/t", clock.clone());
        (store, clock, persister)
    }

    #[test]
    fn test_burst_coalesces_to_last_write() {
        let (store, clock, mut persister) = setup();
        for page in 0..5 {
            persister.schedule(ViewState {
                page,
                ..Default::default()
            });
            clock.advance(Duration::from_millis(100));
        }
        assert!(!persister.poll());
        clock.advance(STATE_WRITE_TIMEOUT);
        assert!(persister.poll());
        assert_eq!(store.write_count(), 1);
        assert_eq!(persister.load().unwrap().page, 4);
    }

    #[test]
    fn test_flush_writes_immediately() {
        let (store, _clock, mut persister) = setup();
        persister.schedule(ViewState::default());
        assert!(persister.flush());
        assert!(!persister.is_pending());
        assert_eq!(store.write_count(), 1);
        assert!(!persister.flush());
    }

    #[test]
    fn test_malformed_state_loads_as_none() {
        let store = Arc::new(MemoryStore::new().with_entry("k", "not json"));
        let persister = StatePersister::new(store, "k", Arc::new(ManualClock::new()));
        assert!(persister.load().is_none());
    }

    #[test]
    fn test_disabled_never_writes() {
        let clock = Arc::new(ManualClock::new());
        let mut persister = StatePersister::disabled("k", clock.clone());
        persister.schedule(ViewState::default());
        clock.advance(Duration::from_secs(1));
        assert!(!persister.poll());
        assert!(persister.load().is_none());
        assert_eq!(persister.write_count(), 0);
    }
}
