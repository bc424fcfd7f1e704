//! Change notifications for grid components.
//!
//! A table announces what happened (the page moved, a draw finished, a column
//! was dropped somewhere else) by emitting a [`Signal`]. Hosts attach handlers
//! to the signals they care about. Handlers run synchronously on the emitting
//! thread, oldest connection first.
//!
//! [`Signal::connect`] hands back a [`ConnectionId`] for later removal;
//! [`Signal::connect_scoped`] ties the handler to a [`ConnectionGuard`]
//! instead.
//!
//! Handlers are called with the connection table unlocked, so a handler may
//! attach or detach handlers on its own signal. Those edits apply from the
//! following emission.
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let page_changed = Signal::<usize>::new();
//! let handler = page_changed.connect(|page| println!("page {page}"));
//!
//! page_changed.emit(2);
//! assert!(page_changed.disconnect(handler));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::SignalError;
use crate::logging::targets;

new_key_type! {
    /// Handle for one attached handler.
    pub struct ConnectionId;
}

type Handler<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Broadcasts `Args` to every attached handler.
///
/// Use `()` for bare notifications and a tuple when several values travel
/// together.
pub struct Signal<Args> {
    handlers: Mutex<SlotMap<ConnectionId, Handler<Args>>>,
    muted: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.lock().len())
            .field("muted", &self.muted.load(Ordering::SeqCst))
            .finish()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(SlotMap::with_key()),
            muted: AtomicBool::new(false),
        }
    }

    /// Attaches `handler`; it runs on every later emission.
    pub fn connect<F>(&self, handler: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.handlers.lock().insert(Arc::new(handler))
    }

    /// Detaches a handler. `false` when `id` was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.handlers.lock().remove(id).is_some()
    }

    /// Like [`disconnect`](Self::disconnect), with a stale id as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<(), SignalError> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection)
        }
    }

    pub fn disconnect_all(&self) {
        self.handlers.lock().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Mutes or unmutes the signal. Emissions while muted are dropped, not
    /// queued; tables mute their signals while state is being restored.
    pub fn set_blocked(&self, blocked: bool) {
        self.muted.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Calls every handler with `args`, oldest first.
    #[tracing::instrument(skip_all, target = "horizon_grid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "muted, emission dropped");
            return;
        }

        let handlers: Vec<Handler<Args>> = self.handlers.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, handlers = handlers.len(), "emit");

        for handler in handlers {
            handler(&args);
        }
    }

    /// Attaches `handler` for as long as the returned guard lives.
    pub fn connect_scoped<F>(self: &Arc<Self>, handler: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(handler);
        ConnectionGuard {
            signal: Arc::downgrade(self),
            id,
        }
    }
}

/// Detaches its handler when dropped.
///
/// The guard holds the signal weakly, so it never keeps a dropped table's
/// signals alive.
///
/// ```
/// use std::sync::Arc;
/// use horizon_grid_core::Signal;
///
/// let draws = Arc::new(Signal::<()>::new());
/// let guard = draws.connect_scoped(|_| {});
/// assert_eq!(draws.connection_count(), 1);
/// drop(guard);
/// assert_eq!(draws.connection_count(), 0);
/// ```
pub struct ConnectionGuard<Args: 'static> {
    signal: Weak<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<Args> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        signal.connect(move |value: &T| sink.lock().push(value.clone()));
        seen
    }

    #[test]
    fn handlers_run_in_connection_order() {
        let column_moved = Signal::<(usize, usize)>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = order.clone();
            column_moved.connect(move |&(from, to)| sink.lock().push((tag, from, to)));
        }

        column_moved.emit((2, 0));
        assert_eq!(*order.lock(), vec![("first", 2, 0), ("second", 2, 0)]);
    }

    #[test]
    fn stale_ids_are_reported() {
        let page_changed = Signal::<usize>::new();
        let seen = recorder(&page_changed);
        let extra = page_changed.connect(|_| {});

        assert!(page_changed.disconnect(extra));
        assert!(!page_changed.disconnect(extra));
        assert_eq!(page_changed.try_disconnect(extra), Err(SignalError::InvalidConnection));

        page_changed.emit(3);
        assert_eq!(*seen.lock(), vec![3]);
    }

    #[test]
    fn muted_emissions_are_lost() {
        let page_changed = Signal::<usize>::new();
        let seen = recorder(&page_changed);

        page_changed.set_blocked(true);
        assert!(page_changed.is_blocked());
        page_changed.emit(1);
        page_changed.set_blocked(false);
        page_changed.emit(4);

        assert_eq!(*seen.lock(), vec![4]);
    }

    #[test]
    fn guard_outliving_signal_is_harmless() {
        let signal = Arc::new(Signal::<()>::new());
        let guard = signal.connect_scoped(|_| {});
        let id = guard.id();
        drop(signal);
        drop(guard);
        let _ = id;
    }

    #[test]
    fn handler_may_attach_during_emit() {
        let draw_complete = Arc::new(Signal::<()>::new());
        let inner = draw_complete.clone();
        draw_complete.connect(move |_| {
            inner.connect(|_| {});
        });

        draw_complete.emit(());
        assert_eq!(draw_complete.connection_count(), 2);
        draw_complete.disconnect_all();
        assert_eq!(draw_complete.connection_count(), 0);
    }
}
