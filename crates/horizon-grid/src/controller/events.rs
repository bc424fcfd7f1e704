//! Observer signals of a table.

use horizon_grid_core::Signal;

use crate::model::{DrawReport, RowId};

/// Signals emitted by a [`TableController`](super::TableController).
///
/// Signals are blocked while the table initializes, so observers only see
/// the fully restored table.
#[derive(Debug, Default)]
pub struct TableEvents {
    /// The displayed page changed.
    pub page_changed: Signal<usize>,
    /// A draw finished.
    pub draw_complete: Signal<DrawReport>,
    /// Column or global searches changed and were applied.
    pub search_applied: Signal<()>,
    /// A column was shown (`true`) or hidden (`false`).
    pub column_visibility_changed: Signal<(usize, bool)>,
    /// The display order changed; carries the new order.
    pub column_reordered: Signal<Vec<usize>>,
    /// View state was written; carries the store key.
    pub state_saved: Signal<String>,
    /// The responsive layout collapsed a different set of columns; carries
    /// them in display order.
    pub layout_changed: Signal<Vec<usize>>,
    /// A tree branch was expanded (`true`) or collapsed (`false`).
    pub branch_toggled: Signal<(RowId, bool)>,
}

impl TableEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_blocked(&self, blocked: bool) {
        self.page_changed.set_blocked(blocked);
        self.draw_complete.set_blocked(blocked);
        self.search_applied.set_blocked(blocked);
        self.column_visibility_changed.set_blocked(blocked);
        self.column_reordered.set_blocked(blocked);
        self.state_saved.set_blocked(blocked);
        self.layout_changed.set_blocked(blocked);
        self.branch_toggled.set_blocked(blocked);
    }

    pub(crate) fn disconnect_all(&self) {
        self.page_changed.disconnect_all();
        self.draw_complete.disconnect_all();
        self.search_applied.disconnect_all();
        self.column_visibility_changed.disconnect_all();
        self.column_reordered.disconnect_all();
        self.state_saved.disconnect_all();
        self.layout_changed.disconnect_all();
        self.branch_toggled.disconnect_all();
    }
}
