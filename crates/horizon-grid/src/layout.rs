//! Responsive column layout.
//!
//! When the viewport is too narrow for every visible column, columns are
//! collapsed from the right until the rest fit. Collapsed columns move to
//! the secondary visibility menu. Resize notifications are debounced so a
//! window drag recomputes once.

use std::collections::HashSet;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Debouncer, SharedClock};

use crate::model::{GridEngine, ResponsiveClass};
use crate::selectors::LAYOUT_RECOMPUTE_TIMEOUT;

/// Viewport width and the columns it cannot fit.
#[derive(Debug)]
pub struct ResponsiveLayout {
    viewport: Option<u32>,
    collapsed: HashSet<usize>,
    pending: Debouncer<u32>,
}

impl ResponsiveLayout {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            viewport: None,
            collapsed: HashSet::new(),
            pending: Debouncer::new(LAYOUT_RECOMPUTE_TIMEOUT, clock),
        }
    }

    /// Current viewport width, `None` before the first resize.
    pub fn viewport(&self) -> Option<u32> {
        self.viewport
    }

    /// Columns collapsed by the current viewport.
    pub fn collapsed(&self) -> &HashSet<usize> {
        &self.collapsed
    }

    /// Record a new viewport width; the layout follows after the quiet period.
    pub fn notify_resized(&mut self, width: u32) {
        self.pending.schedule(width);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Apply a settled resize. Returns whether the collapsed set changed.
    pub fn poll(&mut self, engine: &GridEngine) -> bool {
        match self.pending.poll() {
            Some(width) => self.apply(width, engine),
            None => false,
        }
    }

    /// Recompute for the current viewport, e.g. after columns were shown or
    /// hidden. Returns whether the collapsed set changed.
    pub fn recompute(&mut self, engine: &GridEngine) -> bool {
        match self.viewport {
            Some(width) => self.apply(width, engine),
            None => false,
        }
    }

    fn apply(&mut self, width: u32, engine: &GridEngine) -> bool {
        self.viewport = Some(width);
        let collapsed = Self::compute(engine, width);
        if collapsed == self.collapsed {
            return false;
        }
        tracing::debug!(target: targets::CONTROLLER, width, collapsed = collapsed.len(), "responsive layout changed");
        self.collapsed = collapsed;
        true
    }

    /// Columns that do not fit into `width`.
    ///
    /// Visible responsive columns are laid out in display order; the
    /// rightmost are collapsed first and the first one always stays.
    pub fn compute(engine: &GridEngine, width: u32) -> HashSet<usize> {
        let data = engine.data();
        let mut fixed = 0u64;
        let mut responsive = Vec::new();
        for column in engine.visible_columns() {
            let Some(col) = data.column(column) else {
                continue;
            };
            match col.responsive {
                ResponsiveClass::Auto => responsive.push((column, u64::from(col.layout_width()))),
                ResponsiveClass::Control => fixed += u64::from(col.layout_width()),
                ResponsiveClass::AlwaysHidden | ResponsiveClass::Never => {}
            }
        }

        // u32 widths summed in u64 cannot overflow.
        let mut total: u64 = fixed + responsive.iter().map(|(_, w)| *w).sum::<u64>();
        let mut collapsed = HashSet::new();
        while total > u64::from(width) && responsive.len() > 1 {
            if let Some((column, w)) = responsive.pop() {
                total -= w;
                collapsed.insert(column);
            }
        }
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use horizon_grid_core::ManualClock;

    use super::*;
    use crate::model::{Column, TableData};

    fn create_test_engine() -> GridEngine {
        let mut wide = Column::new("wide", 1);
        wide.min_width = Some(300);
        GridEngine::new(TableData::new(
            vec![
                Column::new("name", 0),
                wide,
                Column::new("city", 2),
                Column::new("details", 3).with_responsive(ResponsiveClass::Control),
                Column::new("notes", 4).with_responsive(ResponsiveClass::AlwaysHidden),
            ],
            vec![],
        ))
    }

    #[test]
    fn test_compute_collapses_from_the_right() {
        let engine = create_test_engine();
        assert!(ResponsiveLayout::compute(&engine, 600).is_empty());
        assert_eq!(ResponsiveLayout::compute(&engine, 599), HashSet::from([2]));
        assert_eq!(ResponsiveLayout::compute(&engine, 150), HashSet::from([1, 2]));
        assert_eq!(ResponsiveLayout::compute(&engine, 10), HashSet::from([1, 2]));
    }

    #[test]
    fn test_compute_follows_order_and_visibility() {
        let mut engine = create_test_engine();
        engine.set_order(vec![2, 1, 0, 3, 4]);
        assert_eq!(ResponsiveLayout::compute(&engine, 500), HashSet::from([0]));
        engine.set_column_visible(1, false);
        assert!(ResponsiveLayout::compute(&engine, 300).is_empty());
    }

    #[test]
    fn test_compute_with_huge_min_widths() {
        let columns = (0..4)
            .map(|i| {
                let mut column = Column::new(format!("c{i}"), i);
                column.min_width = Some(u32::MAX);
                column
            })
            .collect();
        let engine = GridEngine::new(TableData::new(columns, vec![]));
        assert_eq!(ResponsiveLayout::compute(&engine, u32::MAX), HashSet::from([1, 2, 3]));
        assert_eq!(ResponsiveLayout::compute(&engine, 0), HashSet::from([1, 2, 3]));
    }

    #[test]
    fn test_resize_is_debounced() {
        let clock = Arc::new(ManualClock::new());
        let engine = create_test_engine();
        let mut layout = ResponsiveLayout::new(clock.clone());
        layout.notify_resized(800);
        clock.advance(Duration::from_millis(50));
        layout.notify_resized(400);
        assert!(!layout.poll(&engine));
        clock.advance(LAYOUT_RECOMPUTE_TIMEOUT);
        assert!(layout.poll(&engine));
        assert_eq!(layout.viewport(), Some(400));
        assert_eq!(layout.collapsed(), &HashSet::from([1, 2]));
        assert!(!layout.recompute(&engine));
    }
}
