//! Column visibility menus.
//!
//! Columns that take part in the responsive layout are listed in the primary
//! menu; columns that are always collapsed, or collapsed by the current
//! viewport, are listed in the secondary menu. Never-shown and control columns
//! are not listed at all. Both menus follow the engine's display order and
//! can be reordered by moving entries, which moves the column in the global
//! order.

use std::collections::HashSet;

use horizon_grid_core::logging::targets;

use super::order::array_change_position;
use crate::filter::FilterSet;
use crate::model::{GridEngine, ResponsiveClass};
use crate::selectors::classes;

/// Which of the two menus an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Primary,
    Secondary,
}

/// One column entry of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Original column index.
    pub column: usize,
    pub title: String,
    pub visible: bool,
    /// Entry of a responsive sub column.
    pub sub_column: bool,
    /// Visibility cannot be toggled.
    pub disabled: bool,
    /// The column's filter holds a value.
    pub filtered: bool,
}

impl MenuEntry {
    /// Marker classes the host renders on the entry.
    pub fn classes(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.sub_column {
            out.push(classes::COLVIS_SUB_COLUMN);
        }
        if self.disabled {
            out.push(classes::COLVIS_INACTIVE);
        }
        if self.filtered {
            out.push(classes::COLVIS_FILTERED);
        }
        out
    }
}

/// The primary and secondary visibility menus of a table.
#[derive(Debug, Clone, Default)]
pub struct ColumnMenu {
    primary: Vec<MenuEntry>,
    secondary: Vec<MenuEntry>,
    erase_all_visible: bool,
}

impl ColumnMenu {
    /// Build both menus. `collapsed` holds the columns the responsive layout
    /// currently hides.
    pub fn build(engine: &GridEngine, filters: &FilterSet, collapsed: &HashSet<usize>) -> Self {
        let mut menu = Self::default();
        menu.refresh(engine, filters, collapsed);
        menu
    }

    /// Consistency pass after a reorder, a search or a visibility change.
    ///
    /// Recomputes entries and markers from the engine. Safe to repeat.
    pub fn refresh(&mut self, engine: &GridEngine, filters: &FilterSet, collapsed: &HashSet<usize>) {
        self.primary.clear();
        self.secondary.clear();

        let data = engine.data();
        for &column in engine.order() {
            let Some(col) = data.column(column) else {
                continue;
            };
            let kind = match col.responsive {
                ResponsiveClass::Never | ResponsiveClass::Control => continue,
                ResponsiveClass::AlwaysHidden => MenuKind::Secondary,
                ResponsiveClass::Auto if collapsed.contains(&column) => MenuKind::Secondary,
                ResponsiveClass::Auto => MenuKind::Primary,
            };
            let entry = MenuEntry {
                column,
                title: col.title.clone(),
                visible: engine.is_column_visible(column),
                sub_column: kind == MenuKind::Secondary,
                disabled: col.colvis_inactive,
                filtered: filters.is_active(column),
            };
            match kind {
                MenuKind::Primary => self.primary.push(entry),
                MenuKind::Secondary => self.secondary.push(entry),
            }
        }

        self.erase_all_visible =
            !filters.active_columns().is_empty() || !engine.global_search().is_empty();

        tracing::trace!(
            target: targets::TOOLBAR,
            primary = self.primary.len(),
            secondary = self.secondary.len(),
            "column menus refreshed"
        );
    }

    pub fn entries(&self, kind: MenuKind) -> &[MenuEntry] {
        match kind {
            MenuKind::Primary => &self.primary,
            MenuKind::Secondary => &self.secondary,
        }
    }

    pub fn primary(&self) -> &[MenuEntry] {
        &self.primary
    }

    pub fn secondary(&self) -> &[MenuEntry] {
        &self.secondary
    }

    /// Entry of a column in either menu.
    pub fn entry(&self, column: usize) -> Option<&MenuEntry> {
        self.primary
            .iter()
            .chain(&self.secondary)
            .find(|e| e.column == column)
    }

    /// Whether the reset-all-filters entry is offered.
    pub fn erase_all_visible(&self) -> bool {
        self.erase_all_visible
    }

    /// Index of a menu's first entry in the combined entry list.
    pub fn offset(&self, kind: MenuKind) -> usize {
        match kind {
            MenuKind::Primary => 0,
            MenuKind::Secondary => self.primary.len(),
        }
    }

    fn combined(&self, index: usize) -> Option<&MenuEntry> {
        self.primary.iter().chain(&self.secondary).nth(index)
    }

    /// The display order after moving entry `old` of a menu to `new`.
    ///
    /// Returns `None` when either index is outside the menu or nothing moves.
    pub fn moved_order(&self, kind: MenuKind, old: usize, new: usize, order: &[usize]) -> Option<Vec<usize>> {
        let len = self.entries(kind).len();
        if old >= len || new >= len || old == new {
            return None;
        }
        let base = self.offset(kind);
        let from_column = self.combined(base + old)?.column;
        let to_column = self.combined(base + new)?.column;
        let from = order.iter().position(|&c| c == from_column)?;
        let to = order.iter().position(|&c| c == to_column)?;

        let mut moved = order.to_vec();
        array_change_position(&mut moved, from, to).then_some(moved)
    }
}
