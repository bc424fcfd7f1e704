//! Toolbar buttons.
//!
//! The toolbar is a plain model: which buttons exist, which are toggled on,
//! and the markers the host renders (refresh needed, active filters hidden
//! behind a collapsed filter row). Actions are performed by the controller.

use std::fmt;

use horizon_grid_core::logging::targets;

/// Hierarchy depths offered by the tree level buttons.
pub const TREE_LEVELS: [u32; 3] = [0, 1, 2];

/// The kind of a toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    /// Reload table data through the refresh callback.
    Refresh,
    /// Expand the tree to one of [`TREE_LEVELS`].
    TreeLevels,
    /// Show or hide the column filter row.
    ToggleColumnFilters,
    /// Show or hide the global search field.
    ToggleSearchField,
    /// Open the column visibility menus.
    ColumnVisibility,
    /// Create a record through the add callback.
    Add,
}

/// A button and its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub kind: ButtonKind,
    /// Toggled on; only meaningful for toggle buttons.
    pub active: bool,
    pub disabled: bool,
    pub hidden: bool,
}

impl ToolbarButton {
    fn new(kind: ButtonKind) -> Self {
        Self {
            kind,
            active: false,
            disabled: false,
            hidden: false,
        }
    }
}

/// What a table offers, as far as the toolbar is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolbarConfig {
    pub refresh: bool,
    pub tree: bool,
    pub tree_buttons: bool,
    pub column_filters: bool,
    pub search_field: bool,
    pub add: bool,
    /// The table has no rows; the visibility menu is disabled.
    pub empty: bool,
}

/// An active filter on a column whose filter row is hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenFilter {
    pub column: usize,
    pub title: String,
    pub value: String,
}

/// Warning shown on the filter toggle while filters are active but hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenFilterWarning {
    pub filters: Vec<HiddenFilter>,
}

impl fmt::Display for HiddenFilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hidden active filters: ")?;
        let last = self.filters.len().saturating_sub(1);
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(if i == last { " and " } else { ", " })?;
            }
            write!(f, "\"{}\" in column \"{}\"", filter.value, filter.title)?;
        }
        Ok(())
    }
}

/// Buttons of one table, in display order.
#[derive(Debug, Clone, Default)]
pub struct Toolbar {
    buttons: Vec<ToolbarButton>,
    refresh_needed: bool,
    warning: Option<HiddenFilterWarning>,
}

impl Toolbar {
    pub fn build(config: &ToolbarConfig) -> Self {
        let mut buttons = Vec::new();
        if config.refresh {
            buttons.push(ToolbarButton::new(ButtonKind::Refresh));
        }
        if config.tree && config.tree_buttons {
            buttons.push(ToolbarButton::new(ButtonKind::TreeLevels));
        }
        if config.column_filters {
            let mut button = ToolbarButton::new(ButtonKind::ToggleColumnFilters);
            button.active = true;
            buttons.push(button);
        }
        if config.search_field {
            let mut button = ToolbarButton::new(ButtonKind::ToggleSearchField);
            button.active = true;
            buttons.push(button);
        }
        let mut colvis = ToolbarButton::new(ButtonKind::ColumnVisibility);
        colvis.disabled = config.empty;
        buttons.push(colvis);
        if config.add {
            buttons.push(ToolbarButton::new(ButtonKind::Add));
        }
        tracing::debug!(target: targets::TOOLBAR, count = buttons.len(), "toolbar built");

        Self {
            buttons,
            refresh_needed: false,
            warning: None,
        }
    }

    pub fn buttons(&self) -> &[ToolbarButton] {
        &self.buttons
    }

    pub fn button(&self, kind: ButtonKind) -> Option<&ToolbarButton> {
        self.buttons.iter().find(|b| b.kind == kind)
    }

    fn button_mut(&mut self, kind: ButtonKind) -> Option<&mut ToolbarButton> {
        self.buttons.iter_mut().find(|b| b.kind == kind)
    }

    /// Whether a button exists and is shown.
    pub fn is_shown(&self, kind: ButtonKind) -> bool {
        self.button(kind).is_some_and(|b| !b.hidden)
    }

    pub fn is_active(&self, kind: ButtonKind) -> bool {
        self.button(kind).is_some_and(|b| b.active)
    }

    pub fn set_active(&mut self, kind: ButtonKind, active: bool) {
        if let Some(button) = self.button_mut(kind) {
            button.active = active;
        }
    }

    pub fn set_hidden(&mut self, kind: ButtonKind, hidden: bool) {
        if let Some(button) = self.button_mut(kind) {
            button.hidden = hidden;
        }
    }

    /// Flag the refresh button as needing a reload.
    pub fn set_refresh_needed(&mut self, needed: bool) {
        self.refresh_needed = needed;
    }

    pub fn refresh_needed(&self) -> bool {
        self.refresh_needed
    }

    pub fn set_hidden_filter_warning(&mut self, warning: Option<HiddenFilterWarning>) {
        self.warning = warning.filter(|w| !w.filters.is_empty());
    }

    pub fn hidden_filter_warning(&self) -> Option<&HiddenFilterWarning> {
        self.warning.as_ref()
    }
}
