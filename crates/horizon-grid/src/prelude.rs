//! Prelude module for Horizon Grid.
//!
//! Re-exports the types most hosts need:
//!
//! ```ignore
//! use horizon_grid::prelude::*;
//! ```

// ============================================================================
// Controller
// ============================================================================

pub use crate::controller::{
    Lifecycle, TableController, TableEvents, TableFeatures, TableOptions, TableRegistry, ViewMode,
};
pub use crate::error::{GridError, Result};

// ============================================================================
// Markup and model
// ============================================================================

pub use crate::markup::{BodyCell, FooterCell, HeaderCell, TableMarkup};
pub use crate::model::{
    Cell, Column, FilterKind, HierarchyRole, ResponsiveClass, Row, RowId, SortDirection, TableData,
};

// ============================================================================
// Filters, tree and toolbar
// ============================================================================

pub use crate::filter::{CheckboxState, FilterValue};
pub use crate::toolbar::{ButtonKind, MenuKind};
pub use crate::tree::{Toggle, VisibleBranches};

// ============================================================================
// Persistence
// ============================================================================

pub use crate::state::{JsonFileStore, MemoryStore, SinkStore, StateStore, ViewState};

// ============================================================================
// Core
// ============================================================================

pub use horizon_grid_core::{ManualClock, SharedClock, Signal, SystemClock};
