//! Horizon Grid - headless hierarchical data grids.
//!
//! Turns a static table description into an interactive grid model with
//! column reordering, per-column filters, global search, persisted view state
//! and a parent/child tree emulated on top of the flat rows.
//!
//! # Example
//!
//! ```
//! use horizon_grid::prelude::*;
//! use horizon_grid::selectors::classes;
//!
//! fn main() -> Result<()> {
//!     let markup = TableMarkup::new(vec![
//!         HeaderCell::new("").class(classes::HIERARCHY_DATA),
//!         HeaderCell::new("Name"),
//!     ])
//!     .class(classes::TREE_TABLE)
//!     .with_footer(vec![FooterCell::new().class(classes::NON_FILTERABLE), FooterCell::new()])
//!     .with_row(vec![BodyCell::hierarchy(1, 0, 0), "Berlin".into()])
//!     .with_row(vec![BodyCell::hierarchy(2, 1, 1), "Mitte".into()]);
//!
//!     let mut table = TableController::from_markup("locations", &markup, TableOptions::new())?;
//!     table.initialize()?;
//!     assert_eq!(table.displayed_row_ids(), vec![RowId(1)]);
//!
//!     table.toggle_branch(RowId(1))?;
//!     assert_eq!(table.displayed_row_ids(), vec![RowId(1), RowId(2)]);
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! Every subsystem logs through `tracing` under a target from
//! [`horizon_grid_core::logging::targets`].

pub mod controller;
mod error;
pub mod filter;
pub mod layout;
pub mod markup;
pub mod model;
pub mod prelude;
pub mod results;
pub mod selectors;
pub mod state;
pub mod toolbar;
pub mod tree;

pub use error::{GridError, Result};

pub use controller::{
    Lifecycle, SharedTable, TableCallbacks, TableController, TableEvents, TableFeatures,
    TableOptions, TableRegistry, TimerReport, ViewMode,
};
pub use filter::{FilterControl, FilterSet, FilterValue};
pub use layout::ResponsiveLayout;
pub use markup::{BodyCell, FooterCell, HeaderCell, TableMarkup};
pub use model::{Cell, Column, GridEngine, Row, RowId, TableData};
pub use results::ResultsRow;
pub use state::{JsonFileStore, MemoryStore, SinkStore, StateStore, ViewState};
