//! Table controller: lifecycle, persistence round trip and event wiring.
//!
//! [`TableController`] orchestrates the engine, filters, tree, toolbar and
//! layout of one table. [`TableRegistry`] holds the tables of a host and
//! applies page-wide modes.

mod events;
mod lifecycle;
mod options;
mod registry;

pub use events::TableEvents;
pub use lifecycle::{Lifecycle, TableController, TableFeatures, TimerReport, ViewMode};
pub use options::{TableCallbacks, TableOptions};
pub use registry::{SharedTable, TableRegistry};
