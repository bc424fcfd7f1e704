//! View-state persistence.
//!
//! A [`ViewState`] is loaded once when a table initializes and written back,
//! debounced, whenever the view changes. The JSON shape is shared with other
//! consumers of the stored preferences, so field names are fixed.

mod persist;
mod store;
mod view_state;

pub use persist::StatePersister;
pub use store::{JsonFileStore, MemoryStore, SinkStore, StateStore, state_key};
pub use view_state::{FilterStateEntry, PersistedDirection, PersistedSort, PersistedState, ViewState};
