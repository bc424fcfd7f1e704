//! Core systems for Horizon Grid.
//!
//! This crate provides the table-independent building blocks of the Horizon
//! Grid engine:
//!
//! - **Signal System**: Type-safe observer connections for grid events
//! - **Timers**: One-shot timers on an injectable [`Clock`]
//! - **Debouncing**: Last-write-wins coalescing for persistence and layout work
//! - **Logging**: `tracing` targets and span names shared by all subsystems
//!
//! # Debounce Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_grid_core::{Debouncer, ManualClock, SharedClock};
//!
//! let clock = ManualClock::new();
//! let shared: SharedClock = Arc::new(clock.clone());
//! let mut saves = Debouncer::new(Duration::from_millis(300), shared);
//!
//! saves.schedule("first");
//! saves.schedule("second");
//! clock.advance(Duration::from_millis(300));
//!
//! assert_eq!(saves.poll(), Some("second"));
//! ```

mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use error::{CoreError, Result, SignalError, TimerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{Clock, Debouncer, ManualClock, SharedClock, SystemClock, TimerId, TimerManager};
