//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the host installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid::tree=debug,horizon_grid::state=warn")
//!     .init();
//! ```
//!
//! Degraded features (orphan rows, unresolvable persisted columns, malformed
//! state) are reported at `warn` level under the subsystem's target so that a
//! table keeps rendering while the problem stays visible in the logs.

/// Span names used throughout Horizon Grid for tracing.
pub mod span_names {
    /// A full filter/sort/paginate pass.
    pub const DRAW: &str = "horizon_grid::draw";
    /// Table initialization.
    pub const INIT: &str = "horizon_grid::init";
    /// Performance measurement span.
    pub const PERF: &str = "horizon_grid::perf";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core infrastructure target.
    pub const CORE: &str = "horizon_grid_core";
    /// Timer system target.
    pub const TIMER: &str = "horizon_grid_core::timer";
    /// Signal system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Markup ingestion target.
    pub const MARKUP: &str = "horizon_grid::markup";
    /// Grid engine (search, order, draw) target.
    pub const ENGINE: &str = "horizon_grid::engine";
    /// Tree subsystem target.
    pub const TREE: &str = "horizon_grid::tree";
    /// Filter subsystem target.
    pub const FILTER: &str = "horizon_grid::filter";
    /// Toolbar and column menu target.
    pub const TOOLBAR: &str = "horizon_grid::toolbar";
    /// View-state persistence target.
    pub const STATE: &str = "horizon_grid::state";
    /// Table controller target.
    pub const CONTROLLER: &str = "horizon_grid::controller";
}

/// A guard for timing an operation.
///
/// Enters an `info` span under [`span_names::PERF`] that lasts until the guard
/// is dropped.
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: span_names::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
