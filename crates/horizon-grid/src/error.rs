//! Error types for the grid engine.

use std::path::PathBuf;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur in the grid engine.
///
/// Most of these never cross a public operation boundary: the controller logs
/// them and falls back to defaults. They surface directly from the lower-level
/// building blocks (markup parsing, stores, option parsing).
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The table markup is structurally unusable.
    #[error("Invalid table markup: {0}")]
    Markup(String),

    /// Custom options could not be parsed.
    #[error("Invalid table options: {0}")]
    Options(#[source] serde_json::Error),

    /// Persisted view state could not be parsed or produced.
    #[error("Invalid view state for '{key}': {source}")]
    State {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the local state store failed.
    #[error("State store I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local store location could not be determined.
    #[error("No local state directory available")]
    NoStateDirectory,

    /// A search expression is not a valid regular expression.
    #[error("Invalid search pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A column index or key does not exist in the table.
    #[error("Unknown column {0}")]
    UnknownColumn(String),

    /// A filter value of the wrong shape was applied to a column.
    #[error("Filter value does not fit the {kind} filter of column {column}")]
    FilterMismatch { column: usize, kind: String },

    /// The operation requires an initialized table.
    #[error("Table '{0}' is not ready")]
    NotReady(String),
}

impl GridError {
    /// Create a markup error.
    pub fn markup(message: impl Into<String>) -> Self {
        Self::Markup(message.into())
    }

    /// Create a state error.
    pub fn state(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::State {
            key: key.into(),
            source,
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a pattern error.
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a filter mismatch error.
    pub fn filter_mismatch(column: usize, kind: impl std::fmt::Debug) -> Self {
        Self::FilterMismatch {
            column,
            kind: format!("{kind:?}"),
        }
    }

    /// Create an unknown column error.
    pub fn unknown_column(column: impl ToString) -> Self {
        Self::UnknownColumn(column.to_string())
    }
}
