//! Rows, cells and row identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The foreign id of a row, as carried by the hierarchy data cell.
///
/// `0` is reserved for the virtual root every top-level row hangs off.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl RowId {
    /// The virtual root.
    pub const ROOT: RowId = RowId(0);

    /// Whether this is the virtual root.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RowId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RowId)
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        RowId(id)
    }
}

/// One cell of a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// Rendered content.
    pub html: String,
    /// Explicit sort value (`data-sort`).
    pub sort: Option<String>,
    /// Explicit search value (`data-search`).
    pub search: Option<String>,
}

impl Cell {
    /// A cell with the given content.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            sort: None,
            search: None,
        }
    }

    /// Set the sort value.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Set the search value.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// The value used for ordering.
    pub fn sort_value(&self) -> &str {
        self.sort.as_deref().unwrap_or(&self.html)
    }
}

impl From<&str> for Cell {
    fn from(html: &str) -> Self {
        Cell::new(html)
    }
}

impl From<String> for Cell {
    fn from(html: String) -> Self {
        Cell::new(html)
    }
}

/// A data row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row id.
    pub id: RowId,
    /// Id of the parent row, [`RowId::ROOT`] for top-level rows.
    pub parent_id: RowId,
    /// Depth below the root, 0-based.
    pub level: u32,
    /// One cell per column, in original column order.
    pub cells: Vec<Cell>,
    /// The declared parent did not exist; the row was re-attached to the root.
    pub orphan: bool,
}

impl Row {
    /// A top-level row.
    pub fn new(id: impl Into<RowId>, cells: Vec<Cell>) -> Self {
        Self {
            id: id.into(),
            parent_id: RowId::ROOT,
            level: 0,
            cells,
            orphan: false,
        }
    }

    /// Place the row below `parent` at depth `level`.
    pub fn with_parent(mut self, parent: impl Into<RowId>, level: u32) -> Self {
        self.parent_id = parent.into();
        self.level = level;
        self
    }

    /// The cell of the given original column.
    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_parse_and_display() {
        assert_eq!(" 42 ".parse::<RowId>().ok(), Some(RowId(42)));
        assert!("x".parse::<RowId>().is_err());
        assert_eq!(RowId(7).to_string(), "7");
        assert!(RowId::ROOT.is_root());
    }

    #[test]
    fn test_row_id_serializes_as_number() {
        let json = serde_json::to_string(&vec![RowId(0), RowId(12)]).unwrap();
        assert_eq!(json, "[0,12]");
    }

    #[test]
    fn test_cell_sort_value() {
        assert_eq!(Cell::new("<b>x</b>").sort_value(), "<b>x</b>");
        assert_eq!(Cell::new("x").with_sort("001").sort_value(), "001");
    }

    #[test]
    fn test_row_builder() {
        let row = Row::new(3, vec![Cell::new("a")]).with_parent(1, 1);
        assert_eq!(row.parent_id, RowId(1));
        assert_eq!(row.level, 1);
        assert_eq!(row.cell(0).map(|c| c.html.as_str()), Some("a"));
        assert!(row.cell(1).is_none());
    }
}
