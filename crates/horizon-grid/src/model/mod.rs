//! Table data model and the grid engine.
//!
//! The model is the typed form of a table: [`Column`]s describe behavior that
//! markup declared through classes and attributes, [`Row`]s carry cells and
//! tree metadata. [`TableData`] owns both and is immutable once built, apart
//! from wholesale replacement on refresh.
//!
//! [`GridEngine`] sits on top and plays the part of the rendering engine:
//!
//! ```text
//! ┌─────────────┐     ┌───────────────────────────────┐     ┌──────────┐
//! │  TableData  │ ──► │ GridEngine                    │ ──► │ DrawReport│
//! │ (rows/cols) │     │ search → sort → paginate      │     │ (events) │
//! └─────────────┘     │ column order / visibility     │     └──────────┘
//!                     └───────────────────────────────┘
//! ```

mod column;
mod engine;
mod row;
pub mod text;

use std::collections::{HashMap, HashSet};

pub use column::{Column, FilterKind, HierarchyRole, ResponsiveClass, ResultRole};
pub use engine::{
    ColumnSearch, DrawReport, EngineEvent, GridEngine, RowComparator, SortDirection, SortSpec,
};
pub use row::{Cell, Row, RowId};

use horizon_grid_core::logging::targets;

/// Columns and rows of one table.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl TableData {
    /// Build table data, normalizing rows that do not fit the columns.
    ///
    /// Rows with too few cells are padded with empty cells, surplus cells are
    /// dropped. Rows whose parent id does not resolve are re-attached to the
    /// root and flagged as orphans.
    pub fn new(columns: Vec<Column>, mut rows: Vec<Row>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            if row.cells.len() != width {
                tracing::warn!(
                    target: targets::MARKUP,
                    row = %row.id,
                    cells = row.cells.len(),
                    columns = width,
                    "row cell count does not match column count"
                );
                row.cells.resize_with(width, Default::default);
            }
        }

        let ids: HashSet<RowId> = rows.iter().map(|r| r.id).collect();
        for row in &mut rows {
            if !row.parent_id.is_root() && !ids.contains(&row.parent_id) {
                tracing::warn!(
                    target: targets::MARKUP,
                    row = %row.id,
                    parent = %row.parent_id,
                    "parent row not found, treating row as top-level orphan"
                );
                row.parent_id = RowId::ROOT;
                row.level = 0;
                row.orphan = true;
            }
        }
        normalize_levels(&mut rows);

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    pub fn row(&self, position: usize) -> Option<&Row> {
        self.rows.get(position)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Original index of the column with the given key.
    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Original index of the column playing `role`.
    pub fn hierarchy_column(&self, role: HierarchyRole) -> Option<usize> {
        self.columns.iter().position(|c| c.hierarchy == Some(role))
    }

    /// Whether the rows form a tree.
    pub fn has_hierarchy(&self) -> bool {
        self.hierarchy_column(HierarchyRole::Key).is_some()
    }

    /// Rendered cell content, empty for out-of-range positions.
    pub fn cell_html(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.cell(column))
            .map(|c| c.html.as_str())
            .unwrap_or("")
    }

    /// The text a column search matches against.
    ///
    /// The hierarchy key column is searched by parent id, everything else by
    /// the explicit search value or the tag-stripped content.
    pub fn search_text(&self, row: usize, column: usize) -> String {
        let Some(r) = self.rows.get(row) else {
            return String::new();
        };
        let Some(col) = self.columns.get(column) else {
            return String::new();
        };
        if col.hierarchy == Some(HierarchyRole::Key) {
            return r.parent_id.to_string();
        }
        match r.cell(column) {
            Some(cell) => match &cell.search {
                Some(search) => search.clone(),
                None if col.processed_html => text::replace_tags(&cell.html, "|"),
                None => text::strip_tags(&cell.html),
            },
            None => String::new(),
        }
    }
}

/// Make every level equal the row's depth below the root.
///
/// The tree comparator walks parent links by level, so a declared level that
/// disagrees with the parent chain is corrected. Rows caught in a parent cycle
/// are re-attached to the root.
fn normalize_levels(rows: &mut [Row]) {
    let parent_of: HashMap<RowId, RowId> = rows.iter().map(|r| (r.id, r.parent_id)).collect();
    for row in rows.iter_mut() {
        let mut seen = HashSet::from([row.id]);
        let mut depth = 0u32;
        let mut current = row.parent_id;
        let mut cyclic = false;
        while !current.is_root() {
            if !seen.insert(current) {
                cyclic = true;
                break;
            }
            depth += 1;
            current = parent_of.get(&current).copied().unwrap_or(RowId::ROOT);
        }

        if cyclic {
            tracing::warn!(target: targets::MARKUP, row = %row.id, "parent cycle detected, treating row as orphan");
            row.parent_id = RowId::ROOT;
            row.level = 0;
            row.orphan = true;
        } else if depth != row.level {
            tracing::warn!(
                target: targets::MARKUP,
                row = %row.id,
                declared = row.level,
                actual = depth,
                "hierarchy level does not match parent chain"
            );
            row.level = depth;
        }
    }
}
