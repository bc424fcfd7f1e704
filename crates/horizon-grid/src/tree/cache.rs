//! Parent/child index over the rows of a tree table.

use std::collections::HashMap;

use horizon_grid_core::logging::targets;

use crate::model::{RowId, TableData};

/// What the cache knows about one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInfo {
    /// Position of the row in the table data.
    pub position: usize,
    pub level: u32,
    pub parent_id: RowId,
    /// Positions of the direct children, in row order.
    pub child_positions: Vec<usize>,
}

/// `RowId → RowInfo` index built in one scan over the rows.
///
/// Rebuild it whenever the row set is replaced.
#[derive(Debug, Clone, Default)]
pub struct HierarchyCache {
    rows: HashMap<RowId, RowInfo>,
    ids_by_position: Vec<RowId>,
    orphans: Vec<RowId>,
}

impl HierarchyCache {
    /// Index the rows of `data`.
    #[tracing::instrument(skip_all, target = "horizon_grid::tree", level = "trace")]
    pub fn build(data: &TableData) -> Self {
        let mut rows: HashMap<RowId, RowInfo> = HashMap::with_capacity(data.row_count());
        let mut ids_by_position = Vec::with_capacity(data.row_count());
        let mut orphans = Vec::new();

        for (position, row) in data.rows().iter().enumerate() {
            ids_by_position.push(row.id);
            if row.orphan {
                orphans.push(row.id);
            }
            let previous = rows.insert(
                row.id,
                RowInfo {
                    position,
                    level: row.level,
                    parent_id: row.parent_id,
                    child_positions: Vec::new(),
                },
            );
            if previous.is_some() {
                tracing::warn!(target: targets::TREE, row = %row.id, "duplicate row id, later row wins");
            }
        }

        for (position, id) in ids_by_position.iter().enumerate() {
            let Some(parent_id) = rows.get(id).map(|info| info.parent_id) else {
                continue;
            };
            if parent_id.is_root() {
                continue;
            }
            match rows.get_mut(&parent_id) {
                Some(parent) => parent.child_positions.push(position),
                None => tracing::warn!(target: targets::TREE, row = %id, parent = %parent_id, "parent row missing from cache"),
            }
        }

        tracing::debug!(target: targets::TREE, rows = rows.len(), orphans = orphans.len(), "hierarchy cache built");
        Self {
            rows,
            ids_by_position,
            orphans,
        }
    }

    pub fn get(&self, id: RowId) -> Option<&RowInfo> {
        self.rows.get(&id)
    }

    /// Position of the row with `id`.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.get(&id).map(|info| info.position)
    }

    /// Id of the row at `position`.
    pub fn id_at(&self, position: usize) -> Option<RowId> {
        self.ids_by_position.get(position).copied()
    }

    /// Info of the row at `position`.
    pub fn info_at(&self, position: usize) -> Option<&RowInfo> {
        self.id_at(position).and_then(|id| self.get(id))
    }

    /// Ids of the direct children of `id`.
    pub fn children(&self, id: RowId) -> Vec<RowId> {
        self.rows
            .get(&id)
            .map(|info| {
                info.child_positions
                    .iter()
                    .filter_map(|&p| self.id_at(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_children(&self, id: RowId) -> bool {
        self.rows
            .get(&id)
            .is_some_and(|info| !info.child_positions.is_empty())
    }

    /// Ids of every transitive descendant of `id`, depth first.
    pub fn descendants(&self, id: RowId) -> Vec<RowId> {
        let mut out = Vec::new();
        let mut stack: Vec<RowId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            if out.contains(&next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Ids of the ancestors of `id`, nearest first, excluding the root.
    pub fn ancestors(&self, id: RowId) -> Vec<RowId> {
        let mut out = Vec::new();
        let mut current = self.rows.get(&id).map(|info| info.parent_id);
        while let Some(parent) = current {
            if parent.is_root() || parent == id || out.contains(&parent) {
                break;
            }
            out.push(parent);
            current = self.rows.get(&parent).map(|info| info.parent_id);
        }
        out
    }

    /// Rows re-attached to the root because their parent was missing.
    pub fn orphans(&self) -> &[RowId] {
        &self.orphans
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
