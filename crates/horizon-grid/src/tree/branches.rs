//! The set of expanded branches.

use horizon_grid_core::logging::targets;

use super::HierarchyCache;
use crate::model::{Row, RowId};

/// Outcome of [`VisibleBranches::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Expanded,
    Collapsed,
    /// The root cannot be toggled.
    Unchanged,
}

/// Ids of the rows whose children are shown, in insertion order.
///
/// A row is visible iff its parent id is in the set. The root is always a
/// member, so top-level rows are always visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleBranches {
    ids: Vec<RowId>,
}

impl Default for VisibleBranches {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibleBranches {
    /// Only top-level rows visible.
    pub fn new() -> Self {
        Self {
            ids: vec![RowId::ROOT],
        }
    }

    /// Restore a persisted set; the root is added when missing and duplicates dropped.
    pub fn from_ids(ids: impl IntoIterator<Item = RowId>) -> Self {
        let mut branches = Self::new();
        for id in ids {
            branches.insert(id);
        }
        branches
    }

    fn insert(&mut self, id: RowId) -> bool {
        if self.ids.contains(&id) {
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false, the root is a member.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `row` is shown under this set.
    pub fn is_visible(&self, row: &Row) -> bool {
        self.contains(row.parent_id)
    }

    /// Expand `id`, or collapse it together with every expanded descendant.
    pub fn toggle(&mut self, id: RowId, cache: &HierarchyCache) -> Toggle {
        if id.is_root() {
            return Toggle::Unchanged;
        }
        if self.contains(id) {
            self.collapse(id, cache);
            Toggle::Collapsed
        } else {
            self.expand(id);
            Toggle::Expanded
        }
    }

    /// Show the direct children of `id`.
    pub fn expand(&mut self, id: RowId) -> bool {
        let added = self.insert(id);
        if added {
            tracing::debug!(target: targets::TREE, row = %id, "branch expanded");
        }
        added
    }

    /// Hide the children of `id` and collapse every descendant branch.
    pub fn collapse(&mut self, id: RowId, cache: &HierarchyCache) -> bool {
        if id.is_root() || !self.contains(id) {
            return false;
        }
        let mut removed = vec![id];
        removed.extend(cache.descendants(id));
        self.ids.retain(|existing| !removed.contains(existing));
        tracing::debug!(target: targets::TREE, row = %id, "branch collapsed");
        true
    }

    /// Expand every row with children above depth `depth`.
    ///
    /// `display_level(0)` shows top-level rows only, `display_level(1)` also
    /// their children, and so on.
    pub fn display_level(depth: u32, cache: &HierarchyCache) -> Self {
        let mut branches = Self::new();
        let mut position = 0;
        while let Some(id) = cache.id_at(position) {
            if let Some(info) = cache.get(id) {
                if info.level < depth && !info.child_positions.is_empty() {
                    branches.insert(id);
                }
            }
            position += 1;
        }
        branches
    }

    /// The anchored alternation searched against the parent id column,
    /// e.g. `^0$|^12$`.
    pub fn to_search_pattern(&self) -> String {
        let joined = self
            .ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("$|^");
        format!("^{joined}$")
    }
}
