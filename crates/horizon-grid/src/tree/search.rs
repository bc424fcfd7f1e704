//! Search-driven ancestor revelation.
//!
//! While a content search is active the expanded-branch set is temporarily
//! replaced by the matches and their ancestors, so every match is shown in
//! context. Ancestors are pinned: they stay visible although they do not match
//! themselves. Once the search clears, the saved branch set comes back.

use std::collections::HashSet;

use horizon_grid_core::logging::targets;

use super::{HierarchyCache, VisibleBranches};
use crate::model::{GridEngine, RowId};

/// Whether a tree search pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// A pass is applying its result; nested passes are skipped.
    Reprocessing,
}

/// What a tree search pass wants applied to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreePlan {
    /// Show these branches and pin these row positions.
    Reveal {
        branches: VisibleBranches,
        pins: HashSet<usize>,
    },
    /// Go back to the user's own branch set with no pins.
    Restore,
}

/// Re-entrancy guard and filtered marker for tree searches.
#[derive(Debug, Default)]
pub struct TreeSearch {
    phase: SearchPhase,
    filtered: bool,
}

impl TreeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Enter [`SearchPhase::Reprocessing`]. Returns false if a pass is
    /// already running.
    pub fn begin(&mut self) -> bool {
        if self.phase == SearchPhase::Reprocessing {
            tracing::trace!(target: targets::TREE, "tree search already running, skipping");
            return false;
        }
        self.phase = SearchPhase::Reprocessing;
        true
    }

    /// Leave [`SearchPhase::Reprocessing`].
    pub fn end(&mut self) {
        self.phase = SearchPhase::Idle;
    }

    /// Whether the shown branches come from a search rather than the user.
    /// Branch toggles are ignored while this holds.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Whether a search other than the structural columns and the view
    /// prefilters is active.
    pub fn content_search_active(engine: &GridEngine) -> bool {
        if !engine.global_search().is_empty() {
            return true;
        }
        let data = engine.data();
        engine.searched_columns().into_iter().any(|col| {
            data.column(col)
                .is_some_and(|c| !c.is_structural() && !c.view_prefilter)
        })
    }

    /// Work out which branches to show for the current searches.
    pub fn plan(&mut self, engine: &GridEngine, cache: &HierarchyCache) -> TreePlan {
        if !Self::content_search_active(engine) {
            if self.filtered {
                tracing::debug!(target: targets::TREE, "content search cleared, restoring branches");
            }
            self.filtered = false;
            return TreePlan::Restore;
        }

        let data = engine.data();
        let matches = engine.rows_matching(|col| data.column(col).is_some_and(|c| c.is_structural()));
        let match_ids: Vec<RowId> = matches.iter().filter_map(|&p| cache.id_at(p)).collect();

        let mut ancestors: Vec<RowId> = Vec::new();
        for &id in &match_ids {
            for ancestor in cache.ancestors(id) {
                if !ancestors.contains(&ancestor) {
                    ancestors.push(ancestor);
                }
            }
        }

        let branches = VisibleBranches::from_ids(match_ids.iter().chain(ancestors.iter()).copied());
        let pins: HashSet<usize> = ancestors
            .iter()
            .filter_map(|&id| cache.position_of(id))
            .collect();

        tracing::debug!(
            target: targets::TREE,
            matches = match_ids.len(),
            ancestors = ancestors.len(),
            "revealing ancestors of search matches"
        );
        self.filtered = true;
        TreePlan::Reveal { branches, pins }
    }
}
