//! Parent/child structure emulated on top of the flat grid.
//!
//! Rows carry their own id, their parent's id and their depth. Visibility is
//! driven by a structural search on the hierarchy key column: a row is shown
//! iff its parent id is one of the expanded branches. Ordering uses
//! [`recursive_tree_sort`] so children always follow their parent.

mod branches;
mod cache;
mod search;
mod sort;

pub use branches::{Toggle, VisibleBranches};
pub use cache::{HierarchyCache, RowInfo};
pub use search::{SearchPhase, TreePlan, TreeSearch};
pub use sort::{recursive_tree_sort, tree_comparator};
