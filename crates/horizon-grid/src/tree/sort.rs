//! Hierarchical ordering.
//!
//! Rows are ordered as a depth-first walk of the tree where siblings are
//! ordered by the sort column. Comparing two rows that are not siblings walks
//! the deeper one up until both sit under the same parent.

use std::cmp::Ordering;
use std::sync::Arc;

use horizon_grid_core::logging::targets;

use super::HierarchyCache;
use crate::model::{RowComparator, SortSpec, TableData, text};

/// Compare the rows at positions `a` and `b` in tree order.
///
/// Siblings compare on the sort column (any-number parse for numeric
/// columns, folded text otherwise) with the row id as tie break. A row
/// compares before its own descendants when ascending and after them when
/// descending. Rows unknown to `cache` compare equal.
pub fn recursive_tree_sort(
    data: &TableData,
    cache: &HierarchyCache,
    a: usize,
    b: usize,
    spec: &SortSpec,
) -> Ordering {
    let mut a = a;
    let mut b = b;
    // Each step moves at least one side up a level.
    let max_steps = 2 * data.row_count() + 2;

    for _ in 0..max_steps {
        if a == b {
            return Ordering::Equal;
        }
        let (Some(info_a), Some(info_b)) = (cache.info_at(a), cache.info_at(b)) else {
            return Ordering::Equal;
        };

        if info_a.parent_id == info_b.parent_id {
            let ordering = compare_siblings(data, a, b, spec.column);
            let ordering = if ordering == Ordering::Equal {
                let id_a = cache.id_at(a).unwrap_or_default();
                let id_b = cache.id_at(b).unwrap_or_default();
                id_a.cmp(&id_b)
            } else {
                ordering
            };
            return spec.direction.apply(ordering);
        }

        if info_a.level < info_b.level {
            let Some(parent_b) = cache.position_of(info_b.parent_id) else {
                return Ordering::Equal;
            };
            if parent_b == a {
                return spec.direction.apply(Ordering::Less);
            }
            b = parent_b;
        } else if info_b.level < info_a.level {
            let Some(parent_a) = cache.position_of(info_a.parent_id) else {
                return Ordering::Equal;
            };
            if parent_a == b {
                return spec.direction.apply(Ordering::Greater);
            }
            a = parent_a;
        } else {
            match (
                cache.position_of(info_a.parent_id),
                cache.position_of(info_b.parent_id),
            ) {
                (Some(parent_a), Some(parent_b)) => {
                    a = parent_a;
                    b = parent_b;
                }
                _ => return Ordering::Equal,
            }
        }
    }

    tracing::warn!(target: targets::TREE, a, b, "tree comparison did not converge");
    Ordering::Equal
}

fn compare_siblings(data: &TableData, a: usize, b: usize, column: usize) -> Ordering {
    let value = |row: usize| {
        data.row(row)
            .and_then(|r| r.cell(column))
            .map(|c| c.sort_value())
            .unwrap_or("")
    };
    if data.column(column).is_some_and(|c| c.numeric) {
        text::compare_any_number(value(a), value(b))
    } else {
        text::compare_cell_values(value(a), value(b))
    }
}

/// A [`RowComparator`] ordering rows by [`recursive_tree_sort`].
pub fn tree_comparator(cache: Arc<HierarchyCache>) -> RowComparator {
    Arc::new(move |data, a, b, spec| recursive_tree_sort(data, &cache, a, b, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, GridEngine, HierarchyRole, Row, RowId, SortDirection};

    fn create_test_data() -> TableData {
        let row = |id: i64, parent: i64, level: u32, name: &str, amount: &str| {
            Row::new(id, vec!["".into(), name.into(), amount.into()]).with_parent(parent, level)
        };
        TableData::new(
            vec![
                Column::new("tree", 0).with_hierarchy(HierarchyRole::Key),
                Column::new("name", 1),
                Column::new("amount", 2).numeric(),
            ],
            vec![
                row(1, 0, 0, "Übel", "3"),
                row(2, 1, 1, "öl", "1.000,5"),
                row(3, 0, 0, "Apfel", "20"),
                row(4, 1, 1, "Apfel", "2"),
                row(5, 2, 2, "Zeder", "x"),
                row(6, 3, 1, "Birne", "7"),
            ],
        )
    }

    fn sorted_ids(data: &TableData, column: usize, direction: SortDirection) -> Vec<i64> {
        let cache = HierarchyCache::build(data);
        let spec = SortSpec { column, direction };
        let mut positions: Vec<usize> = (0..data.row_count()).collect();
        positions.sort_by(|&a, &b| recursive_tree_sort(data, &cache, a, b, &spec));
        positions
            .into_iter()
            .map(|p| data.row(p).map(|r| r.id.0).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_children_follow_their_parent() {
        let data = create_test_data();
        assert_eq!(
            sorted_ids(&data, 1, SortDirection::Ascending),
            vec![3, 6, 1, 4, 2, 5]
        );
    }

    #[test]
    fn test_descending_reverses_tree_order() {
        let data = create_test_data();
        let mut ascending = sorted_ids(&data, 1, SortDirection::Ascending);
        ascending.reverse();
        assert_eq!(sorted_ids(&data, 1, SortDirection::Descending), ascending);
    }

    #[test]
    fn test_numeric_column_uses_any_number() {
        let data = create_test_data();
        assert_eq!(
            sorted_ids(&data, 2, SortDirection::Ascending),
            vec![1, 4, 2, 5, 3, 6]
        );
    }

    #[test]
    fn test_ties_break_on_row_id() {
        let data = TableData::new(
            vec![
                Column::new("tree", 0).with_hierarchy(HierarchyRole::Key),
                Column::new("name", 1),
            ],
            vec![
                Row::new(9, vec!["".into(), "same".into()]),
                Row::new(4, vec!["".into(), "same".into()]),
            ],
        );
        assert_eq!(sorted_ids(&data, 1, SortDirection::Ascending), vec![4, 9]);
    }

    #[test]
    fn test_tree_comparator_in_engine() {
        let data = create_test_data();
        let cache = Arc::new(HierarchyCache::build(&data));
        let mut engine = GridEngine::new(data);
        engine.set_comparator(Some(tree_comparator(cache.clone())));
        engine.set_sort(Some(SortSpec {
            column: 1,
            direction: SortDirection::Ascending,
        }));
        engine.draw();
        let first = engine.displayed_rows()[0];
        assert_eq!(cache.id_at(first), Some(RowId(3)));
    }
}
