//! Replaying persisted filter values onto the live controls.

use horizon_grid_core::logging::targets;

use super::{FilterSet, FilterValue};
use crate::model::{ColumnSearch, FilterKind};
use crate::selectors::sentinels;

/// Restore filter values saved under `saved_order`.
///
/// `saved_values[k]` belongs to the column that sat at position `k` when the
/// state was written, i.e. original column `saved_order[k]`; an empty
/// `saved_order` means markup order. That column is looked up in
/// `live_order` and its control replays the value. Returns the searches to
/// apply, keyed by original column index.
pub fn restore_filters(
    filters: &mut FilterSet,
    saved_order: &[usize],
    saved_values: &[String],
    live_order: &[usize],
) -> Vec<(usize, Option<ColumnSearch>)> {
    let mut searches = Vec::new();

    for (position, stored) in saved_values.iter().enumerate() {
        if stored.trim().is_empty() {
            continue;
        }
        let column = if saved_order.is_empty() {
            position
        } else {
            match saved_order.get(position) {
                Some(&column) => column,
                None => {
                    tracing::warn!(target: targets::FILTER, position, "saved filter has no column in saved order, skipping");
                    continue;
                }
            }
        };
        if !live_order.contains(&column) {
            tracing::warn!(target: targets::FILTER, column, "saved filter column no longer exists, skipping");
            continue;
        }
        let Some(control) = filters.control_mut(column) else {
            tracing::debug!(target: targets::FILTER, column, "saved filter on unfilterable column ignored");
            continue;
        };

        if control.kind() == FilterKind::MultiSelectIcon && stored.trim() == sentinels::ICON_RESET {
            control.clear();
            searches.push((column, None));
            continue;
        }

        let value = FilterValue::parse(control.kind(), stored);
        match control.apply_change(value) {
            Ok(search) => {
                tracing::debug!(target: targets::FILTER, column, value = %stored, "filter restored");
                searches.push((column, search));
            }
            Err(err) => {
                tracing::warn!(target: targets::FILTER, column, error = %err, "could not restore filter");
            }
        }
    }
    searches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Row, TableData};

    fn create_test_filters() -> FilterSet {
        let data = TableData::new(
            vec![
                Column::new("name", 0),
                Column::new("city", 1).with_filter(FilterKind::MultiSelect),
                Column::new("status", 2).with_filter(FilterKind::MultiSelectIcon),
            ],
            vec![
                Row::new(1, vec!["Anna".into(), "Berlin".into(), "<i>lock</i>".into()]),
                Row::new(2, vec!["Ben".into(), "Köln".into(), "<i>check</i>".into()]),
            ],
        );
        FilterSet::build(&data)
    }

    #[test]
    fn test_restore_follows_saved_order() {
        let mut filters = create_test_filters();
        // Saved while the order was [1, 0, 2]: position 0 held the city column.
        let values = vec!["Köln, Berlin".to_string(), "an".to_string(), String::new()];
        let searches = restore_filters(&mut filters, &[1, 0, 2], &values, &[0, 1, 2]);

        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].0, 1);
        assert_eq!(
            searches[0].1.as_ref().map(|s| s.pattern.as_str()),
            Some("^Köln$|^Berlin$")
        );
        assert_eq!(searches[1], (0, Some(ColumnSearch::text("an"))));
        assert_eq!(
            filters.control(1).map(|c| c.value().clone()),
            Some(FilterValue::Selection(vec!["Köln".into(), "Berlin".into()]))
        );
    }

    #[test]
    fn test_icon_reset_clears() {
        let mut filters = create_test_filters();
        restore_filters(&mut filters, &[], &[String::new(), String::new(), "lock".into()], &[0, 1, 2]);
        assert!(filters.control(2).is_some_and(|c| c.is_active()));

        let searches = restore_filters(&mut filters, &[], &[String::new(), String::new(), "ts-reset".into()], &[0, 1, 2]);
        assert_eq!(searches, vec![(2, None)]);
        assert!(!filters.control(2).is_some_and(|c| c.is_active()));
    }

    #[test]
    fn test_unresolvable_columns_are_skipped() {
        let mut filters = create_test_filters();
        let searches = restore_filters(&mut filters, &[7], &["x".into(), "y".into()], &[0, 1, 2]);
        assert!(searches.is_empty());
    }
}
