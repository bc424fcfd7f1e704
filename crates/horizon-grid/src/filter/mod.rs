//! Column filters.
//!
//! Every filterable column gets a [`FilterControl`] built from its cells. A
//! control turns the user's selection into a [`ColumnSearch`] for the engine
//! and keeps the selection itself, so the value survives reorders and
//! visibility changes and can be persisted in a readable form.

mod control;
mod expression;
mod kind;
mod restore;

pub use control::{EMPTY_OPTION_LABEL, FilterControl, FilterOption, NO_SELECTION_LABEL};
pub use expression::IconEnvelope;
pub use kind::{CheckboxState, FilterValue};
pub use restore::restore_filters;

use horizon_grid_core::logging::targets;

use crate::error::{GridError, Result};
use crate::model::{ColumnSearch, FilterKind, ResponsiveClass, TableData};

/// The filter controls of one table, indexed by original column.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    controls: Vec<Option<FilterControl>>,
}

impl FilterSet {
    /// Build a control for every filterable column.
    pub fn build(data: &TableData) -> Self {
        Self {
            controls: data
                .columns()
                .iter()
                .map(|column| FilterControl::build(column, data))
                .collect(),
        }
    }

    /// Rebuild options from new data, keeping selections whose options still exist.
    pub fn rebuild(&mut self, data: &TableData) -> Vec<(usize, Option<ColumnSearch>)> {
        let previous = std::mem::replace(self, Self::build(data));
        let mut searches = Vec::new();
        for old in previous.controls.into_iter().flatten() {
            if !old.is_active() {
                continue;
            }
            let column = old.column();
            match self.control_mut(column) {
                Some(control) if control.kind() == old.kind() => {
                    match control.apply_change(old.value().clone()) {
                        Ok(search) => searches.push((column, search)),
                        Err(err) => tracing::warn!(target: targets::FILTER, column, error = %err, "filter dropped on rebuild"),
                    }
                }
                _ => searches.push((column, None)),
            }
        }
        searches
    }

    pub fn control(&self, column: usize) -> Option<&FilterControl> {
        self.controls.get(column)?.as_ref()
    }

    pub fn control_mut(&mut self, column: usize) -> Option<&mut FilterControl> {
        self.controls.get_mut(column)?.as_mut()
    }

    pub fn controls(&self) -> impl Iterator<Item = &FilterControl> {
        self.controls.iter().flatten()
    }

    /// Apply a new value to a column's filter.
    pub fn apply(&mut self, column: usize, value: FilterValue) -> Result<Option<ColumnSearch>> {
        self.control_mut(column)
            .ok_or_else(|| GridError::unknown_column(column))?
            .apply_change(value)
    }

    /// Columns whose filter holds a value.
    pub fn active_columns(&self) -> Vec<usize> {
        self.controls()
            .filter(|c| c.is_active())
            .map(|c| c.column())
            .collect()
    }

    pub fn is_active(&self, column: usize) -> bool {
        self.control(column).is_some_and(|c| c.is_active())
    }

    /// Clear every filter except those on always-hidden and never-shown
    /// columns. Returns the cleared columns.
    pub fn clear_all(&mut self, data: &TableData) -> Vec<usize> {
        let mut cleared = Vec::new();
        for control in self.controls.iter_mut().flatten() {
            let hidden = data.column(control.column()).is_some_and(|c| {
                matches!(c.responsive, ResponsiveClass::AlwaysHidden | ResponsiveClass::Never)
            });
            if !hidden {
                control.clear();
                cleared.push(control.column());
            }
        }
        tracing::debug!(target: targets::FILTER, count = cleared.len(), "column filters cleared");
        cleared
    }

    /// Apply preset values to text filters. Returns the resulting searches.
    pub fn apply_presets(&mut self, data: &TableData) -> Vec<(usize, ColumnSearch)> {
        let mut searches = Vec::new();
        for column in data.columns() {
            let Some(preset) = column.preset_filter.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            let Some(control) = self.control_mut(column.original_index) else {
                continue;
            };
            if control.kind() != FilterKind::Text {
                tracing::debug!(target: targets::FILTER, column = column.original_index, "preset ignored on select filter");
                continue;
            }
            if let Ok(Some(search)) = control.apply_change(FilterValue::Text(preset.to_string())) {
                searches.push((column.original_index, search));
            }
        }
        searches
    }

    /// Stored filter values aligned with `order`.
    ///
    /// Values of always-hidden and never-shown columns are not stored.
    pub fn snapshot(&self, order: &[usize], data: &TableData) -> Vec<String> {
        order
            .iter()
            .map(|&column| {
                let hidden = data.column(column).is_some_and(|c| {
                    matches!(c.responsive, ResponsiveClass::AlwaysHidden | ResponsiveClass::Never)
                });
                match self.control(column) {
                    Some(control) if !hidden => control.value().serialize(),
                    _ => String::new(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Row};

    fn create_test_data() -> TableData {
        let mut name = Column::new("name", 0);
        name.preset_filter = Some("an".into());
        let mut city = Column::new("city", 1).with_filter(FilterKind::MultiSelect);
        city.preset_filter = Some("Berlin".into());
        TableData::new(
            vec![
                name,
                city,
                Column::new("secret", 2).with_responsive(ResponsiveClass::Never),
                Column::new("id", 3).with_filter(FilterKind::None),
            ],
            vec![
                Row::new(1, vec!["Anna".into(), "Berlin".into(), "x".into(), "1".into()]),
                Row::new(2, vec!["Ben".into(), "Köln".into(), "y".into(), "2".into()]),
            ],
        )
    }

    #[test]
    fn test_build_skips_unfilterable() {
        let filters = FilterSet::build(&create_test_data());
        assert_eq!(filters.controls().count(), 3);
        assert!(filters.control(3).is_none());
    }

    #[test]
    fn test_presets_apply_to_text_only() {
        let data = create_test_data();
        let mut filters = FilterSet::build(&data);
        let searches = filters.apply_presets(&data);
        assert_eq!(searches, vec![(0, ColumnSearch::text("an"))]);
        assert_eq!(filters.active_columns(), vec![0]);
    }

    #[test]
    fn test_snapshot_skips_hidden_columns() {
        let data = create_test_data();
        let mut filters = FilterSet::build(&data);
        filters.apply(1, FilterValue::Selection(vec!["Köln".into()])).unwrap();
        filters.apply(2, FilterValue::Text("x".into())).unwrap();
        assert_eq!(
            filters.snapshot(&[1, 0, 2, 3], &data),
            vec!["Köln".to_string(), String::new(), String::new(), String::new()]
        );
    }

    #[test]
    fn test_clear_all_keeps_hidden_columns() {
        let data = create_test_data();
        let mut filters = FilterSet::build(&data);
        filters.apply(0, FilterValue::Text("a".into())).unwrap();
        filters.apply(2, FilterValue::Text("x".into())).unwrap();
        assert_eq!(filters.clear_all(&data), vec![0, 1]);
        assert_eq!(filters.active_columns(), vec![2]);
    }

    #[test]
    fn test_apply_unknown_column() {
        let mut filters = FilterSet::build(&create_test_data());
        assert!(matches!(
            filters.apply(3, FilterValue::Text("1".into())),
            Err(GridError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_rebuild_keeps_selection() {
        let data = create_test_data();
        let mut filters = FilterSet::build(&data);
        filters.apply(1, FilterValue::Selection(vec!["Köln".into()])).unwrap();
        let searches = filters.rebuild(&data);
        assert_eq!(searches.len(), 1);
        assert!(filters.is_active(1));
    }
}
