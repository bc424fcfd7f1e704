//! Filter controls: the options a column offers and the value selected.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use horizon_grid_core::logging::targets;

use super::expression::{self, IconEnvelope};
use super::kind::{CheckboxState, FilterValue};
use crate::error::{GridError, Result};
use crate::model::{Column, ColumnSearch, FilterKind, TableData, text};
use crate::selectors::sentinels;

/// Label of the option matching blank cells.
pub const EMPTY_OPTION_LABEL: &str = "(empty)";

/// Label of the checkbox option that clears the filter.
pub const NO_SELECTION_LABEL: &str = "(all)";

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    /// Identity of the option in a [`FilterValue::Selection`] and in the
    /// persisted state.
    pub key: String,
    pub label: String,
    pub tooltip: Option<String>,
    /// Submitted value of icon options.
    pub envelope: Option<IconEnvelope>,
}

impl FilterOption {
    fn plain(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            tooltip: None,
            envelope: None,
        }
    }

    fn empty() -> Self {
        Self {
            key: sentinels::EMPTY_OPTION.to_string(),
            label: EMPTY_OPTION_LABEL.to_string(),
            tooltip: None,
            envelope: None,
        }
    }
}

/// The filter of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    column: usize,
    kind: FilterKind,
    options: Vec<FilterOption>,
    value: FilterValue,
}

impl FilterControl {
    /// Build the control for `column`, deriving options from the cells.
    /// Non-filterable columns get none.
    pub fn build(column: &Column, data: &TableData) -> Option<Self> {
        let index = column.original_index;
        let options = match column.filter_kind {
            FilterKind::None => return None,
            FilterKind::Text => Vec::new(),
            FilterKind::MultiSelect => multi_select_options(index, data),
            FilterKind::MultiSelectHtmlEscaped => html_escaped_options(column, data),
            FilterKind::MultiSelectIcon => icon_options(column, data),
            FilterKind::BooleanCheckbox => checkbox_options(),
        };
        tracing::trace!(target: targets::FILTER, column = index, kind = ?column.filter_kind, options = options.len(), "filter control built");
        Some(Self {
            column: index,
            kind: column.filter_kind,
            options,
            value: FilterValue::empty_for(column.filter_kind),
        })
    }

    /// Original index of the filtered column.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&FilterOption> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }

    /// Selected labels joined for display.
    pub fn display_text(&self) -> String {
        match &self.value {
            FilterValue::Selection(keys) => keys
                .iter()
                .map(|k| self.option(k).map(|o| o.label.as_str()).unwrap_or(k.as_str()))
                .collect::<Vec<_>>()
                .join(", "),
            other => other.serialize(),
        }
    }

    /// Replace the value and return the search expression to apply.
    ///
    /// Selected keys that no option carries are dropped with a warning.
    pub fn apply_change(&mut self, value: FilterValue) -> Result<Option<ColumnSearch>> {
        let value = match (self.kind, value) {
            (FilterKind::Text, FilterValue::Text(input)) => FilterValue::Text(input),
            (FilterKind::BooleanCheckbox, FilterValue::Checkbox(state)) => FilterValue::Checkbox(state),
            (kind, FilterValue::Selection(keys)) if kind.is_multi_select() => {
                FilterValue::Selection(self.known_keys(keys))
            }
            (kind, _) => return Err(GridError::filter_mismatch(self.column, kind)),
        };
        self.value = value;
        Ok(self.search())
    }

    fn known_keys(&self, keys: Vec<String>) -> Vec<String> {
        let mut known = Vec::with_capacity(keys.len());
        for key in keys {
            if known.contains(&key) {
                continue;
            }
            if self.option(&key).is_some() {
                known.push(key);
            } else {
                tracing::warn!(target: targets::FILTER, column = self.column, key = %key, "unknown filter option dropped");
            }
        }
        known
    }

    /// Search expression for the current value.
    pub fn search(&self) -> Option<ColumnSearch> {
        match (&self.value, self.kind) {
            (FilterValue::Text(input), _) => expression::text(input),
            (FilterValue::Checkbox(state), _) => expression::checkbox(state.as_key()),
            (FilterValue::Selection(keys), FilterKind::MultiSelectHtmlEscaped) => {
                expression::html_escaped(keys)
            }
            (FilterValue::Selection(keys), FilterKind::MultiSelectIcon) => {
                let envelopes: Vec<IconEnvelope> = keys
                    .iter()
                    .filter_map(|k| self.option(k).and_then(|o| o.envelope.clone()))
                    .collect();
                expression::icon(&envelopes)
            }
            (FilterValue::Selection(keys), _) => expression::multi_select(keys),
        }
    }

    /// Reset to the unset value.
    pub fn clear(&mut self) {
        self.value = FilterValue::empty_for(self.kind);
    }
}

fn unique_sorted(values: impl IntoIterator<Item = String>) -> Vec<String> {
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn multi_select_options(column: usize, data: &TableData) -> Vec<FilterOption> {
    unique_sorted((0..data.row_count()).map(|row| data.search_text(row, column)))
        .into_iter()
        .map(|value| {
            if value.is_empty() {
                FilterOption::empty()
            } else {
                FilterOption::plain(value)
            }
        })
        .collect()
}

fn html_escaped_options(column: &Column, data: &TableData) -> Vec<FilterOption> {
    let index = column.original_index;
    let cells: Vec<_> = data.rows().iter().filter_map(|r| r.cell(index)).collect();

    let mut values: Vec<String> = match cells.first() {
        Some(first) if first.search.is_some() => {
            let mut values = Vec::new();
            for cell in &cells {
                for part in cell.search.as_deref().unwrap_or("").split('|') {
                    if !values.iter().any(|v| v == part) {
                        values.push(part.to_string());
                    }
                }
            }
            values.sort();
            values
        }
        Some(first) if first.sort.is_some() => {
            let mut pairs: Vec<(String, f64)> = Vec::new();
            for cell in &cells {
                let value = text::strip_tags(&cell.html).trim().to_string();
                if !pairs.iter().any(|(v, _)| *v == value) {
                    let rank = cell.sort.as_deref().unwrap_or("").trim().parse().unwrap_or(f64::NAN);
                    pairs.push((value, rank));
                }
            }
            pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            pairs.into_iter().map(|(v, _)| v).collect()
        }
        _ => {
            let mut values: Vec<String> = Vec::new();
            for html in unique_sorted(cells.iter().map(|c| c.html.clone())) {
                let cleaned = text::strip_icon_tags(&text::strip_line_breaks(&html));
                let mut parts = text::split_at_tags(&cleaned);
                if column.comma_separated {
                    parts = parts.join(", ").split(", ").map(str::to_string).collect();
                }
                collect_fragments(&mut values, &parts);
            }
            values.sort();
            values
        }
    };

    if column.add_empty_option && !values.iter().any(String::is_empty) {
        values.insert(0, String::new());
    }

    values
        .into_iter()
        .map(|value| {
            if value.is_empty() {
                FilterOption::empty()
            } else {
                FilterOption::plain(value)
            }
        })
        .collect()
}

/// Add the trimmed non-empty fragments of one cell; a blank cell adds `""`.
fn collect_fragments(values: &mut Vec<String>, parts: &[String]) {
    if parts.len() == 1 && parts[0].is_empty() {
        if !values.iter().any(String::is_empty) {
            values.push(String::new());
        }
        return;
    }
    for part in parts {
        let part = part.trim();
        if !part.is_empty() && !values.iter().any(|v| v == part) {
            values.push(part.to_string());
        }
    }
}

fn icon_options(column: &Column, data: &TableData) -> Vec<FilterOption> {
    let index = column.original_index;
    let mut options: Vec<FilterOption> = Vec::new();

    let cells = unique_sorted(data.rows().iter().filter_map(|r| r.cell(index)).map(|c| c.html.clone()));
    for html in cells {
        let icon = text::strip_tags(&html).trim().to_string();
        if icon.is_empty() || options.iter().any(|o| o.key == icon) {
            continue;
        }
        let tooltip = text::tooltip_of(&html);
        options.push(FilterOption {
            label: tooltip.clone().unwrap_or_else(|| icon.clone()),
            envelope: Some(IconEnvelope::for_icon(&icon, tooltip.clone())),
            key: icon,
            tooltip,
        });
    }
    options.sort_by(|a, b| a.key.cmp(&b.key));

    if column.add_empty_option {
        options.insert(
            0,
            FilterOption {
                key: sentinels::EMPTY_ICON.to_string(),
                label: EMPTY_OPTION_LABEL.to_string(),
                tooltip: Some(EMPTY_OPTION_LABEL.to_string()),
                envelope: Some(IconEnvelope::empty(Some(EMPTY_OPTION_LABEL.to_string()))),
            },
        );
    }
    options
}

fn checkbox_options() -> Vec<FilterOption> {
    [
        CheckboxState::Unset,
        CheckboxState::Unchecked,
        CheckboxState::Checked,
    ]
    .into_iter()
    .map(|state| {
        let mut option = FilterOption::plain(state.as_key());
        if state == CheckboxState::Unset {
            option.label = NO_SELECTION_LABEL.to_string();
        }
        option
    })
    .collect()
}
