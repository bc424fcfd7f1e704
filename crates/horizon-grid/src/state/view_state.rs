//! The persisted view of a table.

use horizon_grid_core::logging::targets;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GridError, Result};
use crate::model::{RowId, SortDirection, SortSpec};
use crate::tree::VisibleBranches;

/// Everything about a table's presentation that survives a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Expanded branches, always containing the root.
    pub visible_row_parent_ids: VisibleBranches,
    /// Display order: `column_order[position]` is an original column index.
    /// Empty until the first save.
    pub column_order: Vec<usize>,
    /// Serialized filter values aligned with `column_order`.
    pub column_filter_values: Vec<String>,
    pub search_field_visible: bool,
    pub column_filters_visible: bool,
    pub page: usize,
    pub page_length: Option<usize>,
    pub sort: Option<SortSpec>,
    pub global_search: String,
    /// Original indices of columns hidden through the visibility menu.
    pub hidden_columns: Vec<usize>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            visible_row_parent_ids: VisibleBranches::new(),
            column_order: Vec::new(),
            column_filter_values: Vec::new(),
            search_field_visible: true,
            column_filters_visible: true,
            page: 0,
            page_length: None,
            sort: None,
            global_search: String::new(),
            hidden_columns: Vec::new(),
        }
    }
}

impl ViewState {
    /// Serialize to the persisted JSON shape.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&PersistedState::from(self)).map_err(|e| GridError::state("<view state>", e))
    }

    /// Parse the persisted JSON shape. Missing fields take their defaults.
    pub fn from_json(key: &str, json: &str) -> Result<Self> {
        let persisted: PersistedState = serde_json::from_str(json).map_err(|e| GridError::state(key, e))?;
        Ok(persisted.into())
    }
}

/// One `columnFilterState` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStateEntry {
    #[serde(default)]
    pub val: String,
}

/// Sort as persisted: column index and `"asc"`/`"desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSort {
    pub column: usize,
    pub dir: PersistedDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistedDirection {
    Asc,
    Desc,
}

fn default_root() -> Vec<RowId> {
    vec![RowId::ROOT]
}

fn default_true() -> bool {
    true
}

/// Reads a field, falling back to `fallback` when its value has the wrong
/// shape. One broken field does not discard the rest of the state.
fn lenient_or<'de, D, T>(deserializer: D, fallback: fn() -> T) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        tracing::warn!(target: targets::STATE, error = %err, "resetting malformed view state field");
        fallback()
    }))
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    lenient_or(deserializer, T::default)
}

fn lenient_root<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<RowId>, D::Error> {
    lenient_or(deserializer, default_root)
}

fn lenient_true<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    lenient_or(deserializer, default_true)
}

/// The wire shape of a [`ViewState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, deserialize_with = "lenient")]
    pub column_order: Vec<usize>,
    #[serde(default, deserialize_with = "lenient")]
    pub column_filter_state: Vec<FilterStateEntry>,
    #[serde(default = "default_root", deserialize_with = "lenient_root")]
    pub visible_row_parent_ids: Vec<RowId>,
    #[serde(default = "default_true", deserialize_with = "lenient_true")]
    pub show_search_field: bool,
    #[serde(default = "default_true", deserialize_with = "lenient_true")]
    pub show_column_filters: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub page: usize,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub page_length: Option<usize>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub order: Option<PersistedSort>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub hidden_columns: Vec<usize>,
}

impl From<&ViewState> for PersistedState {
    fn from(state: &ViewState) -> Self {
        Self {
            column_order: state.column_order.clone(),
            column_filter_state: state
                .column_filter_values
                .iter()
                .map(|val| FilterStateEntry { val: val.clone() })
                .collect(),
            visible_row_parent_ids: state.visible_row_parent_ids.ids().to_vec(),
            show_search_field: state.search_field_visible,
            show_column_filters: state.column_filters_visible,
            page: state.page,
            page_length: state.page_length,
            order: state.sort.map(|sort| PersistedSort {
                column: sort.column,
                dir: if sort.direction.is_ascending() {
                    PersistedDirection::Asc
                } else {
                    PersistedDirection::Desc
                },
            }),
            search: state.global_search.clone(),
            hidden_columns: state.hidden_columns.clone(),
        }
    }
}

impl From<PersistedState> for ViewState {
    fn from(persisted: PersistedState) -> Self {
        Self {
            visible_row_parent_ids: VisibleBranches::from_ids(persisted.visible_row_parent_ids),
            column_order: persisted.column_order,
            column_filter_values: persisted.column_filter_state.into_iter().map(|e| e.val).collect(),
            search_field_visible: persisted.show_search_field,
            column_filters_visible: persisted.show_column_filters,
            page: persisted.page,
            page_length: persisted.page_length.filter(|&l| l > 0),
            sort: persisted.order.map(|sort| SortSpec {
                column: sort.column,
                direction: match sort.dir {
                    PersistedDirection::Asc => SortDirection::Ascending,
                    PersistedDirection::Desc => SortDirection::Descending,
                },
            }),
            global_search: persisted.search,
            hidden_columns: persisted.hidden_columns,
        }
    }
}
