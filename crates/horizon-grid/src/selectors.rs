//! Class names, attribute names and sentinel values shared between the table
//! markup and the engine.
//!
//! Markup declares column behavior through class lists and data attributes;
//! [`crate::markup`] reads them once at ingestion and nothing downstream looks
//! at these strings again, with the exception of the filter sentinels that are
//! part of the persisted state format.

use std::time::Duration;

/// Header and footer class names.
pub mod classes {
    /// Column has no filter control.
    pub const NON_FILTERABLE: &str = "non-filterable";
    /// Column cannot be sorted.
    pub const NON_ORDERABLE: &str = "non-orderable";
    /// Search text replaces tags with `|` instead of dropping them.
    pub const PROCESSED_HTML_FILTER_COLUMN: &str = "processed-html-filter-column";
    /// Filter narrows the view without revealing tree ancestors.
    pub const VIEW_PREFILTER: &str = "view-prefilter";
    /// Multi-select filter on raw cell values.
    pub const SELECT_FILTER: &str = "select-filter";
    /// Multi-select filter on tag-stripped cell text.
    pub const SELECT_FILTER_HTML_ESCAPE: &str = "select-filter-html-escape";
    /// Multi-select filter on icon cells.
    pub const SELECT_ICON_FILTER: &str = "select-filter-icon";
    /// Tri-state checkbox filter.
    pub const SELECT_BOOLEAN_CHECKBOX_FILTER: &str = "select-filter-boolean-checkbox";
    /// Split html-escaped filter options at `", "`.
    pub const COMMA_SEPARATED: &str = "comma-separated";
    /// Offer an option matching blank cells.
    pub const ADD_EMPTY_FILTER_VALUE: &str = "add-empty-filter-value";
    /// Right-aligned numeric column.
    pub const NUMBER_COLUMN: &str = "number-column";
    /// Sort with the any-number comparison.
    pub const NUMERIC_SORT: &str = "numeric-sort";
    /// Cell carries `f-id`, `parent-id` and `hierarchy-level`; text is the parent id.
    pub const HIERARCHY_DATA: &str = "hierarchy-data-parent-id";
    /// Cell text is the hierarchy level.
    pub const HIERARCHY_LEVEL: &str = "hierarchy-level";
    /// Cell shows the ancestor path of the row.
    pub const BREADCRUMBS: &str = "breadcrumbs";
    /// Column is always collapsed into the responsive details.
    pub const RESPONSIVE_NONE: &str = "none";
    /// Column is never shown.
    pub const NEVER: &str = "never";
    /// Responsive control column.
    pub const CONTROL: &str = "control";
    /// Column cannot be toggled from the visibility menu.
    pub const COLVIS_INACTIVE: &str = "colvis-inactive";
    /// Column starts hidden.
    pub const COLVIS_DESELECTED: &str = "colvis-deselected";
    /// Menu entry for a responsive sub column.
    pub const COLVIS_SUB_COLUMN: &str = "colvis-sub-column";
    /// Menu entry for a column with an active filter.
    pub const COLVIS_FILTERED: &str = "colvis-filtered";
    /// Row has child rows.
    pub const ROW_HAS_CHILDREN: &str = "has-children";
    /// Row branch is expanded.
    pub const ROW_CHILDREN_VISIBLE: &str = "visible-children";
    /// Sum the column as a plain number in the results row.
    pub const NUMBER_RESULT_COLUMN: &str = "number-result-column";
    /// Sum the column as a currency amount in the results row.
    pub const CURRENCY_RESULT_COLUMN: &str = "currency-result-column";
    /// Results row title cell.
    pub const RESULT_TITLE_COLUMN: &str = "result-title-column";
    /// Table renders as a tree.
    pub const TREE_TABLE: &str = "tree-table";
    /// Table has no rows.
    pub const DATATABLE_EMPTY: &str = "datatable-empty";
    /// Table content is stale and should be refreshed.
    pub const TABLE_DIRTY: &str = "table-dirty";
}

/// Data attribute names.
pub mod attrs {
    /// Stable column key on a header cell.
    pub const KEY: &str = "data-key";
    /// Row id on the hierarchy data cell.
    pub const F_ID: &str = "f-id";
    /// Parent row id on the hierarchy data cell.
    pub const PARENT_ID: &str = "parent-id";
    /// Hierarchy depth on the hierarchy data cell.
    pub const HIERARCHY_LEVEL: &str = "hierarchy-level";
    /// Sort value overriding cell content.
    pub const DATA_SORT: &str = "data-sort";
    /// Search value overriding cell content; `|`-separated for filter options.
    pub const DATA_SEARCH: &str = "data-search";
    /// Tooltip of an icon.
    pub const TOOLTIP: &str = "data-tooltip";
    /// Table custom options JSON.
    pub const TABLE_CUSTOM_OPTIONS: &str = "datatable-custom-options";
    /// Column custom options JSON.
    pub const COLUMN_CUSTOM_OPTIONS: &str = "custom-options";
    /// Table offers a refresh button.
    pub const SHOW_REFRESH_BUTTON: &str = "show-refresh-button";
    /// Text filter applied when no persisted state exists.
    pub const PRESET_FILTER: &str = "presetfilter-value";
    /// Target position of a column in tree view.
    pub const TREE_ORDER_REF: &str = "tree-order-ref";
}

/// Filter option values with special meaning.
pub mod sentinels {
    /// Option key that matches blank cells.
    pub const EMPTY_OPTION: &str = "^$";
    /// Persisted icon filter value that clears the filter.
    pub const ICON_RESET: &str = "ts-reset";
    /// Checkbox filter value for unchecked rows.
    pub const CHECKBOX_UNCHECKED: &str = "check_box_outline_blank";
    /// Checkbox filter value for checked rows.
    pub const CHECKBOX_CHECKED: &str = "check";
    /// Display text of the blank icon option.
    pub const EMPTY_ICON: &str = "crop_free";
}

/// Quiet period before a view-state change is written.
pub const STATE_WRITE_TIMEOUT: Duration = Duration::from_millis(300);

/// Quiet period before a viewport resize recomputes the layout.
pub const LAYOUT_RECOMPUTE_TIMEOUT: Duration = Duration::from_millis(200);

/// Prefix of the local fallback store key.
pub const STATE_KEY_PREFIX: &str = "DataTables_";

/// Default number of rows per page.
pub const DEFAULT_PAGE_LENGTH: usize = 10;

/// Default column width used by the responsive layout.
pub const DEFAULT_MIN_COLUMN_WIDTH: u32 = 100;
