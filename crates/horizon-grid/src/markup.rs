//! Table markup ingestion.
//!
//! [`TableMarkup`] is the typed form of a markup table: header, optional
//! filter footer and body cells, each with class lists and data attributes.
//! Hosts build it from whatever template layer they use (or deserialize it
//! from JSON) and hand it to [`TableData::from_markup`], which reads every
//! class and attribute once.

use std::collections::{HashMap, HashSet};

use horizon_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::model::{
    Cell, Column, FilterKind, HierarchyRole, ResponsiveClass, ResultRole, Row, RowId, TableData,
    text,
};
use crate::selectors::{attrs, classes};

/// Class list and data attributes of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Element {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn push_class(&mut self, class: &str) {
        self.classes.push(class.to_string());
    }
}

/// A header cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCell {
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub element: Element,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            element: Element::default(),
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.element.push_class(class);
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.element.attributes.insert(name.to_string(), value.into());
        self
    }
}

/// A footer (filter) cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterCell {
    #[serde(flatten)]
    pub element: Element,
}

impl FooterCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: &str) -> Self {
        self.element.push_class(class);
        self
    }
}

/// A body cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyCell {
    #[serde(default)]
    pub html: String,
    #[serde(flatten)]
    pub element: Element,
}

impl BodyCell {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            element: Element::default(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.element.attributes.insert(name.to_string(), value.into());
        self
    }

    /// A hierarchy data cell carrying row id, parent id and level.
    pub fn hierarchy(id: i64, parent: i64, level: u32) -> Self {
        Self::new(parent.to_string())
            .attr(attrs::F_ID, id.to_string())
            .attr(attrs::PARENT_ID, parent.to_string())
            .attr(attrs::HIERARCHY_LEVEL, level.to_string())
    }
}

impl From<&str> for BodyCell {
    fn from(html: &str) -> Self {
        BodyCell::new(html)
    }
}

/// A complete markup table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMarkup {
    #[serde(flatten)]
    pub element: Element,
    pub header: Vec<HeaderCell>,
    /// Filter row; absent when the table has no column filters.
    #[serde(default)]
    pub footer: Option<Vec<FooterCell>>,
    #[serde(default)]
    pub body: Vec<Vec<BodyCell>>,
}

impl TableMarkup {
    pub fn new(header: Vec<HeaderCell>) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.element.push_class(class);
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.element.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_footer(mut self, footer: Vec<FooterCell>) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn with_row(mut self, cells: Vec<BodyCell>) -> Self {
        self.body.push(cells);
        self
    }

    pub fn is_tree_table(&self) -> bool {
        self.element.has_class(classes::TREE_TABLE)
    }

    pub fn has_column_filters(&self) -> bool {
        self.footer.is_some()
    }

    pub fn show_refresh_button(&self) -> bool {
        self.element.attr(attrs::SHOW_REFRESH_BUTTON).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty() || self.element.has_class(classes::DATATABLE_EMPTY)
    }

    /// The table custom options JSON, if declared.
    pub fn custom_options(&self) -> Option<&str> {
        self.element.attr(attrs::TABLE_CUSTOM_OPTIONS)
    }

    /// Parse header, footer and body into typed columns and rows.
    pub fn to_table_data(&self) -> Result<TableData> {
        if self.header.is_empty() {
            return Err(GridError::markup("table has no header cells"));
        }
        if let Some(footer) = &self.footer {
            if footer.len() != self.header.len() {
                tracing::warn!(
                    target: targets::MARKUP,
                    header = self.header.len(),
                    footer = footer.len(),
                    "footer cell count does not match header"
                );
            }
        }

        let columns: Vec<Column> = self
            .header
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let footer = self.footer.as_ref().and_then(|f| f.get(index));
                parse_column(index, header, footer)
            })
            .collect();

        let key_column = columns.iter().position(|c| c.hierarchy == Some(HierarchyRole::Key));
        let explicit: Vec<Option<RowId>> = self
            .body
            .iter()
            .enumerate()
            .map(|(position, cells)| explicit_row_id(position, cells, key_column))
            .collect();
        let mut used: HashSet<RowId> = HashSet::new();
        for (position, id) in explicit.iter().enumerate() {
            if let Some(id) = id {
                if !used.insert(*id) {
                    tracing::warn!(target: targets::MARKUP, row = position, id = %id, "duplicate row id");
                }
            }
        }

        let mut next_free = 1;
        let rows = self
            .body
            .iter()
            .zip(explicit)
            .map(|(cells, explicit)| {
                let id = explicit.unwrap_or_else(|| {
                    while used.contains(&RowId(next_free)) {
                        next_free += 1;
                    }
                    used.insert(RowId(next_free));
                    RowId(next_free)
                });
                parse_row(id, cells, key_column)
            })
            .collect();

        Ok(TableData::new(columns, rows))
    }
}

impl TableData {
    /// Build table data from markup.
    pub fn from_markup(markup: &TableMarkup) -> Result<Self> {
        markup.to_table_data()
    }
}

/// Per-column options from the header's custom options JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ColumnOptions {
    min_width: Option<serde_json::Value>,
    preset_filter: Option<String>,
}

fn parse_width(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => {
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn parse_column(index: usize, header: &HeaderCell, footer: Option<&FooterCell>) -> Column {
    let h = &header.element;
    let key = h
        .attr(attrs::KEY)
        .map(str::to_string)
        .unwrap_or_else(|| format!("col_{index}"));
    let mut column = Column::new(key, index).with_title(text::strip_tags(&header.text).trim());

    column.filter_kind = footer
        .map(|f| FilterKind::from_classes(&f.element.classes))
        .unwrap_or(FilterKind::None);
    if h.has_class(classes::NON_FILTERABLE) {
        column.filter_kind = FilterKind::None;
    }

    let footer_has = |class: &str| footer.is_some_and(|f| f.element.has_class(class));
    column.comma_separated = footer_has(classes::COMMA_SEPARATED);
    column.add_empty_option = footer_has(classes::ADD_EMPTY_FILTER_VALUE);
    column.view_prefilter = footer_has(classes::VIEW_PREFILTER);

    column.processed_html = h.has_class(classes::PROCESSED_HTML_FILTER_COLUMN);
    column.numeric = h.has_class(classes::NUMBER_COLUMN) || h.has_class(classes::NUMERIC_SORT);
    column.colvis_inactive = h.has_class(classes::COLVIS_INACTIVE);

    column.hierarchy = if h.has_class(classes::HIERARCHY_DATA) {
        Some(HierarchyRole::Key)
    } else if h.has_class(classes::HIERARCHY_LEVEL) {
        Some(HierarchyRole::Level)
    } else if h.has_class(classes::BREADCRUMBS) {
        Some(HierarchyRole::Parent)
    } else {
        None
    };

    column.responsive = if h.has_class(classes::NEVER) {
        ResponsiveClass::Never
    } else if h.has_class(classes::CONTROL) {
        ResponsiveClass::Control
    } else if h.has_class(classes::RESPONSIVE_NONE) {
        ResponsiveClass::AlwaysHidden
    } else {
        ResponsiveClass::Auto
    };

    column.sortable = !h.has_class(classes::NON_ORDERABLE)
        && !matches!(column.responsive, ResponsiveClass::Never | ResponsiveClass::Control);
    column.visible = !h.has_class(classes::BREADCRUMBS) && !h.has_class(classes::COLVIS_DESELECTED);

    column.result = if h.has_class(classes::NUMBER_RESULT_COLUMN) {
        Some(ResultRole::Number)
    } else if h.has_class(classes::CURRENCY_RESULT_COLUMN) {
        Some(ResultRole::Currency)
    } else if h.has_class(classes::RESULT_TITLE_COLUMN) {
        Some(ResultRole::Title)
    } else {
        None
    };

    column.preset_filter = h.attr(attrs::PRESET_FILTER).map(str::to_string);
    column.tree_order_ref = h.attr(attrs::TREE_ORDER_REF).and_then(|v| match v.trim().parse() {
        Ok(position) => Some(position),
        Err(_) => {
            tracing::warn!(target: targets::MARKUP, column = index, value = v, "ignoring invalid tree order reference");
            None
        }
    });

    if let Some(json) = h.attr(attrs::COLUMN_CUSTOM_OPTIONS) {
        match serde_json::from_str::<ColumnOptions>(json) {
            Ok(options) => {
                column.min_width = options.min_width.as_ref().and_then(parse_width);
                if column.preset_filter.is_none() {
                    column.preset_filter = options.preset_filter;
                }
            }
            Err(err) => {
                tracing::warn!(target: targets::MARKUP, column = index, error = %err, "ignoring malformed column options");
            }
        }
    }

    column
}

/// The row's `f-id`, if it declares a valid one.
fn explicit_row_id(position: usize, cells: &[BodyCell], key_column: Option<usize>) -> Option<RowId> {
    let Some(key_column) = key_column else {
        return None;
    };
    let value = cells
        .get(key_column)
        .and_then(|cell| cell.element.attr(attrs::F_ID))
        .map(str::trim);
    match value {
        Some(value) => match value.parse::<i64>() {
            Ok(id) => Some(RowId(id)),
            Err(_) => {
                tracing::warn!(target: targets::MARKUP, row = position, value, "invalid row id, assigning one");
                None
            }
        },
        None => {
            tracing::warn!(target: targets::MARKUP, row = position, "row has no id, assigning one");
            None
        }
    }
}

fn parse_row(id: RowId, cells: &[BodyCell], key_column: Option<usize>) -> Row {
    let hierarchy = key_column.and_then(|k| cells.get(k)).map(|cell| &cell.element);
    let parse_attr = |name: &str| hierarchy.and_then(|e| e.attr(name)).map(str::trim);
    let parent: RowId = parse_attr(attrs::PARENT_ID)
        .and_then(|v| v.parse().ok())
        .unwrap_or(RowId::ROOT);
    let level: u32 = parse_attr(attrs::HIERARCHY_LEVEL)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let cells = cells
        .iter()
        .map(|cell| Cell {
            html: cell.html.clone(),
            sort: cell.element.attr(attrs::DATA_SORT).map(str::to_string),
            search: cell.element.attr(attrs::DATA_SEARCH).map(str::to_string),
        })
        .collect();

    Row::new(id, cells).with_parent(parent, level)
}
