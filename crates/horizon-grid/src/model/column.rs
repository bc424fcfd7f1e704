//! Column descriptions.

use crate::selectors::{DEFAULT_MIN_COLUMN_WIDTH, classes};

/// The filter control a column gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// No filter control.
    #[default]
    None,
    /// Free text input.
    Text,
    /// Multi-select over raw cell values, matched as whole values.
    MultiSelect,
    /// Multi-select over tag-stripped cell text fragments.
    MultiSelectHtmlEscaped,
    /// Multi-select over icon cells.
    MultiSelectIcon,
    /// Tri-state checkbox (unset, unchecked, checked).
    BooleanCheckbox,
}

impl FilterKind {
    /// Derive the kind from a filter cell's class list.
    ///
    /// More specific classes win: a cell carrying both `select-filter` and
    /// `select-filter-icon` is an icon filter.
    pub fn from_classes<S: AsRef<str>>(cell_classes: &[S]) -> Self {
        let has = |name: &str| cell_classes.iter().any(|c| c.as_ref() == name);
        if has(classes::NON_FILTERABLE) {
            FilterKind::None
        } else if has(classes::SELECT_BOOLEAN_CHECKBOX_FILTER) {
            FilterKind::BooleanCheckbox
        } else if has(classes::SELECT_ICON_FILTER) {
            FilterKind::MultiSelectIcon
        } else if has(classes::SELECT_FILTER_HTML_ESCAPE) {
            FilterKind::MultiSelectHtmlEscaped
        } else if has(classes::SELECT_FILTER) {
            FilterKind::MultiSelect
        } else {
            FilterKind::Text
        }
    }

    /// Whether the kind selects from a list of options.
    pub fn is_multi_select(self) -> bool {
        matches!(
            self,
            FilterKind::MultiSelect | FilterKind::MultiSelectHtmlEscaped | FilterKind::MultiSelectIcon
        )
    }
}

/// The part a column plays in the emulated tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyRole {
    /// Carries row id, parent id and level; searched for branch visibility.
    Key,
    /// Shows the hierarchy level.
    Level,
    /// Shows the parent path.
    Parent,
}

/// Responsive behavior of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsiveClass {
    /// Shown while it fits.
    #[default]
    Auto,
    /// Always collapsed into the details area.
    AlwaysHidden,
    /// Never shown.
    Never,
    /// The details toggle column.
    Control,
}

/// Aggregation shown for a column in the results row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultRole {
    /// Sum formatted as a number.
    Number,
    /// Sum formatted as a currency amount.
    Currency,
    /// Row title.
    Title,
}

/// A table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Stable semantic key.
    pub key: String,
    /// Position in the markup; the identity used by column order lists.
    pub original_index: usize,
    /// Header text.
    pub title: String,
    pub filter_kind: FilterKind,
    pub sortable: bool,
    pub visible: bool,
    /// Sort and compare with the any-number parse.
    pub numeric: bool,
    pub hierarchy: Option<HierarchyRole>,
    pub responsive: ResponsiveClass,
    /// Cannot be toggled from the visibility menu.
    pub colvis_inactive: bool,
    /// Html-escaped filter options are split at `", "`.
    pub comma_separated: bool,
    /// Filter offers an option matching blank cells.
    pub add_empty_option: bool,
    /// Search text keeps tag boundaries as `|`.
    pub processed_html: bool,
    /// Filter narrows the view and never triggers ancestor revelation.
    pub view_prefilter: bool,
    pub result: Option<ResultRole>,
    /// Text filter applied when nothing was persisted.
    pub preset_filter: Option<String>,
    pub min_width: Option<u32>,
    /// Target position in tree view.
    pub tree_order_ref: Option<usize>,
}

impl Column {
    /// A visible, sortable text-filter column.
    pub fn new(key: impl Into<String>, original_index: usize) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            original_index,
            filter_kind: FilterKind::Text,
            sortable: true,
            visible: true,
            numeric: false,
            hierarchy: None,
            responsive: ResponsiveClass::Auto,
            colvis_inactive: false,
            comma_separated: false,
            add_empty_option: false,
            processed_html: false,
            view_prefilter: false,
            result: None,
            preset_filter: None,
            min_width: None,
            tree_order_ref: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_filter(mut self, kind: FilterKind) -> Self {
        self.filter_kind = kind;
        self
    }

    pub fn with_hierarchy(mut self, role: HierarchyRole) -> Self {
        self.hierarchy = Some(role);
        self
    }

    pub fn with_responsive(mut self, class: ResponsiveClass) -> Self {
        self.responsive = class;
        self
    }

    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Whether the column gets a filter control.
    pub fn is_filterable(&self) -> bool {
        self.filter_kind != FilterKind::None
    }

    pub fn is_hierarchy(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// Whether a search on this column drives tree structure rather than content.
    pub fn is_structural(&self) -> bool {
        matches!(self.hierarchy, Some(HierarchyRole::Key | HierarchyRole::Level))
    }

    /// Whether the column is listed in the primary visibility menu.
    pub fn in_primary_menu(&self) -> bool {
        self.responsive == ResponsiveClass::Auto
    }

    /// Width used by the responsive layout.
    pub fn layout_width(&self) -> u32 {
        self.min_width.unwrap_or(DEFAULT_MIN_COLUMN_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_kind_from_classes() {
        assert_eq!(FilterKind::from_classes::<&str>(&[]), FilterKind::Text);
        assert_eq!(
            FilterKind::from_classes(&["select-filter"]),
            FilterKind::MultiSelect
        );
        assert_eq!(
            FilterKind::from_classes(&["select-filter", "select-filter-icon"]),
            FilterKind::MultiSelectIcon
        );
        assert_eq!(
            FilterKind::from_classes(&["select-filter-html-escape", "comma-separated"]),
            FilterKind::MultiSelectHtmlEscaped
        );
        assert_eq!(
            FilterKind::from_classes(&["select-filter-boolean-checkbox"]),
            FilterKind::BooleanCheckbox
        );
        assert_eq!(
            FilterKind::from_classes(&["non-filterable", "select-filter"]),
            FilterKind::None
        );
    }

    #[test]
    fn test_column_defaults() {
        let column = Column::new("name", 2);
        assert!(column.is_filterable());
        assert!(column.in_primary_menu());
        assert_eq!(column.layout_width(), DEFAULT_MIN_COLUMN_WIDTH);
        assert!(!Column::new("x", 0).with_filter(FilterKind::None).is_filterable());
        assert!(
            !Column::new("x", 0)
                .with_responsive(ResponsiveClass::AlwaysHidden)
                .in_primary_menu()
        );
        assert!(Column::new("lvl", 0).with_hierarchy(HierarchyRole::Level).is_structural());
        assert!(!Column::new("path", 0).with_hierarchy(HierarchyRole::Parent).is_structural());
    }
}
