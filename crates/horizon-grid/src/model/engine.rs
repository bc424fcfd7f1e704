//! The grid engine: search, order, column layout and pagination over
//! [`TableData`].
//!
//! Columns are always addressed by their original index. The display order
//! is a separate permutation (`order[position] = original index`) so that
//! searches, sort and visibility survive any number of reorders.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use regex::{Regex, RegexBuilder};

use super::{TableData, text};

/// Compares two rows (by position) under a sort specification.
pub type RowComparator = Arc<dyn Fn(&TableData, usize, usize, &SortSpec) -> Ordering + Send + Sync>;

/// A per-column search predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSearch {
    pub pattern: String,
    /// Match `pattern` as a case-insensitive regular expression instead of
    /// smart substring terms.
    pub regex: bool,
}

impl ColumnSearch {
    /// A smart substring search.
    pub fn text(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            regex: false,
        }
    }

    /// A regular expression search.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            regex: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }
}

enum Matcher {
    Smart,
    Regex(Regex),
}

struct CompiledSearch {
    search: ColumnSearch,
    matcher: Matcher,
}

impl CompiledSearch {
    fn compile(search: ColumnSearch) -> Self {
        let matcher = if search.regex {
            match RegexBuilder::new(&search.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Matcher::Regex(re),
                Err(err) => {
                    tracing::warn!(
                        target: targets::ENGINE,
                        pattern = %search.pattern,
                        error = %err,
                        "invalid search pattern, matching as text"
                    );
                    Matcher::Smart
                }
            }
        } else {
            Matcher::Smart
        };
        Self { search, matcher }
    }

    fn matches(&self, haystack: &str) -> bool {
        match &self.matcher {
            Matcher::Smart => text::smart_match(haystack, &self.search.pattern),
            Matcher::Regex(re) => re.is_match(haystack),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Apply the direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }

    /// The other direction.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Original column index.
    pub column: usize,
    pub direction: SortDirection,
}

/// Something a draw did that observers may react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Searches changed since the previous draw and were applied.
    SearchApplied,
    /// Sort changed since the previous draw and was applied.
    Ordered,
    /// The current page differs from the previous draw.
    PageChanged { page: usize },
    /// The draw finished.
    Drawn,
}

/// Outcome of [`GridEngine::draw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawReport {
    pub events: Vec<EngineEvent>,
    pub page: usize,
    pub page_count: usize,
    /// Rows passing all searches.
    pub rows_displayed: usize,
    pub rows_total: usize,
}

impl DrawReport {
    pub fn has(&self, event: &EngineEvent) -> bool {
        self.events.contains(event)
    }
}

/// Display-to-source row mapping.
#[derive(Debug, Default)]
struct RowMapping {
    display_to_source: Vec<usize>,
    source_to_display: Vec<Option<usize>>,
}

impl RowMapping {
    fn from_rows(rows: Vec<usize>, source_count: usize) -> Self {
        let mut source_to_display = vec![None; source_count];
        for (display, &source) in rows.iter().enumerate() {
            source_to_display[source] = Some(display);
        }
        Self {
            display_to_source: rows,
            source_to_display,
        }
    }

    fn map_from_source(&self, source: usize) -> Option<usize> {
        self.source_to_display.get(source).copied().flatten()
    }
}

/// In-memory grid engine.
pub struct GridEngine {
    data: TableData,
    order: Vec<usize>,
    searches: Vec<Option<CompiledSearch>>,
    global: Option<CompiledSearch>,
    sort: Option<SortSpec>,
    default_sort: Option<SortSpec>,
    comparator: Option<RowComparator>,
    pinned: HashSet<usize>,
    page: usize,
    page_length: Option<usize>,
    mapping: RowMapping,
    mapping_dirty: bool,
    search_dirty: bool,
    order_dirty: bool,
    last_drawn_page: Option<usize>,
    draw_count: u64,
}

impl fmt::Debug for GridEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEngine")
            .field("columns", &self.data.column_count())
            .field("rows", &self.data.row_count())
            .field("order", &self.order)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("page_length", &self.page_length)
            .finish()
    }
}

impl GridEngine {
    /// Create an engine over `data` in markup column order, unsorted, showing all rows.
    pub fn new(data: TableData) -> Self {
        let columns = data.column_count();
        let rows = data.row_count();
        Self {
            order: (0..columns).collect(),
            searches: (0..columns).map(|_| None).collect(),
            global: None,
            sort: None,
            default_sort: None,
            comparator: None,
            pinned: HashSet::new(),
            page: 0,
            page_length: None,
            mapping: RowMapping::from_rows((0..rows).collect(), rows),
            mapping_dirty: true,
            search_dirty: false,
            order_dirty: false,
            last_drawn_page: None,
            draw_count: 0,
            data,
        }
    }

    pub fn data(&self) -> &TableData {
        &self.data
    }

    /// Replace the rows and columns, keeping layout and searches when the
    /// column count is unchanged.
    pub fn replace_data(&mut self, data: TableData) {
        if data.column_count() != self.data.column_count() {
            tracing::debug!(target: targets::ENGINE, "column count changed, resetting layout");
            self.order = (0..data.column_count()).collect();
            self.searches = (0..data.column_count()).map(|_| None).collect();
            self.sort = None;
        }
        self.data = data;
        self.pinned.clear();
        self.mapping_dirty = true;
    }

    // =========================================================================
    // Searching
    // =========================================================================

    /// Set or clear the search of a column. Returns whether anything changed.
    pub fn set_column_search(&mut self, column: usize, search: Option<ColumnSearch>) -> bool {
        let Some(slot) = self.searches.get_mut(column) else {
            tracing::warn!(target: targets::ENGINE, column, "search on unknown column ignored");
            return false;
        };
        let search = search.filter(|s| !s.is_empty());
        let current = slot.as_ref().map(|c| &c.search);
        if current == search.as_ref() {
            return false;
        }
        *slot = search.map(CompiledSearch::compile);
        self.mapping_dirty = true;
        self.search_dirty = true;
        true
    }

    /// The search of a column.
    pub fn column_search(&self, column: usize) -> Option<&ColumnSearch> {
        self.searches.get(column)?.as_ref().map(|c| &c.search)
    }

    /// Set or clear the global search. Returns whether anything changed.
    pub fn set_global_search(&mut self, pattern: &str) -> bool {
        let current = self.global.as_ref().map(|c| c.search.pattern.as_str()).unwrap_or("");
        if current == pattern {
            return false;
        }
        self.global = if pattern.is_empty() {
            None
        } else {
            Some(CompiledSearch::compile(ColumnSearch::text(pattern)))
        };
        self.mapping_dirty = true;
        self.search_dirty = true;
        true
    }

    pub fn global_search(&self) -> &str {
        self.global.as_ref().map(|c| c.search.pattern.as_str()).unwrap_or("")
    }

    /// Columns with an active search.
    pub fn searched_columns(&self) -> Vec<usize> {
        self.searches
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }

    /// Let `rows` pass every content search; hierarchy searches still apply.
    pub fn set_pinned_rows(&mut self, rows: HashSet<usize>) {
        if self.pinned != rows {
            self.pinned = rows;
            self.mapping_dirty = true;
        }
    }

    pub fn pinned_rows(&self) -> &HashSet<usize> {
        &self.pinned
    }

    /// Rows matching every search except those on columns `skip` selects.
    /// Pins are ignored.
    pub fn rows_matching<F>(&self, skip: F) -> Vec<usize>
    where
        F: Fn(usize) -> bool,
    {
        (0..self.data.row_count())
            .filter(|&row| {
                self.searches.iter().enumerate().all(|(col, search)| match search {
                    Some(s) if !skip(col) => s.matches(&self.data.search_text(row, col)),
                    _ => true,
                }) && self.global_matches(row)
            })
            .collect()
    }

    fn global_matches(&self, row: usize) -> bool {
        let Some(global) = &self.global else {
            return true;
        };
        let haystack: Vec<String> = self
            .data
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_structural())
            .map(|(i, _)| self.data.search_text(row, i))
            .collect();
        global.matches(&haystack.join("  "))
    }

    fn row_passes(&self, row: usize) -> bool {
        let mut structural = true;
        let mut content = true;
        for (col, search) in self.searches.iter().enumerate() {
            let Some(search) = search else { continue };
            let matched = search.matches(&self.data.search_text(row, col));
            if self.data.column(col).is_some_and(|c| c.is_structural()) {
                structural &= matched;
            } else {
                content &= matched;
            }
            if !structural {
                return false;
            }
        }
        structural && ((content && self.global_matches(row)) || self.pinned.contains(&row))
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        if self.sort != sort {
            self.sort = sort;
            self.mapping_dirty = true;
            self.order_dirty = true;
        }
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Order used while no explicit sort is set. Not reported by [`sort`](Self::sort).
    pub fn set_default_sort(&mut self, sort: Option<SortSpec>) {
        if self.default_sort != sort {
            self.default_sort = sort;
            if self.sort.is_none() {
                self.mapping_dirty = true;
                self.order_dirty = true;
            }
        }
    }

    /// Install a comparator replacing the built-in cell comparison.
    pub fn set_comparator(&mut self, comparator: Option<RowComparator>) {
        self.comparator = comparator;
        self.mapping_dirty = true;
    }

    /// Force a re-sort on the next draw, e.g. after hierarchy data changed.
    pub fn invalidate(&mut self) {
        self.mapping_dirty = true;
    }

    fn default_compare(&self, a: usize, b: usize, spec: &SortSpec) -> Ordering {
        let numeric = self.data.column(spec.column).is_some_and(|c| c.numeric);
        let value = |row: usize| {
            self.data
                .row(row)
                .and_then(|r| r.cell(spec.column))
                .map(|c| c.sort_value())
                .unwrap_or("")
        };
        let ordering = if numeric {
            text::compare_any_number(value(a), value(b))
        } else {
            text::compare_cell_values(value(a), value(b))
        };
        spec.direction.apply(ordering)
    }

    fn compute_display_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..self.data.row_count())
            .filter(|&row| self.row_passes(row))
            .collect();

        if let Some(spec) = self.sort.or(self.default_sort) {
            match &self.comparator {
                Some(compare) => rows.sort_by(|&a, &b| compare(&self.data, a, b, &spec)),
                None => rows.sort_by(|&a, &b| self.default_compare(a, b, &spec)),
            }
        }
        rows
    }

    fn ensure_mapping(&mut self) {
        if self.mapping_dirty {
            let rows = self.compute_display_rows();
            self.mapping = RowMapping::from_rows(rows, self.data.row_count());
            self.mapping_dirty = false;
        }
    }

    // =========================================================================
    // Column layout
    // =========================================================================

    /// Display order: `order[position]` is an original column index.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Replace the display order. Rejects anything that is not a permutation
    /// of all columns.
    pub fn set_order(&mut self, order: Vec<usize>) -> bool {
        let mut sorted = order.clone();
        sorted.sort_unstable();
        if sorted != (0..self.data.column_count()).collect::<Vec<_>>() {
            tracing::warn!(target: targets::ENGINE, ?order, "rejecting invalid column order");
            return false;
        }
        self.order = order;
        true
    }

    /// Current position of an original column.
    pub fn position_of(&self, column: usize) -> Option<usize> {
        self.order.iter().position(|&c| c == column)
    }

    /// Original column at a display position.
    pub fn column_at(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    pub fn set_column_visible(&mut self, column: usize, visible: bool) -> bool {
        match self.data.column_mut(column) {
            Some(col) if col.visible != visible => {
                col.visible = visible;
                true
            }
            _ => false,
        }
    }

    pub fn is_column_visible(&self, column: usize) -> bool {
        self.data.column(column).is_some_and(|c| c.visible)
    }

    /// Visible original columns in display order.
    pub fn visible_columns(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&c| self.is_column_visible(c))
            .collect()
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Rows per page; `None` shows everything on one page.
    pub fn set_page_length(&mut self, length: Option<usize>) {
        self.page_length = length.filter(|&l| l > 0);
    }

    pub fn page_length(&self) -> Option<usize> {
        self.page_length
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages for the current search result, at least 1.
    pub fn page_count(&mut self) -> usize {
        self.ensure_mapping();
        let displayed = self.mapping.display_to_source.len();
        match self.page_length {
            Some(length) => displayed.div_ceil(length).max(1),
            None => 1,
        }
    }

    /// Move to the last page if the current one no longer exists.
    /// Returns whether the page changed.
    pub fn select_last_page_if_out_of_range(&mut self) -> bool {
        let count = self.page_count();
        if self.page >= count {
            self.page = count - 1;
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Apply pending search and sort changes and validate the page.
    #[tracing::instrument(skip(self), target = "horizon_grid::engine", level = "trace")]
    pub fn draw(&mut self) -> DrawReport {
        self.ensure_mapping();
        let mut events = Vec::new();

        if std::mem::take(&mut self.search_dirty) {
            events.push(EngineEvent::SearchApplied);
        }
        if std::mem::take(&mut self.order_dirty) {
            events.push(EngineEvent::Ordered);
        }

        let page_count = self.page_count();
        if self.page >= page_count {
            tracing::debug!(target: targets::ENGINE, page = self.page, page_count, "page out of range, resetting");
            self.page = 0;
        }
        if let Some(last) = self.last_drawn_page {
            if last != self.page {
                events.push(EngineEvent::PageChanged { page: self.page });
            }
        }
        self.last_drawn_page = Some(self.page);

        events.push(EngineEvent::Drawn);
        self.draw_count += 1;

        DrawReport {
            events,
            page: self.page,
            page_count,
            rows_displayed: self.mapping.display_to_source.len(),
            rows_total: self.data.row_count(),
        }
    }

    /// Number of completed draws.
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Rows passing all searches, in display order, as of the last draw.
    pub fn displayed_rows(&self) -> &[usize] {
        &self.mapping.display_to_source
    }

    /// Rows on the current page, as of the last draw.
    pub fn page_rows(&self) -> &[usize] {
        let rows = &self.mapping.display_to_source;
        match self.page_length {
            Some(length) => {
                let start = (self.page * length).min(rows.len());
                let end = (start + length).min(rows.len());
                &rows[start..end]
            }
            None => rows,
        }
    }

    /// Display position of a row, `None` if it is filtered out.
    pub fn display_position(&self, row: usize) -> Option<usize> {
        self.mapping.map_from_source(row)
    }
}
