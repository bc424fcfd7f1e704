//! The table controller.
//!
//! A [`TableController`] owns one table: its engine, filters, tree state,
//! toolbar, menus, layout and persistence. Every public mutation follows the
//! same path: change the model, re-run the tree search when searches
//! changed, draw once, notify observers and schedule a debounced save.
//!
//! ```text
//! Uninitialized ──initialize──► Initializing ──► Ready ──destroy──► Destroyed
//!                                     ▲            │
//!                                     └─reinitialize┘
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_grid_core::logging::{span_names, targets};
use horizon_grid_core::{PerfSpan, SharedClock, SystemClock};

use super::{TableEvents, TableOptions};
use crate::error::{GridError, Result};
use crate::filter::{FilterControl, FilterSet, FilterValue, restore_filters};
use crate::layout::ResponsiveLayout;
use crate::markup::TableMarkup;
use crate::model::{
    ColumnSearch, DrawReport, EngineEvent, FilterKind, GridEngine, HierarchyRole, ResponsiveClass,
    RowId, SortDirection, SortSpec, TableData,
};
use crate::results::ResultsRow;
use crate::selectors::classes;
use crate::state::{MemoryStore, StatePersister, StateStore, ViewState, state_key};
use crate::toolbar::{
    ButtonKind, ColumnMenu, HiddenFilter, HiddenFilterWarning, MenuKind, Toolbar, ToolbarConfig,
    array_change_position,
};
use crate::tree::{HierarchyCache, Toggle, TreePlan, TreeSearch, VisibleBranches, tree_comparator};

/// Where a table is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    /// Loading and replaying view state; observers are not notified.
    Initializing,
    Ready,
    Destroyed,
}

/// How a tree table presents its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Rows follow the hierarchy and branches expand and collapse.
    Tree,
    /// Every row is shown and sorted on its own.
    List,
}

impl ViewMode {
    /// Value written to view prefilter columns.
    fn prefilter_value(self) -> &'static str {
        match self {
            ViewMode::Tree => "1",
            ViewMode::List => "0",
        }
    }
}

/// What the table offers beyond its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableFeatures {
    /// Rows form a tree.
    pub tree: bool,
    /// A column filter row exists.
    pub column_filters: bool,
    /// A refresh button is offered.
    pub refresh: bool,
}

impl TableFeatures {
    /// Features implied by the data alone.
    pub fn detect(data: &TableData) -> Self {
        Self {
            tree: data.has_hierarchy(),
            column_filters: data.columns().iter().any(|c| c.is_filterable()),
            refresh: false,
        }
    }

    /// Features declared by the markup.
    pub fn from_markup(markup: &TableMarkup) -> Self {
        Self {
            tree: markup.is_tree_table(),
            column_filters: markup.has_column_filters(),
            refresh: markup.show_refresh_button(),
        }
    }
}

/// Which timers fired during [`TableController::process_timers`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerReport {
    pub state_saved: bool,
    pub layout_changed: bool,
}

/// One interactive table.
pub struct TableController {
    id: String,
    lifecycle: Lifecycle,
    options: TableOptions,
    features: TableFeatures,
    engine: GridEngine,
    default_visibility: Vec<bool>,
    filters: FilterSet,
    cache: Arc<HierarchyCache>,
    /// Branches the user expanded.
    branches: VisibleBranches,
    /// Branches shown while a search reveals ancestors.
    revealed: Option<VisibleBranches>,
    tree_search: TreeSearch,
    mode: ViewMode,
    list_order: Option<Vec<usize>>,
    toolbar: Toolbar,
    menu: ColumnMenu,
    layout: ResponsiveLayout,
    store: Arc<dyn StateStore>,
    clock: SharedClock,
    persister: StatePersister,
    search_field_visible: bool,
    column_filters_visible: bool,
    dirty: bool,
    events: Arc<TableEvents>,
}

impl fmt::Debug for TableController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableController")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("mode", &self.mode)
            .field("engine", &self.engine)
            .field("branches", &self.branches)
            .field("persister", &self.persister)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl TableController {
    /// Create an uninitialized controller.
    ///
    /// View state goes to a process-local [`MemoryStore`] until
    /// [`with_store`](Self::with_store) supplies another one.
    pub fn new(id: impl Into<String>, data: TableData, options: TableOptions) -> Self {
        let id = id.into();
        let clock: SharedClock = Arc::new(SystemClock);
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let persister = Self::make_persister(&id, &options, store.clone(), clock.clone());
        let features = TableFeatures::detect(&data);
        let default_visibility = data.columns().iter().map(|c| c.visible).collect();
        let cache = Arc::new(HierarchyCache::build(&data));
        let filters = FilterSet::build(&data);

        Self {
            lifecycle: Lifecycle::Uninitialized,
            features,
            engine: GridEngine::new(data),
            default_visibility,
            filters,
            cache,
            branches: VisibleBranches::new(),
            revealed: None,
            tree_search: TreeSearch::new(),
            mode: ViewMode::Tree,
            list_order: None,
            toolbar: Toolbar::default(),
            menu: ColumnMenu::default(),
            layout: ResponsiveLayout::new(clock.clone()),
            store,
            clock,
            persister,
            search_field_visible: true,
            column_filters_visible: true,
            dirty: false,
            events: Arc::new(TableEvents::new()),
            options,
            id,
        }
    }

    /// Create a controller from table markup.
    ///
    /// The markup's custom options replace the plain fields of `options`;
    /// callbacks set on `options` are kept. Malformed custom options are
    /// logged and ignored.
    pub fn from_markup(id: impl Into<String>, markup: &TableMarkup, options: TableOptions) -> Result<Self> {
        let id = id.into();
        let data = markup.to_table_data()?;
        let options = match markup.custom_options() {
            Some(json) => match TableOptions::from_json(json) {
                Ok(parsed) => options.merge_parsed(parsed),
                Err(err) => {
                    tracing::warn!(target: targets::CONTROLLER, table = %id, error = %err, "ignoring custom options");
                    options
                }
            },
            None => options,
        };
        Ok(Self::new(id, data, options).with_features(TableFeatures::from_markup(markup)))
    }

    fn make_persister(
        id: &str,
        options: &TableOptions,
        store: Arc<dyn StateStore>,
        clock: SharedClock,
    ) -> StatePersister {
        let key = options.state_key.clone().unwrap_or_else(|| state_key(id));
        if options.deactivate_table_state {
            StatePersister::disabled(key, clock)
        } else {
            StatePersister::new(store, key, clock)
        }
    }

    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = store;
        self.persister = Self::make_persister(&self.id, &self.options, self.store.clone(), self.clock.clone());
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self.layout = ResponsiveLayout::new(self.clock.clone());
        self.persister = Self::make_persister(&self.id, &self.options, self.store.clone(), self.clock.clone());
        self
    }

    pub fn with_features(mut self, features: TableFeatures) -> Self {
        self.features = features;
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load and replay the persisted view state, then draw for the first time.
    ///
    /// Does nothing on a table that is already ready.
    pub fn initialize(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Destroyed => Err(GridError::NotReady(self.id.clone())),
            Lifecycle::Ready => {
                tracing::debug!(target: targets::CONTROLLER, table = %self.id, "already initialized");
                Ok(())
            }
            Lifecycle::Uninitialized | Lifecycle::Initializing => {
                self.run_initialization();
                Ok(())
            }
        }
    }

    /// Write pending state and initialize again from the store.
    pub fn reinitialize(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(GridError::NotReady(self.id.clone()));
        }
        if self.persister.flush() {
            self.events.state_saved.emit(self.persister.key().to_string());
        }
        self.run_initialization();
        Ok(())
    }

    fn run_initialization(&mut self) {
        let _perf = PerfSpan::new(span_names::INIT);
        self.lifecycle = Lifecycle::Initializing;
        self.events.set_blocked(true);
        tracing::debug!(target: targets::CONTROLLER, table = %self.id, "initializing table");

        self.reset_view();
        let restored = match self.persister.load() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => {
                for (column, search) in self.filters.apply_presets(self.engine.data()) {
                    self.set_engine_search(column, Some(search));
                }
                false
            }
        };

        self.mode = self.initial_mode();
        if self.options.init_as_single {
            self.mode = ViewMode::List;
            self.engine.set_page_length(Some(1));
        }
        self.install_tree();
        self.apply_tree_search();

        self.toolbar = self.build_toolbar();
        self.apply_search_field_rules();
        if !self.column_filters_visible {
            let warning = self.hidden_filter_warning();
            self.toolbar.set_hidden_filter_warning(Some(warning));
        }
        self.layout.recompute(&self.engine);
        self.refresh_menu();

        if self.options.check_page_on_init && restored {
            self.engine.select_last_page_if_out_of_range();
        }
        let report = self.engine.draw();

        self.lifecycle = Lifecycle::Ready;
        self.events.set_blocked(false);
        self.notify_draw(&report);
        if let Some(on_init) = &self.options.callbacks.on_init {
            on_init(&self.id);
        }
        tracing::info!(
            target: targets::CONTROLLER,
            table = %self.id,
            restored,
            rows = report.rows_total,
            displayed = report.rows_displayed,
            "table initialized"
        );
    }

    fn reset_view(&mut self) {
        let columns = self.engine.data().column_count();
        self.engine.set_order((0..columns).collect());
        for column in 0..columns {
            self.engine.set_column_search(column, None);
            let visible = self.default_visibility.get(column).copied().unwrap_or(true);
            self.engine.set_column_visible(column, visible);
        }
        self.engine.set_global_search("");
        self.engine.set_pinned_rows(HashSet::new());
        self.engine.set_sort(None);
        self.engine.set_page(0);
        self.engine.set_page_length(self.options.effective_page_length());
        self.filters = FilterSet::build(self.engine.data());
        self.branches = VisibleBranches::new();
        self.revealed = None;
        self.list_order = None;
        self.search_field_visible = true;
        self.column_filters_visible = true;
    }

    fn restore(&mut self, state: ViewState) {
        let column_count = self.engine.data().column_count();
        let order_restored = !state.column_order.is_empty() && self.engine.set_order(state.column_order.clone());
        if !state.column_order.is_empty() && !order_restored {
            tracing::warn!(target: targets::STATE, table = %self.id, "saved column order does not fit the table, keeping markup order");
        }

        let searches = restore_filters(
            &mut self.filters,
            &state.column_order,
            &state.column_filter_values,
            self.engine.order(),
        );
        for (column, search) in searches {
            self.set_engine_search(column, search);
        }

        if order_restored {
            for column in 0..column_count {
                self.engine.set_column_visible(column, !state.hidden_columns.contains(&column));
            }
        }

        self.search_field_visible = state.search_field_visible;
        self.column_filters_visible = state.column_filters_visible;
        if self.search_field_visible {
            self.engine.set_global_search(&state.global_search);
        }

        if let Some(sort) = state.sort {
            if self.engine.data().column(sort.column).is_some_and(|c| c.sortable) {
                self.engine.set_sort(Some(sort));
            } else {
                tracing::warn!(target: targets::STATE, column = sort.column, "saved sort column unusable, ignoring");
            }
        }
        if state.page_length.is_some() {
            self.engine.set_page_length(state.page_length);
        }
        self.engine.set_page(state.page);
        self.branches = state.visible_row_parent_ids;
        tracing::debug!(target: targets::STATE, table = %self.id, branches = self.branches.len(), "view state replayed");
    }

    /// Write pending state, disconnect observers and stop accepting calls.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        if self.persister.flush() {
            self.events.state_saved.emit(self.persister.key().to_string());
        }
        self.events.disconnect_all();
        self.lifecycle = Lifecycle::Destroyed;
        tracing::debug!(target: targets::CONTROLLER, table = %self.id, "table destroyed");
    }

    fn ensure_ready(&self) -> Result<()> {
        debug_assert!(
            self.lifecycle == Lifecycle::Ready,
            "table '{}' used while {:?}",
            self.id,
            self.lifecycle
        );
        if self.lifecycle == Lifecycle::Ready {
            Ok(())
        } else {
            Err(GridError::NotReady(self.id.clone()))
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn features(&self) -> TableFeatures {
        self.features
    }

    pub fn engine(&self) -> &GridEngine {
        &self.engine
    }

    pub fn data(&self) -> &TableData {
        self.engine.data()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filter(&self, column: usize) -> Option<&FilterControl> {
        self.filters.control(column)
    }

    pub fn hierarchy(&self) -> &HierarchyCache {
        &self.cache
    }

    /// Branches the user expanded.
    pub fn branches(&self) -> &VisibleBranches {
        &self.branches
    }

    /// Branches currently shown, which differ from [`branches`](Self::branches)
    /// while a search reveals ancestors.
    pub fn shown_branches(&self) -> &VisibleBranches {
        self.revealed.as_ref().unwrap_or(&self.branches)
    }

    /// Whether a search currently decides the shown branches.
    pub fn is_tree_filtered(&self) -> bool {
        self.tree_search.is_filtered()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.mode
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn menu(&self) -> &ColumnMenu {
        &self.menu
    }

    pub fn events(&self) -> &Arc<TableEvents> {
        &self.events
    }

    pub fn state_key(&self) -> &str {
        self.persister.key()
    }

    /// Completed view-state writes.
    pub fn state_write_count(&self) -> u64 {
        self.persister.write_count()
    }

    pub fn search_field_visible(&self) -> bool {
        self.search_field_visible && self.search_field_available()
    }

    pub fn column_filters_visible(&self) -> bool {
        self.column_filters_visible
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Columns the responsive layout collapsed, in display order.
    pub fn collapsed_columns(&self) -> Vec<usize> {
        let collapsed = self.layout.collapsed();
        self.engine
            .order()
            .iter()
            .copied()
            .filter(|c| collapsed.contains(c))
            .collect()
    }

    pub fn results_row(&self) -> Option<ResultsRow> {
        ResultsRow::compute(&self.engine)
    }

    /// Ids of the rows passing all searches, in display order.
    pub fn displayed_row_ids(&self) -> Vec<RowId> {
        self.row_ids(self.engine.displayed_rows())
    }

    /// Ids of the rows on the current page.
    pub fn page_row_ids(&self) -> Vec<RowId> {
        self.row_ids(self.engine.page_rows())
    }

    fn row_ids(&self, positions: &[usize]) -> Vec<RowId> {
        positions
            .iter()
            .filter_map(|&p| self.engine.data().row(p).map(|r| r.id))
            .collect()
    }

    /// Marker classes of a row: whether it has children and whether they show.
    pub fn row_markers(&self, position: usize) -> Vec<&'static str> {
        let mut markers = Vec::new();
        if self.mode != ViewMode::Tree {
            return markers;
        }
        let Some(id) = self.cache.id_at(position) else {
            return markers;
        };
        if self.cache.has_children(id) {
            markers.push(classes::ROW_HAS_CHILDREN);
            if self.shown_branches().contains(id) {
                markers.push(classes::ROW_CHILDREN_VISIBLE);
            }
        }
        markers
    }

    /// Marker classes of the table element.
    pub fn table_classes(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.tree_enabled() {
            out.push(classes::TREE_TABLE);
        }
        if self.engine.data().row_count() == 0 {
            out.push(classes::DATATABLE_EMPTY);
        }
        if self.dirty {
            out.push(classes::TABLE_DIRTY);
        }
        out
    }

    /// The current view state, as it would be persisted.
    pub fn view_state(&self) -> ViewState {
        let data = self.engine.data();
        let order = self.engine.order().to_vec();
        let page_length = self.engine.page_length();
        ViewState {
            visible_row_parent_ids: self.branches.clone(),
            column_filter_values: self.filters.snapshot(&order, data),
            column_order: order,
            search_field_visible: self.search_field_visible,
            column_filters_visible: self.column_filters_visible,
            page: self.engine.page(),
            page_length: page_length.filter(|_| page_length != self.options.effective_page_length()),
            sort: self.engine.sort(),
            global_search: self.engine.global_search().to_string(),
            hidden_columns: (0..data.column_count())
                .filter(|&c| !self.engine.is_column_visible(c))
                .collect(),
        }
    }

    // =========================================================================
    // Tree
    // =========================================================================

    fn key_column(&self) -> Option<usize> {
        self.engine.data().hierarchy_column(HierarchyRole::Key)
    }

    fn tree_enabled(&self) -> bool {
        self.features.tree && self.key_column().is_some()
    }

    fn initial_mode(&self) -> ViewMode {
        if !self.tree_enabled() {
            if self.features.tree {
                tracing::warn!(target: targets::TREE, table = %self.id, "tree table without hierarchy column, showing a list");
            }
            return ViewMode::List;
        }
        let data = self.engine.data();
        let list_selected = data.columns().iter().filter(|c| c.view_prefilter).any(|c| {
            matches!(
                self.filters.control(c.original_index).map(|f| f.value()),
                Some(FilterValue::Text(value)) if value == ViewMode::List.prefilter_value()
            )
        });
        if list_selected { ViewMode::List } else { ViewMode::Tree }
    }

    fn install_tree(&mut self) {
        let Some(key) = self.key_column() else {
            return;
        };
        match self.mode {
            ViewMode::Tree if self.features.tree => {
                self.engine.set_comparator(Some(tree_comparator(self.cache.clone())));
                // Unsorted tree tables still need parents ahead of their children.
                self.engine.set_default_sort(Some(SortSpec {
                    column: key,
                    direction: SortDirection::Ascending,
                }));
            }
            _ => {
                self.engine.set_comparator(None);
                self.engine.set_default_sort(None);
                self.engine.set_column_search(key, None);
                self.engine.set_pinned_rows(HashSet::new());
                self.revealed = None;
            }
        }
    }

    /// Show the branches the searches call for.
    fn apply_tree_search(&mut self) {
        if self.mode != ViewMode::Tree || !self.features.tree {
            return;
        }
        let Some(key) = self.key_column() else {
            return;
        };
        if !self.tree_search.begin() {
            return;
        }
        match self.tree_search.plan(&self.engine, &self.cache) {
            TreePlan::Reveal { branches, pins } => {
                self.engine
                    .set_column_search(key, Some(ColumnSearch::regex(branches.to_search_pattern())));
                self.engine.set_pinned_rows(pins);
                self.revealed = Some(branches);
            }
            TreePlan::Restore => {
                self.engine
                    .set_column_search(key, Some(ColumnSearch::regex(self.branches.to_search_pattern())));
                self.engine.set_pinned_rows(HashSet::new());
                self.revealed = None;
            }
        }
        self.tree_search.end();
    }

    fn branches_editable(&self, operation: &str) -> bool {
        if self.mode != ViewMode::Tree || !self.tree_enabled() {
            tracing::debug!(target: targets::TREE, table = %self.id, operation, "not showing a tree, ignoring");
            return false;
        }
        if self.tree_search.is_filtered() {
            tracing::debug!(target: targets::TREE, table = %self.id, operation, "search decides the shown branches, ignoring");
            return false;
        }
        true
    }

    /// Expand a collapsed branch or collapse an expanded one with all its
    /// descendants. Ignored while a search reveals ancestors.
    pub fn toggle_branch(&mut self, id: RowId) -> Result<Toggle> {
        self.ensure_ready()?;
        if !self.branches_editable("toggle branch") {
            return Ok(Toggle::Unchanged);
        }
        if !id.is_root() && self.cache.get(id).is_none() {
            tracing::warn!(target: targets::TREE, row = %id, "toggle on unknown row ignored");
            return Ok(Toggle::Unchanged);
        }
        let toggle = self.branches.toggle(id, &self.cache);
        if toggle == Toggle::Unchanged {
            return Ok(toggle);
        }
        self.events.branch_toggled.emit((id, toggle == Toggle::Expanded));
        self.commit(true);
        Ok(toggle)
    }

    /// Expand every branch above hierarchy depth `depth` and collapse the rest.
    pub fn display_level(&mut self, depth: u32) -> Result<()> {
        self.ensure_ready()?;
        if !self.branches_editable("display level") {
            return Ok(());
        }
        self.branches = VisibleBranches::display_level(depth, &self.cache);
        tracing::debug!(target: targets::TREE, depth, branches = self.branches.len(), "display level applied");
        self.commit(true);
        Ok(())
    }

    /// Switch a tree table between tree and list view. Returns the new mode.
    ///
    /// Entering tree view remembers the list column order and moves columns
    /// with a tree position there; leaving it restores the list order.
    pub fn switch_view(&mut self) -> Result<ViewMode> {
        self.ensure_ready()?;
        if !self.tree_enabled() {
            tracing::warn!(target: targets::CONTROLLER, table = %self.id, "view switch on a table without tree");
            return Ok(self.mode);
        }

        let before = self.engine.order().to_vec();
        self.mode = match self.mode {
            ViewMode::Tree => {
                if let Some(order) = self.list_order.take() {
                    self.engine.set_order(order);
                }
                ViewMode::List
            }
            ViewMode::List => {
                let order = tree_view_order(self.engine.data(), &before);
                self.engine.set_order(order);
                self.list_order = Some(before.clone());
                ViewMode::Tree
            }
        };

        self.apply_view_prefilters();
        self.install_tree();
        self.toolbar.set_hidden(ButtonKind::TreeLevels, self.mode == ViewMode::List);
        if self.engine.order() != before.as_slice() {
            self.layout.recompute(&self.engine);
            self.events.column_reordered.emit(self.engine.order().to_vec());
        }
        tracing::debug!(target: targets::CONTROLLER, table = %self.id, mode = ?self.mode, "view switched");
        self.commit(true);
        Ok(self.mode)
    }

    fn apply_view_prefilters(&mut self) {
        let columns: Vec<usize> = self
            .engine
            .data()
            .columns()
            .iter()
            .filter(|c| c.view_prefilter && c.filter_kind == FilterKind::Text)
            .map(|c| c.original_index)
            .collect();
        let value = self.mode.prefilter_value();
        for column in columns {
            match self.filters.apply(column, FilterValue::Text(value.to_string())) {
                Ok(search) => self.set_engine_search(column, search),
                Err(err) => tracing::warn!(target: targets::FILTER, column, error = %err, "view prefilter not applied"),
            }
        }
    }

    // =========================================================================
    // Searching
    // =========================================================================

    fn set_engine_search(&mut self, column: usize, search: Option<ColumnSearch>) {
        if self.mode == ViewMode::Tree && self.tree_enabled() && Some(column) == self.key_column() {
            tracing::warn!(target: targets::FILTER, column, "hierarchy column search is managed by the tree, ignoring");
            return;
        }
        self.engine.set_column_search(column, search);
    }

    /// Apply a value to a column's filter.
    pub fn set_filter(&mut self, column: usize, value: FilterValue) -> Result<()> {
        self.ensure_ready()?;
        let search = self.filters.apply(column, value)?;
        self.set_engine_search(column, search);
        self.commit(true);
        Ok(())
    }

    pub fn clear_column_filter(&mut self, column: usize) -> Result<()> {
        let kind = self
            .filters
            .control(column)
            .map(|c| c.kind())
            .ok_or_else(|| GridError::unknown_column(column))?;
        self.set_filter(column, FilterValue::empty_for(kind))
    }

    /// Clear the global search and every filter except those on
    /// always-hidden and never-shown columns.
    pub fn clear_all_filters(&mut self) -> Result<()> {
        self.ensure_ready()?;
        for column in self.filters.clear_all(self.engine.data()) {
            self.set_engine_search(column, None);
        }
        self.engine.set_global_search("");
        self.commit(true);
        Ok(())
    }

    pub fn set_global_search(&mut self, pattern: &str) -> Result<()> {
        self.ensure_ready()?;
        if !self.search_field_visible() && !pattern.is_empty() {
            tracing::debug!(target: targets::CONTROLLER, table = %self.id, "search field hidden, ignoring global search");
            return Ok(());
        }
        self.engine.set_global_search(pattern);
        self.commit(true);
        Ok(())
    }

    pub fn global_search(&self) -> &str {
        self.engine.global_search()
    }

    // =========================================================================
    // Toolbar actions
    // =========================================================================

    fn search_field_available(&self) -> bool {
        !self.options.hide_search_field && !self.engine.page_length().is_some_and(|l| l < 2)
    }

    /// Hide the search field where it is unavailable. Returns whether the
    /// global search was cleared.
    fn apply_search_field_rules(&mut self) -> bool {
        let available = self.search_field_available();
        self.toolbar.set_hidden(ButtonKind::ToggleSearchField, !available);
        self.toolbar.set_active(ButtonKind::ToggleSearchField, self.search_field_visible);
        if !available || !self.search_field_visible {
            self.engine.set_global_search("")
        } else {
            false
        }
    }

    fn build_toolbar(&self) -> Toolbar {
        if self.options.hide_buttons {
            return Toolbar::default();
        }
        let mut toolbar = Toolbar::build(&ToolbarConfig {
            refresh: self.features.refresh,
            tree: self.tree_enabled(),
            tree_buttons: !self.options.hide_tree_buttons && !self.options.init_as_single,
            column_filters: self.features.column_filters,
            search_field: !self.options.hide_search_field,
            add: self.options.has_add(),
            empty: self.engine.data().row_count() == 0,
        });
        toolbar.set_active(ButtonKind::ToggleColumnFilters, self.column_filters_visible);
        toolbar.set_active(ButtonKind::ToggleSearchField, self.search_field_visible);
        toolbar.set_hidden(ButtonKind::TreeLevels, self.mode == ViewMode::List);
        toolbar
    }

    /// Show or hide the global search field. Hiding clears the search.
    /// Returns whether the field is now shown.
    pub fn toggle_search_field(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        self.search_field_visible = !self.search_field_visible;
        self.apply_search_field_rules();
        self.commit(true);
        Ok(self.search_field_visible)
    }

    /// Show or hide the column filter row. Hiding keeps the filters and
    /// reports the active ones. Returns whether the row is now shown.
    pub fn toggle_column_filters(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        self.column_filters_visible = !self.column_filters_visible;
        let warning = if self.column_filters_visible {
            None
        } else {
            Some(self.hidden_filter_warning())
        };
        if let Some(warning) = warning.as_ref().filter(|w| !w.filters.is_empty()) {
            tracing::warn!(target: targets::TOOLBAR, table = %self.id, "{warning}");
        }
        self.toolbar.set_hidden_filter_warning(warning);
        self.toolbar
            .set_active(ButtonKind::ToggleColumnFilters, self.column_filters_visible);
        self.commit(false);
        Ok(self.column_filters_visible)
    }

    fn hidden_filter_warning(&self) -> HiddenFilterWarning {
        let data = self.engine.data();
        let filters = self
            .engine
            .order()
            .iter()
            .filter_map(|&column| {
                let col = data.column(column)?;
                if col.responsive == ResponsiveClass::Never {
                    return None;
                }
                let control = self.filters.control(column).filter(|c| c.is_active())?;
                Some(HiddenFilter {
                    column,
                    title: col.title.clone(),
                    value: control.display_text(),
                })
            })
            .collect();
        HiddenFilterWarning { filters }
    }

    /// Ask the host to reload the table. Returns whether a refresh callback
    /// is registered.
    pub fn refresh(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        match &self.options.callbacks.on_refresh {
            Some(on_refresh) => {
                tracing::debug!(target: targets::CONTROLLER, table = %self.id, "refresh requested");
                on_refresh(&self.id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ask the host to create a record. Returns whether an add callback is
    /// registered.
    pub fn add(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        match &self.options.callbacks.on_add {
            Some(on_add) => {
                on_add(());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flag the shown data as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.toolbar.set_refresh_needed(true);
    }

    /// Replace the rows, keeping filters, branches and layout.
    ///
    /// Filter selections whose options disappeared are dropped. When the
    /// column count changes the layout and filters start over.
    pub fn replace_data(&mut self, data: TableData) -> Result<()> {
        self.ensure_ready()?;
        let same_shape = data.column_count() == self.engine.data().column_count();
        let visibility: Vec<bool> = (0..self.engine.data().column_count())
            .map(|c| self.engine.is_column_visible(c))
            .collect();

        self.engine.replace_data(data);
        self.cache = Arc::new(HierarchyCache::build(self.engine.data()));
        if same_shape {
            for (column, visible) in visibility.into_iter().enumerate() {
                self.engine.set_column_visible(column, visible);
            }
            for (column, search) in self.filters.rebuild(self.engine.data()) {
                self.set_engine_search(column, search);
            }
        } else {
            self.default_visibility = self.engine.data().columns().iter().map(|c| c.visible).collect();
            self.filters = FilterSet::build(self.engine.data());
            self.list_order = None;
        }
        self.install_tree();

        self.dirty = false;
        self.toolbar = self.build_toolbar();
        self.apply_search_field_rules();
        if !self.column_filters_visible {
            let warning = self.hidden_filter_warning();
            self.toolbar.set_hidden_filter_warning(Some(warning));
        }
        self.layout.recompute(&self.engine);
        tracing::debug!(target: targets::CONTROLLER, table = %self.id, rows = self.engine.data().row_count(), "data replaced");
        self.commit(true);
        Ok(())
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Show or hide a column. The column's filter value is kept.
    /// Returns whether anything changed.
    pub fn set_column_visible(&mut self, column: usize, visible: bool) -> Result<bool> {
        self.ensure_ready()?;
        let col = self
            .engine
            .data()
            .column(column)
            .ok_or_else(|| GridError::unknown_column(column))?;
        if col.colvis_inactive || matches!(col.responsive, ResponsiveClass::Never | ResponsiveClass::Control) {
            tracing::debug!(target: targets::TOOLBAR, column, "column visibility cannot be toggled");
            return Ok(false);
        }
        if !self.engine.set_column_visible(column, visible) {
            return Ok(false);
        }
        self.layout.recompute(&self.engine);
        self.events.column_visibility_changed.emit((column, visible));
        self.commit(false);
        Ok(true)
    }

    /// Move entry `old` of a visibility menu to `new`, moving its column in
    /// the display order. Returns whether the order changed.
    pub fn move_menu_entry(&mut self, kind: MenuKind, old: usize, new: usize) -> Result<bool> {
        self.ensure_ready()?;
        match self.menu.moved_order(kind, old, new, self.engine.order()) {
            Some(order) => Ok(self.apply_order(order)),
            None => {
                tracing::debug!(target: targets::TOOLBAR, ?kind, old, new, "menu move ignored");
                Ok(false)
            }
        }
    }

    /// Move the column at display position `from` to `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<bool> {
        self.ensure_ready()?;
        let mut order = self.engine.order().to_vec();
        if !array_change_position(&mut order, from, to) {
            return Ok(false);
        }
        Ok(self.apply_order(order))
    }

    fn apply_order(&mut self, order: Vec<usize>) -> bool {
        if !self.engine.set_order(order) {
            return false;
        }
        self.layout.recompute(&self.engine);
        self.events.column_reordered.emit(self.engine.order().to_vec());
        self.commit(false);
        true
    }

    /// Sort by a column. Unsortable columns are ignored.
    pub fn sort_by(&mut self, column: usize, direction: SortDirection) -> Result<()> {
        self.ensure_ready()?;
        let sortable = self
            .engine
            .data()
            .column(column)
            .map(|c| c.sortable)
            .ok_or_else(|| GridError::unknown_column(column))?;
        if !sortable {
            tracing::debug!(target: targets::CONTROLLER, column, "column is not sortable");
            return Ok(());
        }
        self.engine.set_sort(Some(SortSpec { column, direction }));
        self.commit(false);
        Ok(())
    }

    pub fn clear_sort(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.engine.set_sort(None);
        self.commit(false);
        Ok(())
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Go to a page. Returns the page shown, the first one when `page` does
    /// not exist.
    pub fn set_page(&mut self, page: usize) -> Result<usize> {
        self.ensure_ready()?;
        self.engine.set_page(page);
        Ok(self.commit(false).page)
    }

    /// Rows per page, `None` for all rows. Below two rows per page the search
    /// field is hidden and the global search cleared.
    pub fn set_page_length(&mut self, length: Option<usize>) -> Result<()> {
        self.ensure_ready()?;
        self.engine.set_page_length(length);
        let cleared = self.apply_search_field_rules();
        self.commit(cleared);
        Ok(())
    }

    pub fn page_length(&self) -> Option<usize> {
        self.engine.page_length()
    }

    // =========================================================================
    // Timers and layout
    // =========================================================================

    /// Record a viewport resize; the layout follows once resizing settles.
    pub fn notify_viewport_resized(&mut self, width: u32) {
        self.layout.notify_resized(width);
    }

    /// Run the debounced work whose delay has elapsed.
    pub fn process_timers(&mut self) -> TimerReport {
        let mut report = TimerReport::default();
        if self.persister.poll() {
            report.state_saved = true;
            self.events.state_saved.emit(self.persister.key().to_string());
        }
        if self.lifecycle == Lifecycle::Ready && self.layout.poll(&self.engine) {
            report.layout_changed = true;
            self.refresh_menu();
            self.events.layout_changed.emit(self.collapsed_columns());
        }
        report
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Draw once, notify observers and schedule a save.
    fn commit(&mut self, searched: bool) -> DrawReport {
        if searched {
            self.apply_tree_search();
            self.engine.select_last_page_if_out_of_range();
        }
        let report = {
            let _perf = PerfSpan::new(span_names::DRAW);
            self.engine.draw()
        };
        self.refresh_menu();
        self.notify_draw(&report);
        let state = self.view_state();
        self.persister.schedule(state);
        report
    }

    fn refresh_menu(&mut self) {
        self.menu
            .refresh(&self.engine, &self.filters, self.layout.collapsed());
    }

    fn notify_draw(&self, report: &DrawReport) {
        for event in &report.events {
            match event {
                EngineEvent::SearchApplied => self.events.search_applied.emit(()),
                EngineEvent::PageChanged { page } => {
                    self.events.page_changed.emit(*page);
                    if let Some(on_page_change) = &self.options.callbacks.on_page_change {
                        on_page_change(*page);
                    }
                }
                EngineEvent::Ordered | EngineEvent::Drawn => {}
            }
        }
        self.events.draw_complete.emit(report.clone());
        if let Some(on_draw) = &self.options.callbacks.on_draw {
            on_draw(report);
        }
    }
}

/// The display order for tree view: columns with a tree position are moved
/// there, in ascending order of their target.
fn tree_view_order(data: &TableData, list_order: &[usize]) -> Vec<usize> {
    let mut targets: Vec<(usize, usize)> = data
        .columns()
        .iter()
        .filter_map(|c| c.tree_order_ref.map(|target| (target, c.original_index)))
        .collect();
    targets.sort_unstable();

    let mut order = list_order.to_vec();
    for (target, column) in targets {
        let Some(from) = order.iter().position(|&c| c == column) else {
            continue;
        };
        if target < order.len() {
            array_change_position(&mut order, from, target);
        }
    }
    order
}
