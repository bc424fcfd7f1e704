//! End-to-end behavior of tables built from markup and driven through the
//! controller: tree toggling, search reveal, persisted reorders and sorting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_grid::prelude::*;
use horizon_grid::selectors::{STATE_WRITE_TIMEOUT, attrs, classes};
use parking_lot::Mutex;

// ── Helpers ─────────────────────────────────────────────────────────────

fn ids(values: &[i64]) -> Vec<RowId> {
    values.iter().map(|&v| RowId(v)).collect()
}

/// Tree table: 1 ─┬─ 2 ── 4
///                └─ 3
fn create_tree_markup() -> TableMarkup {
    TableMarkup::new(vec![
        HeaderCell::new("").class(classes::HIERARCHY_DATA),
        HeaderCell::new("Name"),
        HeaderCell::new("City"),
    ])
    .class(classes::TREE_TABLE)
    .with_footer(vec![
        FooterCell::new().class(classes::NON_FILTERABLE),
        FooterCell::new(),
        FooterCell::new().class(classes::SELECT_FILTER),
    ])
    .with_row(vec![BodyCell::hierarchy(1, 0, 0), "Root".into(), "Berlin".into()])
    .with_row(vec![BodyCell::hierarchy(2, 1, 1), "Branch".into(), "Köln".into()])
    .with_row(vec![BodyCell::hierarchy(4, 2, 2), "Leaf".into(), "Köln".into()])
    .with_row(vec![BodyCell::hierarchy(3, 1, 1), "abc".into(), "Berlin".into()])
}

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("horizon_grid=debug")
        .try_init();
}

fn create_table(store: Arc<dyn StateStore>, clock: &ManualClock) -> TableController {
    setup();
    let mut table = TableController::from_markup("orders", &create_tree_markup(), TableOptions::new())
        .unwrap()
        .with_store(store)
        .with_clock(Arc::new(clock.clone()));
    table.initialize().unwrap();
    table
}

// ── Tree ────────────────────────────────────────────────────────────────

#[test]
fn collapsing_a_branch_collapses_its_descendants() {
    let clock = ManualClock::new();
    let mut table = create_table(Arc::new(MemoryStore::new()), &clock);
    assert_eq!(table.displayed_row_ids(), ids(&[1]));

    table.toggle_branch(RowId(1)).unwrap();
    table.toggle_branch(RowId(2)).unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 2, 4, 3]));

    assert_eq!(table.toggle_branch(RowId(1)).unwrap(), Toggle::Collapsed);
    assert_eq!(table.displayed_row_ids(), ids(&[1]));

    table.toggle_branch(RowId(1)).unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 2, 3]));
}

#[test]
fn children_listed_before_parents_display_under_them() {
    let markup = TableMarkup::new(vec![
        HeaderCell::new("").class(classes::HIERARCHY_DATA),
        HeaderCell::new("Name"),
    ])
    .class(classes::TREE_TABLE)
    .with_footer(vec![FooterCell::new().class(classes::NON_FILTERABLE), FooterCell::new()])
    .with_row(vec![BodyCell::hierarchy(2, 1, 1), "Mitte".into()])
    .with_row(vec![BodyCell::hierarchy(5, 0, 0), "Hamburg".into()])
    .with_row(vec![BodyCell::hierarchy(1, 0, 0), "Berlin".into()])
    .with_row(vec![BodyCell::hierarchy(6, 2, 2), "Wedding".into()]);
    setup();
    let mut table = TableController::from_markup("districts", &markup, TableOptions::new())
        .unwrap()
        .with_clock(Arc::new(ManualClock::new()));
    table.initialize().unwrap();
    assert_eq!(table.engine().sort(), None);
    assert_eq!(table.displayed_row_ids(), ids(&[1, 5]));

    table.display_level(2).unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 2, 6, 5]));
}

#[test]
fn search_reveals_ancestors_and_restores_branches() {
    let clock = ManualClock::new();
    let mut table = create_table(Arc::new(MemoryStore::new()), &clock);

    table.set_global_search("abc").unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 3]));
    assert!(table.shown_branches().contains(RowId(1)));
    assert!(!table.branches().contains(RowId(1)));

    table.set_global_search("leaf").unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 2, 4]));

    table.set_global_search("").unwrap();
    assert!(!table.is_tree_filtered());
    assert_eq!(table.displayed_row_ids(), ids(&[1]));
}

// ── Persistence ─────────────────────────────────────────────────────────

#[test]
fn reorder_and_filter_survive_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(dir.path()));
    let clock = ManualClock::new();

    let mut table = create_table(store.clone(), &clock);
    assert!(table.move_column(2, 1).unwrap());
    table
        .set_filter(2, FilterValue::Selection(vec!["Berlin".into()]))
        .unwrap();
    clock.advance(STATE_WRITE_TIMEOUT);
    assert!(table.process_timers().state_saved);
    assert!(dir.path().join("DataTables_orders.json").exists());
    table.destroy();

    let reloaded = create_table(store, &clock);
    assert_eq!(reloaded.engine().order(), &[0, 2, 1]);
    assert_eq!(
        reloaded.filter(2).unwrap().value(),
        &FilterValue::Selection(vec!["Berlin".into()])
    );
    assert!(!reloaded.filters().is_active(1));
    assert_eq!(reloaded.displayed_row_ids(), ids(&[1, 3]));
}

#[test]
fn hidden_column_keeps_its_filter_across_reload() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new();

    let mut table = create_table(store.clone(), &clock);
    table
        .set_filter(2, FilterValue::Selection(vec!["Köln".into()]))
        .unwrap();
    assert!(table.set_column_visible(2, false).unwrap());
    table.destroy();
    assert_eq!(store.write_count(), 1);

    let reloaded = create_table(store, &clock);
    assert!(!reloaded.engine().is_column_visible(2));
    assert!(reloaded.filters().is_active(2));
    assert_eq!(reloaded.displayed_row_ids(), ids(&[1, 2, 4]));
}

#[test]
fn saves_coalesce_into_one_write() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new();
    let mut table = create_table(store.clone(), &clock);

    for _ in 0..5 {
        table.toggle_branch(RowId(1)).unwrap();
    }
    assert!(!table.process_timers().state_saved);
    clock.advance(STATE_WRITE_TIMEOUT);
    assert!(table.process_timers().state_saved);
    assert_eq!(store.write_count(), 1);

    let saved = ViewState::from_json("orders", &store.get("DataTables_orders").unwrap()).unwrap();
    assert_eq!(saved.visible_row_parent_ids.ids(), &[RowId::ROOT, RowId(1)]);
}

#[test]
fn view_state_json_uses_shared_field_names() {
    let json = r#"{"columnOrder":[1,0],"columnFilterState":[{"val":"x"},{"val":""}],"visibleRowParentIds":[0,7],"showSearchField":true,"showColumnFilters":false}"#;
    let state = ViewState::from_json("k", json).unwrap();
    assert_eq!(state.column_order, vec![1, 0]);
    assert_eq!(state.column_filter_values, vec!["x", ""]);
    assert!(!state.column_filters_visible);

    let written = state.to_json().unwrap();
    for field in ["columnOrder", "columnFilterState", "visibleRowParentIds", "showColumnFilters"] {
        assert!(written.contains(field), "missing {field} in {written}");
    }
    assert_eq!(ViewState::from_json("k", &written).unwrap(), state);
}

// ── Sorting and paging ──────────────────────────────────────────────────

fn create_list(names: &[&str]) -> TableController {
    let data = TableData::new(
        vec![Column::new("name", 0)],
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Row::new(i as i64 + 1, vec![(*name).into()]))
            .collect(),
    );
    setup();
    let mut table = TableController::new("list", data, TableOptions::new())
        .with_clock(Arc::new(ManualClock::new()));
    table.initialize().unwrap();
    table
}

#[test]
fn sorting_folds_german_characters() {
    let mut table = create_list(&["Zebra", "Äpfel", "Apfel", "Ober"]);

    table.sort_by(0, SortDirection::Ascending).unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[2, 3, 4, 1]));

    table.sort_by(0, SortDirection::Descending).unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 4, 3, 2]));

    let mut table = create_list(&["Übel", "Apfel", "öl"]);
    table.sort_by(0, SortDirection::Ascending).unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[2, 3, 1]));
}

#[test]
fn page_changes_are_signalled_once_per_operation() {
    let names: Vec<String> = (1..=25).map(|i| format!("row {i:02}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut table = create_list(&names);

    let pages = Arc::new(Mutex::new(Vec::new()));
    let sink = pages.clone();
    table.events().page_changed.connect(move |page| sink.lock().push(*page));
    let draws = Arc::new(AtomicUsize::new(0));
    let counter = draws.clone();
    table.events().draw_complete.connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(table.set_page(2).unwrap(), 2);
    assert_eq!(table.page_row_ids(), (21..=25).map(RowId).collect::<Vec<_>>());
    assert_eq!(table.set_page(7).unwrap(), 0);
    assert_eq!(pages.lock().as_slice(), &[2, 0]);
    assert_eq!(draws.load(Ordering::SeqCst), 2);
}

// ── Markup ──────────────────────────────────────────────────────────────

#[test]
fn markup_options_and_presets_apply_on_first_draw() {
    let markup = TableMarkup::new(vec![
        HeaderCell::new("").class(classes::HIERARCHY_DATA),
        HeaderCell::new("Name").attr(attrs::PRESET_FILTER, "Ham"),
        HeaderCell::new("Amount").class(classes::NUMBER_COLUMN),
    ])
    .class(classes::TREE_TABLE)
    .attr(attrs::TABLE_CUSTOM_OPTIONS, r#"{"pageLength":2,"hideTreeButtons":true}"#)
    .attr(attrs::SHOW_REFRESH_BUTTON, "")
    .with_footer(vec![
        FooterCell::new().class(classes::NON_FILTERABLE),
        FooterCell::new(),
        FooterCell::new().class(classes::NON_FILTERABLE),
    ])
    .with_row(vec![BodyCell::hierarchy(1, 0, 0), "Berlin".into(), "1.000,50".into()])
    .with_row(vec![BodyCell::hierarchy(2, 1, 1), "Mitte".into(), "12".into()])
    .with_row(vec![BodyCell::hierarchy(3, 0, 0), "Hamburg".into(), "3".into()]);

    let initialized = Arc::new(Mutex::new(None));
    let sink = initialized.clone();
    let options = TableOptions::new().on_init(move |id| *sink.lock() = Some(id.to_string()));
    let mut table = TableController::from_markup("cities", &markup, options).unwrap();
    table.initialize().unwrap();

    assert_eq!(initialized.lock().as_deref(), Some("cities"));
    assert_eq!(table.page_length(), Some(2));
    assert!(table.features().tree);
    assert!(table.toolbar().is_shown(ButtonKind::Refresh));
    assert!(!table.toolbar().is_shown(ButtonKind::TreeLevels));
    assert!(table.filters().is_active(1));
    assert_eq!(table.displayed_row_ids(), ids(&[3]));

    table.clear_all_filters().unwrap();
    assert_eq!(table.displayed_row_ids(), ids(&[1, 3]));
    assert!(table.table_classes().contains(&classes::TREE_TABLE));
}

#[test]
fn malformed_custom_options_are_ignored() {
    let markup = TableMarkup::new(vec![HeaderCell::new("Name")])
        .attr(attrs::TABLE_CUSTOM_OPTIONS, "{not json")
        .with_row(vec!["a".into()]);
    let mut table = TableController::from_markup("plain", &markup, TableOptions::new().with_page_length(5)).unwrap();
    table.initialize().unwrap();
    assert_eq!(table.page_length(), Some(5));
    assert_eq!(table.view_mode(), ViewMode::List);
}

#[test]
fn markup_without_header_is_rejected() {
    let markup = TableMarkup::new(Vec::new());
    assert!(matches!(
        TableController::from_markup("broken", &markup, TableOptions::new()),
        Err(GridError::Markup(_))
    ));
}
