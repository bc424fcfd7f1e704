//! Tables of one page, and what they do together.

use std::collections::HashMap;
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use super::TableController;

/// A controller shared between the registry and its host.
pub type SharedTable = Arc<Mutex<TableController>>;

/// The tables known to a host, in registration order.
///
/// In single-data mode every table shows one row per page; leaving the mode
/// restores each table's former page length.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: Vec<(String, SharedTable)>,
    single_data: bool,
    former_lengths: HashMap<String, Option<usize>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table registered under the same id.
    pub fn register(&mut self, table: TableController) -> SharedTable {
        let id = table.id().to_string();
        let shared = Arc::new(Mutex::new(table));
        match self.tables.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => {
                tracing::warn!(target: targets::CONTROLLER, table = %id, "replacing registered table");
                entry.1 = shared.clone();
            }
            None => self.tables.push((id, shared.clone())),
        }
        shared
    }

    pub fn get(&self, id: &str) -> Option<SharedTable> {
        self.tables
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, table)| table.clone())
    }

    /// Remove and destroy a table.
    pub fn remove(&mut self, id: &str) -> Option<SharedTable> {
        let index = self.tables.iter().position(|(existing, _)| existing == id)?;
        let (_, table) = self.tables.remove(index);
        table.lock().destroy();
        self.former_lengths.remove(id);
        Some(table)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn is_single_data(&self) -> bool {
        self.single_data
    }

    /// Enter or leave single-data mode across all ready tables.
    pub fn set_single_data(&mut self, single: bool) {
        if self.single_data == single {
            return;
        }
        self.single_data = single;
        for (id, table) in &self.tables {
            let mut table = table.lock();
            if !table.is_ready() {
                continue;
            }
            let length = if single {
                self.former_lengths.insert(id.clone(), table.page_length());
                Some(1)
            } else {
                self.former_lengths.remove(id).unwrap_or(table.options().effective_page_length())
            };
            if let Err(err) = table.set_page_length(length) {
                tracing::warn!(target: targets::CONTROLLER, table = %id, error = %err, "page length not changed");
            }
        }
        tracing::debug!(target: targets::CONTROLLER, single, tables = self.tables.len(), "single-data mode changed");
    }

    /// Show the page of `source` on every other ready table.
    /// Returns the number of tables that followed.
    pub fn sync_page(&self, source: &str) -> usize {
        let Some(page) = self.get(source).map(|t| t.lock().engine().page()) else {
            tracing::warn!(target: targets::CONTROLLER, table = %source, "page sync from unknown table");
            return 0;
        };
        let mut synced = 0;
        for (id, table) in &self.tables {
            if id == source {
                continue;
            }
            let mut table = table.lock();
            if table.is_ready() && table.set_page(page).is_ok() {
                synced += 1;
            }
        }
        synced
    }

    /// Run due timers of every table. Returns the number of tables that
    /// saved state.
    pub fn process_timers(&self) -> usize {
        self.tables
            .iter()
            .filter(|(_, table)| table.lock().process_timers().state_saved)
            .count()
    }

    /// Destroy every table, writing pending state.
    pub fn destroy_all(&mut self) {
        for (_, table) in self.tables.drain(..) {
            table.lock().destroy();
        }
        self.former_lengths.clear();
        self.single_data = false;
    }
}

#[cfg(test)]
mod tests {
    use horizon_grid_core::ManualClock;

    use super::*;
    use crate::controller::TableOptions;
    use crate::model::{Column, Row, TableData};

    fn create_test_table(id: &str, rows: i64, options: TableOptions) -> TableController {
        let data = TableData::new(
            vec![Column::new("name", 0)],
            (1..=rows).map(|i| Row::new(i, vec![format!("row {i}").into()])).collect(),
        );
        let mut table = TableController::new(id, data, options).with_clock(Arc::new(ManualClock::new()));
        table.initialize().unwrap();
        table
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TableRegistry::new();
        registry.register(create_test_table("a", 3, TableOptions::new()));
        registry.register(create_test_table("b", 3, TableOptions::new()));
        registry.register(create_test_table("a", 5, TableOptions::new()));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().lock().data().row_count(), 5);

        let removed = registry.remove("a").unwrap();
        assert!(!removed.lock().is_ready());
        assert!(registry.get("a").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_single_data_restores_former_lengths() {
        let mut registry = TableRegistry::new();
        registry.register(create_test_table("a", 30, TableOptions::new().with_page_length(25)));
        registry.register(create_test_table("b", 30, TableOptions::new()));

        registry.set_single_data(true);
        assert!(registry.is_single_data());
        assert_eq!(registry.get("a").unwrap().lock().page_length(), Some(1));
        assert_eq!(registry.get("b").unwrap().lock().page_length(), Some(1));

        registry.set_single_data(false);
        assert_eq!(registry.get("a").unwrap().lock().page_length(), Some(25));
        assert_eq!(registry.get("b").unwrap().lock().page_length(), Some(10));
    }

    #[test]
    fn test_sync_page() {
        let mut registry = TableRegistry::new();
        let a = registry.register(create_test_table("a", 5, TableOptions::new()));
        registry.register(create_test_table("b", 5, TableOptions::new()));
        registry.register(create_test_table("c", 2, TableOptions::new()));
        registry.set_single_data(true);

        a.lock().set_page(3).unwrap();
        assert_eq!(registry.sync_page("a"), 2);
        assert_eq!(registry.get("b").unwrap().lock().engine().page(), 3);
        assert_eq!(registry.get("c").unwrap().lock().engine().page(), 0);
        assert_eq!(registry.sync_page("missing"), 0);
    }
}
