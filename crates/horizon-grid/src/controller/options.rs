//! Per-table configuration.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{GridError, Result};
use crate::model::DrawReport;
use crate::selectors::DEFAULT_PAGE_LENGTH;

type Callback<Args> = Arc<dyn Fn(Args) + Send + Sync>;

/// Host callbacks invoked by the controller.
#[derive(Clone, Default)]
pub struct TableCallbacks {
    pub(crate) on_add: Option<Callback<()>>,
    pub(crate) on_page_change: Option<Callback<usize>>,
    pub(crate) on_draw: Option<Arc<dyn Fn(&DrawReport) + Send + Sync>>,
    pub(crate) on_init: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub(crate) on_refresh: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl fmt::Debug for TableCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCallbacks")
            .field("on_add", &self.on_add.is_some())
            .field("on_page_change", &self.on_page_change.is_some())
            .field("on_draw", &self.on_draw.is_some())
            .field("on_init", &self.on_init.is_some())
            .field("on_refresh", &self.on_refresh.is_some())
            .finish()
    }
}

/// Table options, usually parsed from the markup's custom options JSON.
///
/// Unknown keys are ignored; missing keys take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    /// Jump to the last valid page after the state was restored.
    pub check_page_on_init: bool,
    pub hide_search_field: bool,
    pub hide_buttons: bool,
    /// Neither load nor save view state.
    pub deactivate_table_state: bool,
    /// Show one row per page and hide the tree level buttons.
    pub init_as_single: bool,
    pub hide_tree_buttons: bool,
    /// Rows per page; `-1` shows all rows.
    pub page_length: Option<i64>,
    /// Store key; defaults to one derived from the table id.
    pub state_key: Option<String>,
    #[serde(skip)]
    pub(crate) callbacks: TableCallbacks,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the custom options JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(GridError::Options)
    }

    /// Rows per page, `None` for all rows.
    pub fn effective_page_length(&self) -> Option<usize> {
        if self.init_as_single {
            return Some(1);
        }
        match self.page_length {
            None => Some(DEFAULT_PAGE_LENGTH),
            Some(length) if length > 0 => usize::try_from(length).ok(),
            Some(_) => None,
        }
    }

    pub fn with_page_length(mut self, length: i64) -> Self {
        self.page_length = Some(length);
        self
    }

    pub fn with_state_key(mut self, key: impl Into<String>) -> Self {
        self.state_key = Some(key.into());
        self
    }

    /// Called by the add button.
    pub fn on_add<F>(mut self, f: F) -> Self
    where
        F: Fn(()) + Send + Sync + 'static,
    {
        self.callbacks.on_add = Some(Arc::new(f));
        self
    }

    /// Called with the new page after a page change.
    pub fn on_page_change<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.callbacks.on_page_change = Some(Arc::new(f));
        self
    }

    /// Called after every draw.
    pub fn on_draw<F>(mut self, f: F) -> Self
    where
        F: Fn(&DrawReport) + Send + Sync + 'static,
    {
        self.callbacks.on_draw = Some(Arc::new(f));
        self
    }

    /// Called with the table id once initialization completed.
    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_init = Some(Arc::new(f));
        self
    }

    /// Called with the table id by the refresh button.
    pub fn on_refresh<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_refresh = Some(Arc::new(f));
        self
    }

    pub fn has_add(&self) -> bool {
        self.callbacks.on_add.is_some()
    }

    /// Keep the callbacks of `self` on options parsed from elsewhere.
    pub(crate) fn merge_parsed(self, parsed: TableOptions) -> Self {
        Self {
            callbacks: self.callbacks,
            ..parsed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_parse_camel_case() {
        let options = TableOptions::from_json(
            r#"{"checkPageOnInit":true,"hideTreeButtons":true,"pageLength":25,"stateKey":"orders","unknown":1}"#,
        )
        .unwrap();
        assert!(options.check_page_on_init);
        assert!(options.hide_tree_buttons);
        assert!(!options.hide_search_field);
        assert_eq!(options.effective_page_length(), Some(25));
        assert_eq!(options.state_key.as_deref(), Some("orders"));
    }

    #[test]
    fn test_page_length_rules() {
        assert_eq!(TableOptions::new().effective_page_length(), Some(DEFAULT_PAGE_LENGTH));
        assert_eq!(TableOptions::new().with_page_length(-1).effective_page_length(), None);
        let single = TableOptions {
            init_as_single: true,
            ..TableOptions::new().with_page_length(50)
        };
        assert_eq!(single.effective_page_length(), Some(1));
    }

    #[test]
    fn test_malformed_options() {
        assert!(matches!(TableOptions::from_json("{"), Err(GridError::Options(_))));
    }

    #[test]
    fn test_merge_keeps_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let options = TableOptions::new().on_add(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let merged = options.merge_parsed(TableOptions::from_json(r#"{"hideButtons":true}"#).unwrap());
        assert!(merged.hide_buttons);
        assert!(merged.has_add());
        if let Some(add) = &merged.callbacks.on_add {
            add(());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
