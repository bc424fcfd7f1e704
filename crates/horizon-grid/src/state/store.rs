//! Where view state is kept between sessions.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use crate::error::{GridError, Result};
use crate::selectors::STATE_KEY_PREFIX;

/// Local store key for a table shown at `path`.
pub fn state_key(path: &str) -> String {
    format!("{STATE_KEY_PREFIX}{path}")
}

/// A key/value store for serialized view state.
pub trait StateStore: Send + Sync {
    /// The stored JSON for `key`, `None` if nothing was stored.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `json` under `key`, replacing any previous value.
    fn save(&self, key: &str, json: &str) -> Result<()>;
}

type LoadFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
type SaveFn = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// A store backed by caller-supplied callbacks, e.g. a preference service.
#[derive(Clone)]
pub struct SinkStore {
    load: LoadFn,
    save: SaveFn,
}

impl SinkStore {
    pub fn new<L, S>(load: L, save: S) -> Self
    where
        L: Fn(&str) -> Option<String> + Send + Sync + 'static,
        S: Fn(&str, &str) + Send + Sync + 'static,
    {
        Self {
            load: Arc::new(load),
            save: Arc::new(save),
        }
    }
}

impl fmt::Debug for SinkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkStore").finish_non_exhaustive()
    }
}

impl StateStore for SinkStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok((self.load)(key).filter(|json| !json.is_empty()))
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        (self.save)(key, json);
        Ok(())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-existing state, e.g. from a previous session.
    pub fn with_entry(self, key: impl Into<String>, json: impl Into<String>) -> Self {
        self.entries.lock().insert(key.into(), json.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Number of saves performed.
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), json.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// One JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory of an application.
    pub fn for_application(qualifier: &str, organization: &str, application: &str) -> Result<Self> {
        let dirs = ProjectDirs::from(qualifier, organization, application).ok_or(GridError::NoStateDirectory)?;
        Ok(Self::new(dirs.data_dir().join("table-state")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the state of `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(GridError::io(path, err)),
        }
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| GridError::io(&self.dir, e))?;
        let path = self.path_for(key);

        // Write beside the target so the rename stays on one filesystem.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "state.json".to_string());
        let temp_path = self.dir.join(format!(".{}.tmp.{}", file_name, std::process::id()));

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &path)
        };
        if let Err(err) = write() {
            fs::remove_file(&temp_path).ok();
            return Err(GridError::io(path, err));
        }
        tracing::trace!(target: targets::STATE, path = %path.display(), "state file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_key() {
        assert_eq!(state_key("/orders"), "DataTables_/orders");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new().with_entry("a", "{}");
        assert_eq!(store.load("a").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.load("b").unwrap(), None);
        store.save("b", "[]").unwrap();
        assert_eq!(store.get("b").as_deref(), Some("[]"));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_sink_store() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let sink = saved.clone();
        let store = SinkStore::new(
            |key| (key == "x").then(|| "{}".to_string()),
            move |key, json| sink.lock().push((key.to_string(), json.to_string())),
        );
        assert_eq!(store.load("x").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.load("y").unwrap(), None);
        store.save("x", "{\"page\":1}").unwrap();
        assert_eq!(saved.lock().as_slice(), &[("x".to_string(), "{\"page\":1}".to_string())]);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state"));
        let key = state_key("/customers/list");
        assert_eq!(store.load(&key).unwrap(), None);

        store.save(&key, "{\"page\":3}").unwrap();
        store.save(&key, "{\"page\":4}").unwrap();
        assert_eq!(store.load(&key).unwrap().as_deref(), Some("{\"page\":4}"));
        assert_eq!(
            store.path_for(&key).file_name().unwrap().to_string_lossy(),
            "DataTables__customers_list.json"
        );

        let leftovers = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .count();
        assert_eq!(leftovers, 0);
    }
}
