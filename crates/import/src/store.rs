use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key-value storage.
pub trait PatternStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: PatternStore + ?Sized> PatternStore for Box<T> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// One `<key>.json` file per key under a directory. Writes go to a
/// temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        let file = if key.ends_with(".json") {
            key.to_string()
        } else {
            format!("{key}.json")
        };
        Ok(self.dir.join(file))
    }
}

impl PatternStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store. Clones share the same map, so a test can keep a handle
/// while the cache owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose saves always fail; loads still work.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.insert(key, value);
        store
    }

    pub fn insert(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl PatternStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let mut map = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let mut map = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        assert_eq!(store.load("patterns").unwrap(), None);

        store.save("patterns", "[1,2]").unwrap();
        assert_eq!(store.load("patterns").unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("nested/patterns.json").exists());
        assert!(!dir.path().join("nested/patterns.json.tmp").exists());

        store.save("patterns", "[]").unwrap();
        assert_eq!(store.load("patterns").unwrap().as_deref(), Some("[]"));

        store.remove("patterns").unwrap();
        assert_eq!(store.load("patterns").unwrap(), None);
        store.remove("patterns").unwrap();
    }

    #[test]
    fn file_store_accepts_json_suffix_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save("learned_patterns.json", "[]").unwrap();
        assert!(dir.path().join("learned_patterns.json").exists());
        assert_eq!(store.load("learned_patterns").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(store.save(key, "x"), Err(StoreError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save("k", "v").unwrap();
        assert_eq!(handle.get("k").as_deref(), Some("v"));
        handle.remove("k").unwrap();
        assert_eq!(store.load("k").unwrap(), None);
    }

    #[test]
    fn failing_store_rejects_saves() {
        let store = MemoryStore::failing_writes();
        assert!(store.save("k", "v").is_err());
        assert_eq!(store.load("k").unwrap(), None);
    }

    #[test]
    fn boxed_store_delegates() {
        let inner = MemoryStore::new();
        let boxed: Box<dyn PatternStore + Send> = Box::new(inner.clone());
        boxed.save("k", "v").unwrap();
        assert_eq!(inner.get("k").as_deref(), Some("v"));
    }
}
