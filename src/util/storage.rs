//! Durable key/value storage for session persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! Plays the role browser `localStorage` plays for a web client: string keys,
//! string values, survives restarts. Writes are best effort; failures are
//! logged and never abort a session action.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Minimal `localStorage`-shaped interface.
pub trait KeyValueStorage: Send {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
}

/// Load a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unparseable stored value");
            None
        }
    }
}

/// Save a JSON value under `key`.
pub fn save_json<T: Serialize>(storage: &mut dyn KeyValueStorage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.set_item(key, &raw),
        Err(e) => tracing::warn!(key, error = %e, "failed to serialize value for storage"),
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-lifetime storage. Used by tests and `--ephemeral` CLI runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_owned(), value.to_owned());
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

// =============================================================================
// FILE-BACKED
// =============================================================================

/// JSON-object file holding every key. The whole map is rewritten on each
/// mutation via write-to-temp + rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open (or lazily create) storage at `path`. A missing or corrupt file
    /// starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = read_items(&path);
        Self { path, items }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        if let Err(e) = write_items(&self.path, &self.items) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist storage");
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_owned(), value.to_owned());
        self.flush();
    }

    fn remove_item(&mut self, key: &str) {
        if self.items.remove(key).is_some() {
            self.flush();
        }
    }
}

fn read_items(path: &Path) -> BTreeMap<String, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read storage");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "storage file corrupt; starting empty");
        BTreeMap::new()
    })
}

fn write_items(path: &Path, items: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(items).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, raw)?;
    fs::rename(&tmp, path)
}
