use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("store timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Synchronous string key/value store backing the persisted auth slots.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object of string values, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read store file {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("parse store file {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        info!(path = %path.display(), keys = entries.len(), "file store opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(entries)?;
        // replace atomically
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            error!(error = %e, path = %self.path.display(), "store rename failed");
            e
        })?;
        debug!(path = %self.path.display(), keys = entries.len(), "store flushed");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("theme"), None);
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme").as_deref(), Some("light"));
        store.remove("theme").unwrap();
        assert_eq!(store.get("theme"), None);
        // removing twice is fine
        store.remove("theme").unwrap();
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set("marvel_user", r#"{"id":"abc"}"#).unwrap();
        store.set("last_username_change", "2024-01-01T00:00:00Z").unwrap();
        store.remove("last_username_change").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("marvel_user").as_deref(),
            Some(r#"{"id":"abc"}"#)
        );
        assert_eq!(reopened.get("last_username_change"), None);
    }

    #[test]
    fn file_store_keeps_a_tmp_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.tmp");

        let store = FileStore::open(&path).unwrap();
        store.set("marvel_user", r#"{"id":"xyz"}"#).unwrap();
        store.set("theme", "dark").unwrap();
        drop(store);

        assert!(path.exists());
        assert!(!dir.path().join("sessions.tmp.tmp").exists());
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("marvel_user").as_deref(), Some(r#"{"id":"xyz"}"#));
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn file_store_starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("missing.json")).unwrap();
        assert_eq!(store.get("marvel_credentials"), None);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("parse store file"));
    }
}
