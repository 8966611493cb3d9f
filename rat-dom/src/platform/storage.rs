//! Local key-value storage.

use crate::error::{SerializationSnafu, StorageSnafu};
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// String key-value storage that outlives a single view.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> crate::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> crate::Result<()>;
    fn remove_item(&self, key: &str) -> crate::Result<()>;
}

/// Storage that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> crate::Result<Option<String>> {
        let items = self.items.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> crate::Result<()> {
        let mut items = self.items.lock().map_err(|_| crate::Error::LockPoisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> crate::Result<()> {
        let mut items = self.items.lock().map_err(|_| crate::Error::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// Storage persisted as one JSON object in a file. Every write rewrites the file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).context(SerializationSnafu)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).context(StorageSnafu { path: path.clone() }),
        };
        debug!(path = %path.display(), "opened file storage");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> crate::Result<()> {
        let raw = serde_json::to_string_pretty(items).context(SerializationSnafu)?;
        std::fs::write(&self.path, raw).context(StorageSnafu { path: self.path.clone() })
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> crate::Result<Option<String>> {
        let items = self.items.lock().map_err(|_| crate::Error::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> crate::Result<()> {
        let mut items = self.items.lock().map_err(|_| crate::Error::LockPoisoned)?;
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> crate::Result<()> {
        let mut items = self.items.lock().map_err(|_| crate::Error::LockPoisoned)?;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next)?;
        *items = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("todos").unwrap(), None);
        storage.set_item("todos", "[]").unwrap();
        assert_eq!(storage.get_item("todos").unwrap().as_deref(), Some("[]"));
        storage.remove_item("todos").unwrap();
        assert_eq!(storage.get_item("todos").unwrap(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set_item("todos", "[{\"id\":1}]").unwrap();
            storage.set_item("theme", "dark").unwrap();
            storage.remove_item("theme").unwrap();
        }
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("todos").unwrap().as_deref(), Some("[{\"id\":1}]"));
        assert_eq!(reopened.get_item("theme").unwrap(), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        std::fs::create_dir(path.parent().unwrap()).unwrap();
        let storage = FileStorage::open(&path).unwrap();
        storage.set_item("todos", "[]").unwrap();

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
        assert!(matches!(
            storage.set_item("todos", "[{\"id\":1}]"),
            Err(crate::Error::Storage { .. })
        ));
        assert!(storage.remove_item("todos").is_err());
        assert_eq!(storage.get_item("todos").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStorage::open(&path), Err(crate::Error::Serialization { .. })));
    }

    #[test]
    fn test_file_storage_starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("missing.json")).unwrap();
        assert_eq!(storage.get_item("anything").unwrap(), None);
    }
}
