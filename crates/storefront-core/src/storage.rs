// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Local key-value storage
//
// Each key is a named slot holding one string value.
// Files on disk for real devices, a map in memory for embedding and tests.

use crate::types::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable string slots addressed by key
pub trait KeyValueStorage: Send + Sync {
    /// Read a slot, `None` if it was never written
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value of a slot
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a slot; deleting a missing slot is not an error.
    ///
    /// [`CartStore`](crate::CartStore) never deletes its slot, clearing the
    /// cart writes an empty list instead. This is for embedders that retire
    /// a slot, e.g. after switching `storage_key` or on sign-out.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Check that a key is usable as a slot name
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidConfig("Storage key is empty".to_string()));
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::InvalidConfig(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }

    Ok(())
}

/// File-backed storage: one `<key>.json` file per slot inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage in the platform data directory
    pub fn new() -> Result<Self, StoreError> {
        let dir = directories::ProjectDirs::from("com", "storefront", "cart")
            .ok_or_else(|| StoreError::FileIo("Could not determine data directory".to_string()))?
            .data_dir()
            .to_path_buf();

        Self::in_dir(dir)
    }

    /// Open storage in an explicit directory, creating it if needed
    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::FileIo(format!("Failed to create data dir: {}", e)))?;

        tracing::debug!("Cart storage directory: {:?}", dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::FileIo(format!("Failed to read {}: {}", key, e)))?;
        Ok(Some(content))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        // Rename over the old file so readers never see a partial write
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, value)
            .map_err(|e| StoreError::FileIo(format!("Failed to write {}: {}", key, e)))?;
        fs::rename(&tmp_path, &path)
            .map_err(|e| StoreError::FileIo(format!("Failed to replace {}: {}", key, e)))?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::FileIo(format!("Failed to remove {}: {}", key, e))),
        }
    }
}

/// In-memory storage
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.slots.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path()).unwrap();

        assert_eq!(storage.get_item("cartItems").unwrap(), None);

        storage.set_item("cartItems", "[]").unwrap();
        assert_eq!(storage.get_item("cartItems").unwrap().as_deref(), Some("[]"));

        storage.set_item("cartItems", "[1]").unwrap();
        assert_eq!(storage.get_item("cartItems").unwrap().as_deref(), Some("[1]"));
        assert!(!dir.path().join("cartItems.json.tmp").exists());

        storage.remove_item("cartItems").unwrap();
        storage.remove_item("cartItems").unwrap();
        assert_eq!(storage.get_item("cartItems").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path()).unwrap();

        assert!(storage.set_item("../escape", "x").is_err());
        assert!(storage.get_item("").is_err());
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set_item("a", "1").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
    }
}
