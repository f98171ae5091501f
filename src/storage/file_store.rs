//! Atomic per-key record storage

use crate::core::{Result, StoreError};
use crate::storage::layout::StorageLayout;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};

/// One serialized record per key, replaced atomically on every write.
///
/// Writes go to a temp file that is flushed, synced and renamed over the
/// record, so a record on disk is always entirely the previous write's bytes
/// or entirely the latest successful write's bytes.
pub struct FileStore {
    layout: StorageLayout,
}

impl FileStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Serialize `value` and atomically replace the record for `key`.
    ///
    /// Encode failure leaves storage untouched.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        // Encode first; a value that does not serialize must not touch storage
        let serialized = serde_json::to_vec(value)
            .map_err(|e| StoreError::SerializationFailed(format!("Failed to encode record: {}", e)))?;
        let path = self.layout.resolve(key)?;

        let temp_path = path.with_extension("tmp");
        let temp_file = File::create(&temp_path)
            .map_err(|e| StoreError::IoFailed(format!("Failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(temp_file);
        writer.write_all(&serialized)
            .map_err(|e| StoreError::IoFailed(format!("Failed to write record: {}", e)))?;
        writer.flush()
            .map_err(|e| StoreError::IoFailed(format!("Failed to flush record: {}", e)))?;
        writer.get_mut().sync_all()
            .map_err(|e| StoreError::IoFailed(format!("Failed to sync record: {}", e)))?;
        fs::rename(&temp_path, &path)
            .map_err(|e| StoreError::IoFailed(format!("Failed to rename record: {}", e)))?;
        Ok(())
    }

    /// Load and decode the record for `key`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.layout.resolve(key)?;
        if !self.layout.exists(&path) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let mut file = File::open(&path)
            .map_err(|e| StoreError::IoFailed(format!("Failed to open record: {}", e)))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| StoreError::IoFailed(format!("Failed to read record: {}", e)))?;
        serde_json::from_slice(&data)
            .map_err(|e| StoreError::SerializationFailed(format!("Failed to decode record: {}", e)))
    }

    /// Delete the record for `key` if present
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.layout.resolve(key)?;
        self.layout.delete(&path)
    }

    pub fn exists(&self, key: &str) -> bool {
        match self.layout.resolve(key) {
            Ok(path) => self.layout.exists(&path),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        theme: String,
        font_size: u32,
    }

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::new(StorageLayout::new(dir.path(), "json"))
    }

    #[test]
    fn test_write_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let settings = Settings { theme: "dark".to_string(), font_size: 14 };

        store.write("settings", &settings).unwrap();
        let loaded: Settings = store.load("settings").unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_record_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let result = store.load::<Settings>("missing");
        assert!(matches!(result, Err(StoreError::NotFound(key)) if key == "missing"));
    }

    #[test]
    fn test_load_corrupt_record_is_serialization_failure() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, b"not json at all").unwrap();

        let result = store.load::<Settings>("broken");
        assert!(matches!(result, Err(StoreError::SerializationFailed(_))));
    }

    #[test]
    fn test_write_replaces_previous_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.write("counter", &1u64).unwrap();
        store.write("counter", &2u64).unwrap();

        let loaded: u64 = store.load("counter").unwrap();
        assert_eq!(loaded, 2);
    }

    #[test]
    fn test_write_leaves_no_temp_file_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.write("counter", &7u64).unwrap();
        assert!(temp_dir.path().join("counter.json").exists());
        assert!(!temp_dir.path().join("counter.tmp").exists());
    }

    #[test]
    fn test_remove_and_exists() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(!store.exists("counter"));
        store.write("counter", &3u64).unwrap();
        assert!(store.exists("counter"));

        store.remove("counter").unwrap();
        assert!(!store.exists("counter"));

        // Removing an absent record is not an error
        store.remove("counter").unwrap();
    }

    #[test]
    fn test_records_are_field_named_json() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let settings = Settings { theme: "dark".to_string(), font_size: 14 };

        store.write("settings", &settings).unwrap();
        let raw = fs::read_to_string(temp_dir.path().join("settings.json")).unwrap();
        assert!(raw.contains("\"theme\":\"dark\""));
    }
}
