use crate::core::{Result, StoreError};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves record locations under a fixed base directory.
///
/// One record file per key: `<base>/<key>.<extension>`. The base directory
/// is created lazily the first time a path is resolved.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    base_dir: PathBuf,
    extension: String,
}

impl StorageLayout {
    pub fn new<P: AsRef<Path>>(base_dir: P, extension: &str) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            extension: extension.to_string(),
        }
    }

    /// Resolve the record path for a key, creating the base directory if it
    /// does not exist yet
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir)
                .map_err(|e| StoreError::IoFailed(format!("Failed to create store directory: {}", e)))?;
        }
        Ok(self.base_dir.join(format!("{}.{}", key, self.extension)))
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Delete the record file at `path`; a missing file is not an error
    pub fn delete(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| StoreError::IoFailed(format!("Failed to delete record: {}", e)))?;
        }
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
