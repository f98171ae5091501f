use std::path::{Path, PathBuf};

/// What a flush does with entries whose write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Default)]
pub enum FlushPolicy {
    /// Remove every entry after a flush, including ones whose write failed.
    /// A failed write's captured value is lost once the flush runs.
    #[default]
    DropAlways,
    /// Keep failed entries registered so the next flush retries them. A write
    /// registered for the same key during the flush still replaces them.
    RetainFailed,
}

/// Persistent store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one record file per key
    pub base_dir: PathBuf,

    /// Extension appended to record file names
    pub extension: String,

    /// Behavior for failed writes during a flush
    pub flush_policy: FlushPolicy,
}

impl StoreConfig {
    /// Create a configuration rooted at `base_dir`
    ///
    /// The directory is created lazily the first time a record path is
    /// resolved.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            extension: "json".to_string(),
            flush_policy: FlushPolicy::default(),
        }
    }

    /// Set the record file extension
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    /// Set the flush policy
    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }
}
