//! Store facade tying the pending-write table to the file-backed records

use crate::coalescer::{FlushReport, PendingWrite, WriteCoalescer};
use crate::config::StoreConfig;
use crate::core::Result;
use crate::storage::{FileStore, StorageLayout};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;

/// Handle to one persistence store: a write-coalescing pending table in front
/// of an atomic per-key file store.
///
/// Cheap to clone; clones share the same pending-write table and storage
/// directory. Construct one per application and pass it to every
/// [`with_persistence`](crate::stream::with_persistence) call instead of
/// relying on ambient global state.
///
/// The owning application shell is expected to call [`flush`](Self::flush)
/// at its own suspend or shutdown point; nothing is written to disk until
/// then.
///
/// # Examples
///
/// ```no_run
/// use streamvault::PersistentStore;
///
/// # fn main() -> streamvault::Result<()> {
/// let store = PersistentStore::new("/var/lib/myapp/records");
///
/// store.stage("counter", 41u64)?;
/// store.stage("counter", 42u64)?; // replaces the pending 41
///
/// let report = store.flush()?; // invoked by the shell at suspend
/// assert!(report.all_ok());
/// assert_eq!(store.load::<u64>("counter")?, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PersistentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    files: FileStore,
    coalescer: WriteCoalescer,
}

impl PersistentStore {
    /// Open a store with the given configuration
    pub fn open(config: StoreConfig) -> Self {
        let layout = StorageLayout::new(&config.base_dir, &config.extension);
        Self {
            inner: Arc::new(StoreInner {
                files: FileStore::new(layout),
                coalescer: WriteCoalescer::new(config.flush_policy),
            }),
        }
    }

    /// Open a store under `base_dir` with the default configuration
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self::open(StoreConfig::new(base_dir))
    }

    /// Register a pending write for `key`, replacing any not-yet-flushed one.
    ///
    /// The write runs at the next [`flush`](Self::flush); until then only the
    /// in-memory table changes.
    pub fn register_write(&self, key: &str, pending: PendingWrite) -> Result<()> {
        self.inner.coalescer.register(key, pending)
    }

    /// Register a pending write that persists `value` under `key` at the next
    /// flush
    pub fn stage<T>(&self, key: &str, value: T) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let inner = self.inner.clone();
        let owned_key = key.to_string();
        self.register_write(key, Box::new(move || inner.files.write(&owned_key, &value)))
    }

    /// Execute every pending write and clear the table.
    ///
    /// This is the lifecycle hook: the application shell calls it once per
    /// "about to suspend" signal, synchronously. See
    /// [`WriteCoalescer::flush`] for the failure policy.
    pub fn flush(&self) -> Result<FlushReport> {
        self.inner.coalescer.flush()
    }

    /// Serialize `value` and atomically replace the record for `key`,
    /// bypassing the pending table
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.inner.files.write(key, value)
    }

    /// Load and decode the record for `key`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.inner.files.load(key)
    }

    /// Delete the record for `key` if present
    pub fn remove(&self, key: &str) -> Result<()> {
        self.inner.files.remove(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.inner.files.exists(key)
    }

    /// Number of writes currently waiting for the next flush
    pub fn pending_writes(&self) -> usize {
        self.inner.coalescer.len()
    }
}
