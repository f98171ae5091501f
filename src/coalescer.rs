//! Pending-write table with last-write-wins coalescing

use crate::config::FlushPolicy;
use crate::core::Result;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Mutex;

/// A deferred save action for one key, executed at flush time.
///
/// The closure captures the value to persist; invoking it serializes the
/// value and atomically stores it. `Fn` rather than `FnOnce` so an entry
/// retained under [`FlushPolicy::RetainFailed`] can run again at the next
/// flush.
pub type PendingWrite = Box<dyn Fn() -> Result<()> + Send>;

/// Outcome of a single flush
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushReport {
    /// Pending writes invoked by this flush
    pub attempted: usize,

    /// Writes that returned an error
    pub failed: usize,
}

impl FlushReport {
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Keyed table of pending writes.
///
/// At most one write is pending per key; registering a new one for an
/// existing key discards the previous one. Arbitrarily fast emission can
/// never grow the table beyond O(distinct keys).
pub struct WriteCoalescer {
    table: Mutex<HashMap<String, PendingWrite>>,
    policy: FlushPolicy,
}

impl WriteCoalescer {
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// Register a pending write for `key`, replacing any not-yet-flushed one.
    ///
    /// Performs no I/O.
    pub fn register(&self, key: &str, pending: PendingWrite) -> Result<()> {
        let mut table = self.table.lock()?;
        table.insert(key.to_string(), pending);
        Ok(())
    }

    /// Execute every pending write and clear the table.
    ///
    /// Writes run in unspecified order with the table unlocked, so new
    /// registrations are never blocked by in-flight I/O. Each failure is
    /// logged with its key. Under [`FlushPolicy::DropAlways`] all entries are
    /// gone after the flush regardless of outcome; under
    /// [`FlushPolicy::RetainFailed`] failed entries stay registered unless a
    /// newer write for the same key arrived during the flush.
    ///
    /// Blocks until every pending write has been attempted.
    pub fn flush(&self) -> Result<FlushReport> {
        let drained: HashMap<String, PendingWrite> = {
            let mut table = self.table.lock()?;
            std::mem::take(&mut *table)
        };

        if drained.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut report = FlushReport::default();
        let mut retained: Vec<(String, PendingWrite)> = Vec::new();

        for (key, pending) in drained {
            report.attempted += 1;
            match pending() {
                Ok(()) => {}
                Err(err) => {
                    report.failed += 1;
                    warn!("pending write failed: key='{}' error='{}'", key, err);
                    if self.policy == FlushPolicy::RetainFailed {
                        retained.push((key, pending));
                    }
                }
            }
        }

        if !retained.is_empty() {
            let mut table = self.table.lock()?;
            for (key, pending) in retained {
                // A write registered while the flush ran is newer; it wins.
                table.entry(key).or_insert(pending);
            }
        }

        if report.all_ok() {
            debug!("flushed {} pending writes", report.attempted);
        } else {
            warn!(
                "flushed {} pending writes, {} failed",
                report.attempted, report.failed
            );
        }
        Ok(report)
    }

    /// Number of pending writes currently registered
    pub fn len(&self) -> usize {
        self.table.lock().map(|table| table.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
