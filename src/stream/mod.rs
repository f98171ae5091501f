//! Stream decorators that splice persistence into an existing event flow

pub mod persist;
pub mod persist_results;

pub use persist::{Persist, with_persistence};
pub use persist_results::{PersistResults, with_persistence_results};

use tokio::task::JoinHandle;

/// One-shot restore machine carried by each decorator.
///
/// The load runs on the blocking pool, never inline with the first poll, so
/// its emission may interleave with or follow the source's early items.
enum Restore<T> {
    Idle,
    Loading(JoinHandle<Option<T>>),
    Done,
}
