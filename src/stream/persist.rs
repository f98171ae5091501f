use crate::core::StoreError;
use crate::store::PersistentStore;
use crate::stream::Restore;
use futures::Stream;
use log::warn;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Wrap `source` so its latest value is persisted under `key` via `store`.
///
/// On the first poll a restore of the previously persisted record starts on
/// the blocking pool. If a record exists, its value is emitted once as an
/// out-of-band item and the record is deleted, so the next subscription under
/// the same key starts from empty state. No ordering is guaranteed between
/// the restored value and live values emitted before the restore completes.
///
/// Every live item registers a coalesced pending write for `key`, replacing
/// any not-yet-flushed one. Nothing reaches disk until the store's `flush`
/// runs. Dropping the returned stream does not cancel a registered pending
/// write.
///
/// Persistence failures are logged and never surfaced to the consumer.
pub fn with_persistence<S>(source: S, key: impl Into<String>, store: &PersistentStore) -> Persist<S>
where
    S: Stream + Unpin,
    S::Item: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    Persist::new(source, key, store)
}

/// Stream decorator built by [`with_persistence`].
///
/// Forwards the source's items unchanged; see the factory for the
/// persistence side behavior.
pub struct Persist<S: Stream> {
    source: S,
    key: String,
    store: PersistentStore,
    restore: Restore<S::Item>,
}

impl<S> Persist<S>
where
    S: Stream + Unpin,
    S::Item: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    pub fn new(source: S, key: impl Into<String>, store: &PersistentStore) -> Self {
        Self {
            source,
            key: key.into(),
            store: store.clone(),
            restore: Restore::Idle,
        }
    }
}

impl<S> Stream for Persist<S>
where
    S: Stream + Unpin,
    S::Item: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.as_mut().get_mut();

        if let Restore::Idle = this.restore {
            let store = this.store.clone();
            let key = this.key.clone();
            this.restore = Restore::Loading(tokio::task::spawn_blocking(move || {
                match store.load::<S::Item>(&key) {
                    Ok(value) => Some(value),
                    Err(StoreError::NotFound(_)) => None,
                    Err(err) => {
                        warn!("restore failed: key='{}' error='{}'", key, err);
                        None
                    }
                }
            }));
        }

        if let Restore::Loading(handle) = &mut this.restore {
            match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(Some(value))) => {
                    this.restore = Restore::Done;
                    // Consume the record so it restores at most once; a later
                    // flush under this key starts from empty state.
                    if let Err(err) = this.store.remove(&this.key) {
                        warn!("failed to remove restored record: key='{}' error='{}'", this.key, err);
                    }
                    return Poll::Ready(Some(value));
                }
                Poll::Ready(Ok(None)) | Poll::Ready(Err(_)) => {
                    this.restore = Restore::Done;
                }
                // Load still in flight; live items pass through meanwhile.
                Poll::Pending => {}
            }
        }

        match Pin::new(&mut this.source).poll_next(cx) {
            Poll::Ready(Some(item)) => {
                if let Err(err) = this.store.stage(&this.key, item.clone()) {
                    warn!("failed to register pending write: key='{}' error='{}'", this.key, err);
                }
                Poll::Ready(Some(item))
            }
            other => other,
        }
    }
}
