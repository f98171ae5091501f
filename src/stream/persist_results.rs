use crate::core::StoreError;
use crate::store::PersistentStore;
use crate::stream::Restore;
use futures::Stream;
use log::warn;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// [`with_persistence`](crate::stream::with_persistence) specialized for a
/// stream of success/failure-wrapped values.
///
/// Only `Ok` items register pending writes; `Err` items are forwarded with no
/// persistence effect. A restored record is emitted as a synthetic `Ok` item
/// but, unlike the plain operator, is **not** deleted afterwards: the same
/// value restores again on a later subscription unless a newer flush
/// overwrites it. That retention is this operator's documented policy.
pub fn with_persistence_results<S, T, E>(
    source: S,
    key: impl Into<String>,
    store: &PersistentStore,
) -> PersistResults<S, T>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    PersistResults::new(source, key, store)
}

/// Stream decorator built by [`with_persistence_results`].
pub struct PersistResults<S, T> {
    source: S,
    key: String,
    store: PersistentStore,
    restore: Restore<T>,
}

impl<S, T> PersistResults<S, T> {
    pub fn new(source: S, key: impl Into<String>, store: &PersistentStore) -> Self {
        Self {
            source,
            key: key.into(),
            store: store.clone(),
            restore: Restore::Idle,
        }
    }
}

impl<S, T, E> Stream for PersistResults<S, T>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.as_mut().get_mut();

        if let Restore::Idle = this.restore {
            let store = this.store.clone();
            let key = this.key.clone();
            // The record is kept in place; only the plain operator consumes it.
            this.restore = Restore::Loading(tokio::task::spawn_blocking(move || {
                match store.load::<T>(&key) {
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
                    return Poll::Ready(Some(Ok(value)));
                }
                Poll::Ready(Ok(None)) | Poll::Ready(Err(_)) => {
                    this.restore = Restore::Done;
                }
                Poll::Pending => {}
            }
        }

        match Pin::new(&mut this.source).poll_next(cx) {
            Poll::Ready(Some(item)) => {
                if let Ok(value) = &item {
                    if let Err(err) = this.store.stage(&this.key, value.clone()) {
                        warn!("failed to register pending write: key='{}' error='{}'", this.key, err);
                    }
                }
                Poll::Ready(Some(item))
            }
            other => other,
        }
    }
}
