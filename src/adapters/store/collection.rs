//! Typed, versioned collections on top of a [`KeyValueStore`]

use super::traits::{KeyValueStore, SwapOutcome};
use crate::domain::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default number of read-modify-write attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

const BASE_BACKOFF_MS: u64 = 10;

/// A JSON array of `T` stored under one key
///
/// Writers sharing a collection (it and its clones) are serialized by a
/// write lock, so they never race each other. Writers elsewhere, such as a
/// second handle on the same store or another process, are caught by
/// compare-and-swap and retried with backoff up to `max_attempts` times.
pub struct JsonCollection<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    max_attempts: usize,
    write_lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonCollection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            max_attempts: self.max_attempts,
            write_lock: Arc::clone(&self.write_lock),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            write_lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Loads the whole collection (empty if the key is absent)
    pub async fn load(&self) -> Result<Vec<T>> {
        Ok(self.load_versioned().await?.1)
    }

    /// Applies `mutate` to the current items and stores the result
    ///
    /// `mutate` may run more than once if another writer commits in between.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if every attempt lost the race to an
    /// outside writer.
    pub async fn update<F, R>(&self, mut mutate: F) -> Result<R>
    where
        F: FnMut(&mut Vec<T>) -> R + Send,
        R: Send,
    {
        let _guard = self.write_lock.lock().await;

        for attempt in 1..=self.max_attempts {
            let (version, mut items) = self.load_versioned().await?;
            let outcome = mutate(&mut items);

            let value = serde_json::to_value(&items)?;
            match self.store.compare_and_swap(&self.key, version, value).await? {
                SwapOutcome::Written(new_version) => {
                    tracing::trace!(key = %self.key, version = new_version, "Collection updated");
                    return Ok(outcome);
                }
                SwapOutcome::Conflict(current) => {
                    tracing::debug!(
                        key = %self.key,
                        attempt = attempt,
                        expected = version,
                        current = current,
                        "Write conflict, retrying"
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(backoff(attempt)).await;
                    }
                }
            }
        }

        Err(StoreError::Conflict {
            key: self.key.clone(),
            attempts: self.max_attempts,
        }
        .into())
    }

    async fn load_versioned(&self) -> Result<(u64, Vec<T>)> {
        match self.store.get(&self.key).await? {
            None => Ok((0, Vec::new())),
            Some(entry) => {
                let items = serde_json::from_value(entry.value).map_err(|e| StoreError::Corrupt {
                    key: self.key.clone(),
                    message: e.to_string(),
                })?;
                Ok((entry.version, items))
            }
        }
    }
}

/// Exponential delay before retry `attempt + 1`, capped at 640ms
fn backoff(attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6) as u32;
    Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::memory::MemoryStore;
    use crate::adapters::store::traits::Versioned;
    use crate::domain::LavendairError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_update_and_load() {
        let collection: JsonCollection<u32> = JsonCollection::new(Arc::new(MemoryStore::new()), "nums");
        assert!(collection.load().await.unwrap().is_empty());

        collection.update(|items| items.push(1)).await.unwrap();
        let len = collection
            .update(|items| {
                items.push(2);
                items.len()
            })
            .await
            .unwrap();

        assert_eq!(len, 2);
        assert_eq!(collection.load().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let collection: JsonCollection<usize> =
            JsonCollection::new(Arc::new(MemoryStore::new()), "nums").with_max_attempts(1);

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let c = collection.clone();
                tokio::spawn(async move { c.update(|items| items.push(i)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut items = collection.load().await.unwrap();
        items.sort_unstable();
        assert_eq!(items, (0..40).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_separate_handles_retry_on_conflict() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first: JsonCollection<u32> = JsonCollection::new(Arc::clone(&store), "nums");
        let second: JsonCollection<u32> = JsonCollection::new(store, "nums");

        let (a, b) = tokio::join!(
            first.update(|items| items.push(1)),
            second.update(|items| items.push(2))
        );
        a.unwrap();
        b.unwrap();

        let mut items = first.load().await.unwrap();
        items.sort_unstable();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(backoff(1), Duration::from_millis(10));
        assert_eq!(backoff(2), Duration::from_millis(20));
        assert_eq!(backoff(4), Duration::from_millis(80));
        assert_eq!(backoff(50), Duration::from_millis(640));
    }

    /// Store whose writes always lose the race
    struct AlwaysConflicts {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for AlwaysConflicts {
        async fn get(&self, _key: &str) -> crate::domain::Result<Option<Versioned>> {
            Ok(None)
        }

        async fn compare_and_swap(
            &self,
            _key: &str,
            _expected_version: u64,
            _value: serde_json::Value,
        ) -> crate::domain::Result<SwapOutcome> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(SwapOutcome::Conflict(99))
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = Arc::new(AlwaysConflicts {
            writes: AtomicUsize::new(0),
        });
        let collection: JsonCollection<u32> =
            JsonCollection::new(store.clone(), "nums").with_max_attempts(3);

        let err = collection.update(|items| items.push(1)).await.unwrap_err();
        assert!(matches!(
            err,
            LavendairError::Store(StoreError::Conflict { attempts: 3, .. })
        ));
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_corrupt_collection() {
        let store = Arc::new(MemoryStore::new());
        store
            .compare_and_swap("nums", 0, json!({"not": "a list"}))
            .await
            .unwrap();

        let collection: JsonCollection<u32> = JsonCollection::new(store, "nums");
        let err = collection.load().await.unwrap_err();
        assert!(matches!(err, LavendairError::Store(StoreError::Corrupt { .. })));
    }
}
