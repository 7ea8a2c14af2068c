//! Single-flight memoization for lookup results
//!
//! Keys are raw URL strings, byte-exact, no normalization. Successful
//! results are stored for the life of the process (or whatever the backend
//! decides); failures are never stored, so a later call for the same key
//! retries. Concurrent calls for one key collapse into a single computation.
//!
//! The storage backend is a trait seam so deployments can swap the
//! in-memory table for a shared store; the in-flight coordination is always
//! per-process.

use crate::error::SrpmResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::debug;

/// Storage for completed lookup results
#[async_trait]
pub trait CacheBackend<T>: Send + Sync {
    /// Fetch the stored value for `key`, if any
    async fn get(&self, key: &str) -> Option<T>;

    /// Store a successful result for `key`
    async fn put(&self, key: &str, value: T);
}

/// Process-local cache table with no eviction
pub struct MemoryBackend<T> {
    entries: RwLock<HashMap<String, T>>,
}

impl<T> MemoryBackend<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryBackend<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> CacheBackend<T> for MemoryBackend<T> {
    async fn get(&self, key: &str) -> Option<T> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: T) {
        self.entries.write().await.insert(key.to_string(), value);
    }
}

/// Memoization wrapper ensuring at most one computation per key at a time
///
/// Each lookup operation gets its own instance, so the source and SRPM
/// caches are independent namespaces even for identical URL strings.
pub struct SingleFlight<T> {
    backend: Arc<dyn CacheBackend<T>>,
    flights: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    /// Create a single-flight cache over the given backend
    pub fn new(backend: Arc<dyn CacheBackend<T>>) -> Self {
        Self {
            backend,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Create a single-flight cache over a process-local table
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Return the cached value for `key`, or run `compute` to produce it
    ///
    /// If several callers present the same key before any completes, exactly
    /// one `compute` runs; the rest wait for its result. A failed `compute`
    /// leaves nothing behind, so the next caller starts a fresh attempt.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> SrpmResult<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = SrpmResult<T>> + Send,
    {
        if let Some(value) = self.backend.get(key).await {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        let cell = {
            let mut flights = self.flights.lock().await;
            flights.entry(key.to_string()).or_default().clone()
        };

        let value = cell
            .get_or_try_init(|| async {
                // A shared backend may have been filled while we waited on
                // another flight for this key
                if let Some(value) = self.backend.get(key).await {
                    return Ok(value);
                }
                debug!("Cache miss for {}, computing", key);
                let value = compute().await?;
                self.backend.put(key, value.clone()).await;
                Ok(value)
            })
            .await?;

        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SrpmError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn second_sequential_call_is_served_from_cache() {
        let cache = SingleFlight::in_memory();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_compute("http://example.test/a.tar.gz", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("digest".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "digest");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_duplicate_keys_share_one_computation() {
        let cache = Arc::new(SingleFlight::in_memory());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("http://example.test/a.tar.gz", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Hold the flight open long enough for every caller
                        // to pile onto the same key
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(7u32)
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = SingleFlight::in_memory();
        let calls = AtomicUsize::new(0);

        let err = cache
            .get_or_compute("http://example.test/flaky", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(SrpmError::transport(
                    "http://example.test/flaky",
                    "transient outage",
                ))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SrpmError::RemoteLookup { .. }));

        let value = cache
            .get_or_compute("http://example.test/flaky", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("recovered".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn distinct_keys_compute_independently() {
        let cache = SingleFlight::in_memory();
        let calls = AtomicUsize::new(0);

        // Byte-different URLs are distinct keys, trailing slash included
        for key in ["http://example.test/a", "http://example.test/a/"] {
            cache
                .get_or_compute(key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(key.to_string())
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn prefilled_backend_skips_compute() {
        let backend = Arc::new(MemoryBackend::new());
        backend.put("http://example.test/a", "stored".to_string()).await;

        let cache = SingleFlight::new(backend);
        let value = cache
            .get_or_compute("http://example.test/a", || async {
                panic!("compute must not run on a backend hit")
            })
            .await
            .unwrap();

        assert_eq!(value, "stored");
    }
}
