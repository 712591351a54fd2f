//! Per-region client handle cache.

use pictor_error::ProviderResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Memoized cache of backend client handles keyed by region.
///
/// Handles are created lazily on first use for each region and shared across
/// calls; the factory runs at most once per key even under concurrent first
/// use, so duplicate initialization cannot occur. Cloning the pool shares
/// the underlying cache.
///
/// # Example
///
/// ```
/// use pictor_retry::RegionClientPool;
///
/// let pool: RegionClientPool<String> = RegionClientPool::new();
/// let client = pool.get_or_create("us-central1", || "handle".to_string());
/// assert_eq!(client, "handle");
/// ```
#[derive(Debug, Clone)]
pub struct RegionClientPool<C> {
    clients: Arc<Mutex<HashMap<String, C>>>,
}

impl<C: Clone> RegionClientPool<C> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the handle for `region`, creating it with `factory` on first use.
    pub fn get_or_create<F>(&self, region: &str, factory: F) -> C
    where
        F: FnOnce() -> C,
    {
        let mut clients = self.clients.lock().unwrap();
        clients
            .entry(region.to_string())
            .or_insert_with(|| {
                debug!(region, "creating client handle");
                factory()
            })
            .clone()
    }

    /// Fallible variant of [`get_or_create`](Self::get_or_create).
    ///
    /// A failed factory caches nothing, so the next call for the same region
    /// retries construction.
    pub fn try_get_or_create<F>(&self, region: &str, factory: F) -> ProviderResult<C>
    where
        F: FnOnce() -> ProviderResult<C>,
    {
        let mut clients = self.clients.lock().unwrap();
        if let Some(client) = clients.get(region) {
            return Ok(client.clone());
        }
        debug!(region, "creating client handle");
        let client = factory()?;
        clients.insert(region.to_string(), client.clone());
        Ok(client)
    }

    /// Number of regions with a cached handle.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    /// True when no handle has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clone> Default for RegionClientPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn factory_runs_once_per_region() {
        let pool: RegionClientPool<u32> = RegionClientPool::new();
        let built = AtomicU32::new(0);

        let first = pool.get_or_create("us-central1", || {
            built.fetch_add(1, Ordering::SeqCst);
            42
        });
        let second = pool.get_or_create("us-central1", || {
            built.fetch_add(1, Ordering::SeqCst);
            99
        });

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn failed_creation_is_not_cached() {
        use pictor_error::{ProviderError, ProviderErrorKind};

        let pool: RegionClientPool<&str> = RegionClientPool::new();

        let err = pool
            .try_get_or_create("us-central1", || {
                Err(ProviderError::new(ProviderErrorKind::ClientCreation(
                    "missing credentials".to_string(),
                )))
            })
            .unwrap_err();
        assert!(err.message().contains("missing credentials"));
        assert!(pool.is_empty());

        // The next call retries the factory.
        let client = pool
            .try_get_or_create("us-central1", || Ok("handle"))
            .unwrap();
        assert_eq!(client, "handle");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn regions_cache_independently() {
        let pool: RegionClientPool<&str> = RegionClientPool::new();
        assert!(pool.is_empty());

        pool.get_or_create("us-central1", || "central");
        pool.get_or_create("global", || "fallback");

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get_or_create("global", || "other"), "fallback");
    }
}
