//! Lock-guarded handle for sharing one cache between tasks.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::lru::{CacheError, CacheStats, LruCache};

/// Cloneable handle to a single [`LruCache`] behind one mutex.
///
/// Each call holds the lock for the whole operation, so the index and the
/// recency list are never observed half-updated.
pub struct SharedCache<K, V> {
    inner: Arc<Mutex<LruCache<K, V>>>,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> SharedCache<K, V> {
    /// Creates an empty shared cache; zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Ok(Self::from_cache(LruCache::new(capacity)?))
    }

    /// Shares an existing cache, keeping its contents and statistics.
    pub fn from_cache(cache: LruCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Looks up and promotes `key`, returning a copy of its value.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.get(key).cloned()
    }

    /// Inserts or updates `key`, returning the entry evicted to make room.
    pub async fn put(&self, key: K, value: V) -> Option<(K, V)> {
        self.inner.lock().await.put(key, value)
    }

    /// Removes `key`, returning its value if it was resident.
    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.remove(key)
    }

    /// Snapshot of the keys from least to most recently used.
    pub async fn keys_in_order(&self) -> Vec<K> {
        self.inner.lock().await.keys_in_order().cloned().collect()
    }

    /// Number of resident entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether no entry is resident.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Snapshot of the hit, miss and eviction counters.
    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }
}
