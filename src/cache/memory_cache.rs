use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::CacheEntry;

/// Single-namespace store with lazy expiry.
///
/// Entries are only checked, and dropped, when they are looked up. With a
/// capacity of zero the store is unbounded and an expired entry that is never
/// read again stays resident until the process exits.
pub struct TtlCache<V> {
    store: LruCache<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V> TtlCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let store = match NonZeroUsize::new(capacity) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self { store, ttl }
    }

    pub fn get(&mut self, key: &str) -> Option<Arc<V>> {
        let entry = self.store.get(key)?;
        if entry.stored_at.elapsed() <= self.ttl {
            return Some(Arc::clone(&entry.value));
        }
        self.store.pop(key);
        None
    }

    pub fn put(&mut self, key: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.store.put(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                stored_at: Instant::now(),
            },
        );
        value
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
