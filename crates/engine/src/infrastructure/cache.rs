//! Bounded LRU cache for embedding vectors.
//!
//! The resolver caches one vector per distinct text; over a long session that
//! set grows without bound unless evicted, so the cache holds at most
//! `capacity` entries and drops the least recently used one on overflow.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use tokio::sync::Mutex;

/// A thread-safe cache with least-recently-used eviction.
pub struct LruCache<K, V> {
    inner: Mutex<LruInner<K, V>>,
    capacity: usize,
}

struct LruInner<K, V> {
    map: HashMap<K, V>,
    /// Keys in recency order; front is the eviction candidate.
    order: VecDeque<K>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Get a value, marking it most recently used.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock().await;
        let value = guard.map.get(key).cloned()?;
        guard.order.retain(|k| k != key);
        guard.order.push_back(key.clone());
        Some(value)
    }

    /// Insert a value, evicting the least recently used entry on overflow.
    pub async fn insert(&self, key: K, value: V) {
        let mut guard = self.inner.lock().await;
        if guard.map.contains_key(&key) {
            guard.order.retain(|k| k != &key);
        } else if guard.map.len() >= self.capacity {
            if let Some(evicted) = guard.order.pop_front() {
                guard.map.remove(&evicted);
            }
        }
        guard.order.push_back(key.clone());
        guard.map.insert(key, value);
    }

    /// Current number of entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.map.is_empty()
    }
}
