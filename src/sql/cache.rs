//! Process-wide result cache keyed by rendered SQL text + parameter values.
//!
//! Generation-counter LRU, adapted from
//! `examples/fankaiLiu-pgorm/crates/pgorm/src/pg_client/statement_cache.rs`:
//! every `touch` bumps a monotonic generation counter instead of moving list
//! nodes, and eviction does a linear scan for the least-recently-touched
//! entry. That scan is O(n) in cache size, which is fine at the crate's
//! default capacity (1000, matching the original `cachetools.LRUCache`
//! in `examples/original_source/.../QueryBuilder.py`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_postgres::Row;

const DEFAULT_CAPACITY: usize = 1000;

struct CacheEntry {
    value: Arc<Vec<Row>>,
    last_access: u64,
}

struct Inner {
    capacity: usize,
    map: HashMap<String, CacheEntry>,
    generation: u64,
}

/// Result-set cache shared by every [`crate::sql::QueryBuilder`] execution in
/// the process. One instance is meant to be constructed at startup and
/// threaded through alongside the connection pool.
pub struct QueryCache {
    inner: Mutex<Inner>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Cache hit/miss counters, mirroring `StmtCacheStats`.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                map: HashMap::new(),
                generation: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<Row>>> {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        let generation = inner.generation;
        match inner.map.get_mut(key) {
            Some(entry) => {
                entry.last_access = generation;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.value))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: String, value: Arc<Vec<Row>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        let generation = inner.generation;
        inner.map.insert(
            key,
            CacheEntry {
                value,
                last_access: generation,
            },
        );
        self.evict_if_needed(&mut inner);
    }

    fn evict_if_needed(&self, inner: &mut Inner) {
        if inner.capacity == 0 {
            let evicted = inner.map.len();
            inner.map.clear();
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            return;
        }
        while inner.map.len() > inner.capacity {
            let victim = inner
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(k, _)| k.clone());
            if let Some(key) = victim {
                inner.map.remove(&key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            } else {
                break;
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: inner.map.len(),
            capacity: inner.capacity,
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
