use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

use crate::core::types::ScoreMap;
use crate::query::types::QueryMode;

/// Rough per-entry budget used to derive the entry cap from a byte budget.
const ENTRY_ESTIMATE: usize = 16 * 1024;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub text: Vec<u8>,
    pub mode: QueryMode,
}

/// Result cache for repeated queries; cleared on every mutation.
pub struct QueryCache {
    cache: Mutex<LruCache<QueryKey, ScoreMap>>,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

impl QueryCache {
    pub fn with_budget(budget_bytes: usize) -> Self {
        let capacity = (budget_bytes / ENTRY_ESTIMATE).max(8);
        QueryCache {
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(capacity).unwrap())),
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<ScoreMap> {
        let mut cache = self.cache.lock();
        if let Some(result) = cache.get(key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            Some(result.clone())
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    pub fn put(&self, key: QueryKey, result: ScoreMap) {
        self.cache.lock().put(key, result);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.cache.lock().len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;

    #[test]
    fn caches_and_counts_hits() {
        let cache = QueryCache::with_budget(1024 * 1024);
        let key = QueryKey {
            text: b"hello".to_vec(),
            mode: QueryMode::Part,
        };

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), ScoreMap::from([(DocId(1), 500)]));
        assert_eq!(cache.get(&key).unwrap()[&DocId(1)], 500);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);

        cache.clear();
        assert!(cache.get(&key).is_none());
    }
}
