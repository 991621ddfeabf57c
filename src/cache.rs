//! Bounded content cache for small virtual content objects
//!
//! Caches the full decoded bytes of size-bounded content so repeated reads
//! skip the extent walk and physical I/O. Eviction is first-in-first-out by
//! insertion order: lookups do not refresh an entry's position, so this is
//! not a true LRU even though it resembles one. The cache is shared across
//! concurrent readers and must be cleared when the active case changes -
//! content ids are only unique within a case, and a stale cross-case entry
//! would silently return wrong bytes.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Content larger than this is never cached (bytes)
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 50 * 1024;
/// Default entry capacity
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Bounded cache from content id to its full decoded byte buffer.
///
/// Uses Arc so hits hand out the buffer without copying it.
pub struct ContentCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    max_entry_size: u64,
}

struct CacheInner {
    entries: HashMap<i64, Arc<Vec<u8>>>,
    /// Insertion order, oldest at the front
    insert_order: VecDeque<i64>,
}

impl ContentCache {
    pub fn new(max_entries: usize, max_entry_size: u64) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                insert_order: VecDeque::new(),
            }),
            max_entries,
            max_entry_size,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_MAX_ENTRY_SIZE)
    }

    /// Whether content of the given size may be inserted at all.
    pub fn eligible(&self, size: u64) -> bool {
        size <= self.max_entry_size
    }

    pub fn max_entry_size(&self) -> u64 {
        self.max_entry_size
    }

    /// Look up the full buffer for a content id. Does not refresh the
    /// entry's eviction position.
    pub fn get(&self, content_id: i64) -> Option<Arc<Vec<u8>>> {
        let inner = self.inner.lock().unwrap();
        let hit = inner.entries.get(&content_id).map(Arc::clone);
        trace!(content_id, hit = hit.is_some(), "Content cache lookup");
        hit
    }

    /// Insert a fully decoded buffer, evicting the oldest-inserted entry if
    /// the cache is at capacity. Oversized buffers are ignored.
    pub fn insert(&self, content_id: i64, data: Vec<u8>) {
        if data.len() as u64 > self.max_entry_size {
            return;
        }
        let mut inner = self.inner.lock().unwrap();

        if inner.entries.insert(content_id, Arc::new(data)).is_some() {
            // Replaced in place; the id already has an order slot
            return;
        }
        inner.insert_order.push_back(content_id);

        if inner.entries.len() > self.max_entries {
            if let Some(oldest) = inner.insert_order.pop_front() {
                trace!(content_id = oldest, "Evicting oldest cache entry");
                inner.entries.remove(&oldest);
            }
        }
    }

    /// Empty the cache. Must be called whenever the active case changes.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.insert_order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = ContentCache::new(10, 1024);
        cache.insert(1, vec![1, 2, 3]);
        assert_eq!(*cache.get(1).unwrap(), vec![1, 2, 3]);
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_oversized_entry_never_cached() {
        let cache = ContentCache::new(10, 4);
        cache.insert(1, vec![0u8; 5]);
        assert!(cache.get(1).is_none());
        cache.insert(2, vec![0u8; 4]);
        assert!(cache.get(2).is_some());
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = ContentCache::new(3, 1024);
        cache.insert(1, vec![1]);
        cache.insert(2, vec![2]);
        cache.insert(3, vec![3]);

        // A lookup must not refresh entry 1's position
        cache.get(1).unwrap();

        cache.insert(4, vec![4]);
        assert!(cache.get(1).is_none(), "oldest-inserted entry is evicted");
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
        assert!(cache.get(4).is_some());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_reinsert_does_not_duplicate_order_slot() {
        let cache = ContentCache::new(2, 1024);
        cache.insert(1, vec![1]);
        cache.insert(1, vec![9]);
        cache.insert(2, vec![2]);
        assert_eq!(cache.len(), 2);
        assert_eq!(*cache.get(1).unwrap(), vec![9]);

        // Entry 1 keeps its original insertion slot, so it goes first
        cache.insert(3, vec![3]);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = ContentCache::with_defaults();
        cache.insert(1, vec![1]);
        cache.insert(2, vec![2]);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_concurrent_insert_get_clear() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(ContentCache::new(8, 1024));

        // Each thread works its own id range so a hit must carry exactly
        // the bytes that thread inserted - a torn or partial entry would
        // fail the content check.
        let mut handles = Vec::new();
        for t in 0..4i64 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..500i64 {
                    let id = t * 1000 + (i % 10);
                    cache.insert(id, vec![t as u8; 16]);
                    if let Some(buf) = cache.get(id) {
                        assert_eq!(buf.len(), 16);
                        assert!(buf.iter().all(|&b| b == t as u8));
                    }
                    if i % 100 == 0 {
                        cache.clear();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 8);
    }
}
