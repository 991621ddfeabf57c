// Shared reader pool for parent container handles
//
// Keeps one FileReader per registered parent container and bounds how many
// may hold an open OS handle at once, so a case with many images does not
// exceed OS file descriptor limits.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

use crate::error::{ContentError, ContentResult};

use super::FileReader;

/// Default maximum number of simultaneously open parent handles
pub const DEFAULT_MAX_OPEN_READERS: usize = 32;

/// Manages physical readers for all registered parent containers.
///
/// Readers are created lazily on first use; when the open limit is reached
/// the least recently used reader is dropped. A reader already handed out to
/// a caller stays usable - the pool only gives up its own reference.
pub struct ReaderPool {
    inner: Mutex<PoolInner>,
    max_open: usize,
}

struct PoolInner {
    /// Registered container paths (parent_id -> path)
    paths: HashMap<i64, PathBuf>,
    /// Currently pooled readers
    open: HashMap<i64, Arc<FileReader>>,
    /// LRU queue over pooled readers
    lru: VecDeque<i64>,
}

impl ReaderPool {
    pub fn new(max_open: usize) -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                paths: HashMap::new(),
                open: HashMap::new(),
                lru: VecDeque::new(),
            }),
            max_open,
        }
    }

    pub fn with_default_limit() -> Self {
        Self::new(DEFAULT_MAX_OPEN_READERS)
    }

    /// Register a parent container's backing path.
    pub fn register(&self, parent_id: i64, path: impl Into<PathBuf>) {
        let mut inner = self.inner.lock().unwrap();
        inner.paths.insert(parent_id, path.into());
    }

    /// Get the reader for a parent container, creating it if necessary.
    pub fn get(&self, parent_id: i64) -> ContentResult<Arc<FileReader>> {
        let mut inner = self.inner.lock().unwrap();

        // Already pooled - move to front of LRU queue
        if let Some(reader) = inner.open.get(&parent_id) {
            let reader = Arc::clone(reader);
            inner.lru.retain(|&id| id != parent_id);
            inner.lru.push_front(parent_id);
            trace!(parent_id, "Reader pool hit");
            return Ok(reader);
        }

        let path = inner
            .paths
            .get(&parent_id)
            .cloned()
            .ok_or(ContentError::MissingParent(parent_id))?;

        // Evict the least recently used reader if at capacity
        if inner.open.len() >= self.max_open {
            if let Some(lru_id) = inner.lru.pop_back() {
                trace!(lru_id, "Evicting LRU reader");
                inner.open.remove(&lru_id);
            }
        }

        debug!(parent_id, ?path, "Creating reader for parent container");
        let reader = Arc::new(FileReader::new(path));
        inner.open.insert(parent_id, Arc::clone(&reader));
        inner.lru.push_front(parent_id);

        Ok(reader)
    }

    /// Number of registered parent containers.
    pub fn registered_count(&self) -> usize {
        self.inner.lock().unwrap().paths.len()
    }

    /// Number of readers currently pooled.
    pub fn open_count(&self) -> usize {
        self.inner.lock().unwrap().open.len()
    }

    /// Drop all pooled readers. Registered paths are kept.
    pub fn close_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.open.clear();
        inner.lru.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_pool_basic() {
        let temp_dir = TempDir::new().unwrap();
        let pool = ReaderPool::new(3);

        for i in 0..5i64 {
            let path = temp_dir.path().join(format!("image_{}.dd", i));
            let mut file = File::create(&path).unwrap();
            file.write_all(&[i as u8; 100]).unwrap();
            pool.register(i, path);
        }

        assert_eq!(pool.registered_count(), 5);
        assert_eq!(pool.open_count(), 0);

        pool.get(0).unwrap();
        pool.get(1).unwrap();
        pool.get(2).unwrap();
        assert_eq!(pool.open_count(), 3);

        // A 4th reader evicts the LRU (parent 0)
        pool.get(3).unwrap();
        assert_eq!(pool.open_count(), 3);

        // Re-fetching parent 1 still hits the pool
        pool.get(1).unwrap();
        assert_eq!(pool.open_count(), 3);
    }

    #[test]
    fn test_pool_unknown_parent() {
        let pool = ReaderPool::with_default_limit();
        assert!(matches!(
            pool.get(42),
            Err(ContentError::MissingParent(42))
        ));
    }

    #[test]
    fn test_close_all_releases_handles() {
        let temp_dir = TempDir::new().unwrap();
        let pool = ReaderPool::with_default_limit();

        for i in 0..2i64 {
            let path = temp_dir.path().join(format!("image_{}.dd", i));
            let mut file = File::create(&path).unwrap();
            file.write_all(b"data").unwrap();
            pool.register(i, path);
        }
        pool.get(0).unwrap();
        pool.get(1).unwrap();
        assert_eq!(pool.open_count(), 2);

        pool.close_all();
        assert_eq!(pool.open_count(), 0);
        assert_eq!(pool.registered_count(), 2);

        // Registrations survive; readers come back lazily
        pool.get(0).unwrap();
        assert_eq!(pool.open_count(), 1);
    }

    #[test]
    fn test_evicted_reader_stays_usable() {
        let temp_dir = TempDir::new().unwrap();
        let pool = ReaderPool::new(1);

        for i in 0..2i64 {
            let path = temp_dir.path().join(format!("image_{}.dd", i));
            let mut file = File::create(&path).unwrap();
            file.write_all(b"hello world").unwrap();
            pool.register(i, path);
        }

        let first = pool.get(0).unwrap();
        pool.get(1).unwrap(); // evicts parent 0 from the pool

        use crate::reader::PhysicalReader;
        let mut buf = [0u8; 5];
        assert_eq!(first.read_at(0, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
    }
}
