//! Content engine - the read surface over an open case
//!
//! Owns the case store, the reader pool, and the injected content cache,
//! and exposes the operations upper layers (UI, ingest, export) consume:
//! `read`, `size`, registration of parents and content, and `clear_cache`.
//! One engine serves one open case; the cache lifetime is bound to it
//! instead of living in hidden global state.

use md5::{Digest, Md5};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::cache::ContentCache;
use crate::carve::CarvingResult;
use crate::content::Content;
use crate::error::ContentResult;
use crate::extent::Extent;
use crate::reader::ReaderPool;
use crate::store::CaseStore;

pub struct ContentEngine {
    store: CaseStore,
    cache: ContentCache,
    readers: ReaderPool,
    /// Loaded content objects, kept so per-object extent memoization
    /// survives across reads
    objects: Mutex<HashMap<i64, Arc<Content>>>,
}

impl ContentEngine {
    /// Build an engine over an open case store with an injected cache.
    /// Parent containers already in the store are registered with the
    /// reader pool.
    pub fn new(store: CaseStore, cache: ContentCache) -> ContentResult<Self> {
        let readers = ReaderPool::with_default_limit();
        for parent in store.parents()? {
            readers.register(parent.obj_id, parent.path);
        }
        Ok(Self {
            store,
            cache,
            readers,
            objects: Mutex::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a parent container (image, volume, pool) backed by a path.
    pub fn add_parent(&self, path: &str, description: Option<&str>) -> ContentResult<i64> {
        let parent_id = self.store.add_parent(path, description)?;
        self.readers.register(parent_id, path);
        info!(parent_id, path, "Registered parent container");
        Ok(parent_id)
    }

    /// Register regular content: one contiguous region of a parent.
    pub fn add_regular_content(
        &self,
        parent_id: i64,
        name: &str,
        start_offset: u64,
        size: u64,
    ) -> ContentResult<i64> {
        self.store
            .add_regular_content(parent_id, name, start_offset, size)
    }

    /// Register a layout file from an ordered extent list.
    pub fn add_layout_content(
        &self,
        parent_id: i64,
        name: &str,
        extents: &[Extent],
    ) -> ContentResult<i64> {
        let obj_id = self.store.add_virtual_content(parent_id, name, extents)?;
        debug!(obj_id, name, parts = extents.len(), "Registered layout content");
        Ok(obj_id)
    }

    /// Register every carved file in a carving result. Returns the new
    /// object ids in the result's file order.
    pub fn add_carving_result(&self, result: &CarvingResult) -> ContentResult<Vec<i64>> {
        let parent_id = result.parent_id();
        let mut ids = Vec::with_capacity(result.files().len());
        for file in result.files() {
            let obj_id = self
                .store
                .add_virtual_content(parent_id, file.name(), file.extents())?;
            ids.push(obj_id);
        }
        info!(parent_id, count = ids.len(), "Registered carving result");
        Ok(ids)
    }

    // ========================================================================
    // Read Surface
    // ========================================================================

    /// Logical size of a content object, loading and memoizing extents on
    /// first use.
    pub fn size(&self, content_id: i64) -> ContentResult<u64> {
        let content = self.content(content_id)?;
        content.size(&self.store)
    }

    /// Read up to `len` bytes of a content object starting at `offset`.
    ///
    /// Small virtual content is served from the cache (decoding it in full
    /// on first access); everything else goes straight through the
    /// translator. The result may be shorter than requested at the end of
    /// the content or after a short physical read.
    pub fn read(&self, content_id: i64, offset: u64, len: u64) -> ContentResult<Vec<u8>> {
        let content = self.content(content_id)?;

        if content.is_virtual() {
            let size = content.size(&self.store)?;
            if self.cache.eligible(size) {
                let full = self.full_bytes(content_id, &content, size)?;
                return Ok(slice_range(&full, offset, len));
            }
        }

        let reader = self.readers.get(content.parent_id())?;
        content.read(&self.store, reader.as_ref(), offset, len)
    }

    /// Full decoded bytes of cache-eligible content, decoding on miss.
    fn full_bytes(
        &self,
        content_id: i64,
        content: &Content,
        size: u64,
    ) -> ContentResult<Arc<Vec<u8>>> {
        if let Some(buf) = self.cache.get(content_id) {
            return Ok(buf);
        }
        let reader = self.readers.get(content.parent_id())?;
        let full = content.read(&self.store, reader.as_ref(), 0, size)?;
        // Caching is a side effect only; the decoded bytes are returned
        // whether or not the insert happens.
        self.cache.insert(content_id, full.clone());
        Ok(Arc::new(full))
    }

    /// Empty the content cache. Invoked by case lifecycle code on case
    /// close or switch.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Release pooled parent handles and empty the cache. Invoked by case
    /// lifecycle code when the case is closed; the engine stays usable and
    /// reopens handles lazily if further reads arrive.
    pub fn close(&self) {
        self.readers.close_all();
        self.cache.clear();
    }

    // ========================================================================
    // Hash Bookkeeping
    // ========================================================================

    /// Compute the MD5 of a content object's full bytes, persist it on the
    /// object row, and return it as lowercase hex.
    pub fn compute_md5(&self, content_id: i64) -> ContentResult<String> {
        let size = self.size(content_id)?;
        let bytes = self.read(content_id, 0, size)?;

        let mut hasher = Md5::new();
        hasher.update(&bytes);
        let md5 = hex::encode(hasher.finalize());

        self.store.set_md5(content_id, &md5)?;
        Ok(md5)
    }

    // ========================================================================
    // Object Lookup
    // ========================================================================

    fn content(&self, content_id: i64) -> ContentResult<Arc<Content>> {
        if let Some(content) = self.objects.lock().unwrap().get(&content_id) {
            return Ok(Arc::clone(content));
        }
        let loaded = Arc::new(self.store.get_content(content_id)?);
        let mut objects = self.objects.lock().unwrap();
        // A racing lookup may have loaded the same row; keep the first
        let entry = objects
            .entry(content_id)
            .or_insert_with(|| Arc::clone(&loaded));
        Ok(Arc::clone(entry))
    }
}

/// Slice a full decoded buffer according to a caller's `(offset, len)`,
/// clamped to the bytes actually available.
fn slice_range(full: &[u8], offset: u64, len: u64) -> Vec<u8> {
    if offset >= full.len() as u64 {
        return Vec::new();
    }
    let start = offset as usize;
    let end = offset.saturating_add(len).min(full.len() as u64) as usize;
    full[start..end].to_vec()
}
