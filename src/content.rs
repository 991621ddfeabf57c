//! Content objects - regular and virtual
//!
//! Content recovered from a medium is either a contiguous region of its
//! parent container (regular) or an extent-mapped reconstruction (virtual:
//! carved files, unallocated-space containers, layout files). The two are
//! dispatched by plain pattern matching; there is no behavioral difference
//! on the read path between the kinds of virtual content, only in which
//! registration step created them.

use std::sync::OnceLock;
use tracing::warn;

use crate::error::ContentResult;
use crate::extent::{read_range, ExtentList};
use crate::reader::PhysicalReader;
use crate::store::CaseStore;

/// A content object within the open case.
#[derive(Debug)]
pub enum Content {
    Regular(RegularContent),
    Virtual(VirtualContent),
}

impl Content {
    pub fn object_id(&self) -> i64 {
        match self {
            Content::Regular(c) => c.object_id,
            Content::Virtual(c) => c.object_id,
        }
    }

    pub fn parent_id(&self) -> i64 {
        match self {
            Content::Regular(c) => c.parent_id,
            Content::Virtual(c) => c.parent_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Content::Regular(c) => &c.name,
            Content::Virtual(c) => &c.name,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Content::Virtual(_))
    }

    /// Logical size in bytes, loading extents on first use for virtual
    /// content.
    pub fn size(&self, store: &CaseStore) -> ContentResult<u64> {
        match self {
            Content::Regular(c) => Ok(c.size),
            Content::Virtual(c) => Ok(c.ranges(store)?.total_len()),
        }
    }

    /// Read up to `len` bytes starting at logical `offset`.
    ///
    /// The result may be shorter than requested: requests are clamped to
    /// the logical size, and a short physical read ends the data early.
    pub fn read(
        &self,
        store: &CaseStore,
        reader: &dyn PhysicalReader,
        offset: u64,
        len: u64,
    ) -> ContentResult<Vec<u8>> {
        match self {
            Content::Regular(c) => Ok(c.read(reader, offset, len)),
            Content::Virtual(c) => {
                let ranges = c.ranges(store)?;
                Ok(read_range(ranges, reader, offset, len))
            }
        }
    }
}

// =============================================================================
// Regular content - one contiguous region of the parent
// =============================================================================

#[derive(Debug, Clone)]
pub struct RegularContent {
    pub(crate) object_id: i64,
    pub(crate) parent_id: i64,
    pub(crate) name: String,
    pub(crate) start_offset: u64,
    pub(crate) size: u64,
}

impl RegularContent {
    pub fn new(object_id: i64, parent_id: i64, name: String, start_offset: u64, size: u64) -> Self {
        Self {
            object_id,
            parent_id,
            name,
            start_offset,
            size,
        }
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    fn read(&self, reader: &dyn PhysicalReader, offset: u64, len: u64) -> Vec<u8> {
        if offset >= self.size || len == 0 {
            return Vec::new();
        }
        let want = len.min(self.size - offset);
        let mut buf = vec![0u8; want as usize];
        let got = match reader.read_at(self.start_offset + offset, &mut buf) {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    object_id = self.object_id,
                    physical_offset = self.start_offset + offset,
                    "Physical read failed, truncating: {}",
                    e
                );
                0
            }
        };
        buf.truncate(got);
        buf
    }
}

// =============================================================================
// Virtual content - extent-mapped reconstruction
// =============================================================================

/// Content defined entirely by an ordered list of extents.
///
/// The extent list is loaded from the case database at most once and
/// memoized for the object's lifetime; racing first accesses converge on
/// one canonical list. Logical size is derived from the loaded list and is
/// stable from then on.
#[derive(Debug)]
pub struct VirtualContent {
    pub(crate) object_id: i64,
    pub(crate) parent_id: i64,
    pub(crate) name: String,
    pub(crate) extents: OnceLock<ExtentList>,
}

impl VirtualContent {
    pub fn new(object_id: i64, parent_id: i64, name: String) -> Self {
        Self {
            object_id,
            parent_id,
            name,
            extents: OnceLock::new(),
        }
    }

    /// The extent list, loading it from the case database on first use.
    pub fn ranges(&self, store: &CaseStore) -> ContentResult<&ExtentList> {
        if let Some(list) = self.extents.get() {
            return Ok(list);
        }
        let loaded = ExtentList::new(store.load_extents(self.object_id)?);
        // If another thread loaded concurrently, both lists came from the
        // same immutable rows; the first one in wins.
        Ok(self.extents.get_or_init(|| loaded))
    }

    /// Number of extents backing this object.
    pub fn num_parts(&self, store: &CaseStore) -> ContentResult<usize> {
        Ok(self.ranges(store)?.len())
    }
}
