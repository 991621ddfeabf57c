//! Type definitions for extent-mapped content

use serde::{Deserialize, Serialize};

// =============================================================================
// Extent - one physical byte range within a parent container
// =============================================================================

/// A contiguous physical byte range belonging to one parent container.
///
/// Extents are created once by the producing algorithm (carving, layout
/// reconstruction) or loaded read-only from the case database, and never
/// mutated afterwards. `sequence` defines logical concatenation order and
/// need not match physical offset order - fragmented carved files routinely
/// list extents whose physical offsets are non-monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    /// Identity of the byte-addressable container the range is drawn from
    pub parent_id: i64,
    /// Byte offset within the parent
    pub start_offset: u64,
    /// Byte count
    pub length: u64,
    /// Logical concatenation order
    pub sequence: u64,
}

impl Extent {
    pub fn new(parent_id: i64, start_offset: u64, length: u64, sequence: u64) -> Self {
        Self {
            parent_id,
            start_offset,
            length,
            sequence,
        }
    }
}

// =============================================================================
// ExtentList - the ordered ranges of one virtual content object
// =============================================================================

/// Ordered collection of extents for one content object.
///
/// Extents are kept sorted by `sequence`; the total logical length is
/// computed once at construction and is stable for the lifetime of the list.
#[derive(Debug, Clone)]
pub struct ExtentList {
    extents: Vec<Extent>,
    total_len: u64,
}

impl ExtentList {
    /// Build a list from extents in any order; sorts by `sequence`.
    pub fn new(mut extents: Vec<Extent>) -> Self {
        extents.sort_by_key(|e| e.sequence);
        let total_len = extents.iter().map(|e| e.length).sum();
        Self { extents, total_len }
    }

    /// Total logical content length - the sum of all extent lengths.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Number of extents in the list.
    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Extents in `sequence` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Extent> {
        self.extents.iter()
    }

    pub fn as_slice(&self) -> &[Extent] {
        &self.extents
    }
}
