//! Logical-to-physical translation - the extent walk
//!
//! Translates a logical `(offset, length)` read on an extent-mapped content
//! object into the ordered physical reads that reconstruct it. Extents are
//! walked once, in `sequence` order, in a single forward pass; no extent is
//! visited twice and no physical read ever exceeds the extent's declared
//! length, so reads never spill across extent boundaries even when extents
//! happen to be physically adjacent in the parent container.

use tracing::{trace, warn};

use crate::reader::PhysicalReader;

use super::types::ExtentList;

/// Read `len` logical bytes starting at `offset` from an extent list.
///
/// The request is clamped so it never crosses the list's total length; a
/// request at or past the end returns an empty buffer. A physical read that
/// comes back short (or fails outright) ends the walk and the bytes
/// accumulated so far are returned - short reads signal end of available
/// data, they are not errors. Callers that require exact-length reads must
/// check the returned length themselves.
pub fn read_range(
    list: &ExtentList,
    reader: &dyn PhysicalReader,
    offset: u64,
    len: u64,
) -> Vec<u8> {
    let total = list.total_len();
    if offset >= total || len == 0 {
        return Vec::new();
    }
    let want_total = len.min(total - offset);
    let mut out: Vec<u8> = Vec::with_capacity(want_total as usize);

    // Logical offset of the current extent's first byte
    let mut cursor: u64 = 0;

    for extent in list.iter() {
        let read_so_far = out.len() as u64;
        if read_so_far >= want_total {
            break;
        }
        let extent_end = cursor + extent.length;

        // Extent lies entirely before the request (zero-length extents
        // included) - skip without a physical read.
        if extent_end <= offset || extent.length == 0 {
            cursor = extent_end;
            continue;
        }

        // Nonzero only for the first extent the request lands in
        let skip = offset.saturating_sub(cursor);
        let want = (extent.length - skip).min(want_total - read_so_far);

        let mut buf = vec![0u8; want as usize];
        let got = match reader.read_at(extent.start_offset + skip, &mut buf) {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    sequence = extent.sequence,
                    physical_offset = extent.start_offset + skip,
                    "Physical read failed, truncating: {}",
                    e
                );
                break;
            }
        };
        trace!(
            sequence = extent.sequence,
            physical_offset = extent.start_offset + skip,
            want,
            got,
            "Extent read"
        );
        out.extend_from_slice(&buf[..got]);

        if (got as u64) < want {
            // Short read: end of available data
            break;
        }
        cursor = extent_end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent::types::Extent;
    use std::io;
    use std::sync::Mutex;

    /// In-memory parent container
    struct MemReader {
        data: Vec<u8>,
    }

    impl MemReader {
        fn new(data: Vec<u8>) -> Self {
            Self { data }
        }
    }

    impl PhysicalReader for MemReader {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
            let offset = offset as usize;
            if offset >= self.data.len() {
                return Ok(0);
            }
            let n = buf.len().min(self.data.len() - offset);
            buf[..n].copy_from_slice(&self.data[offset..offset + n]);
            Ok(n)
        }
    }

    /// Reader that cuts every read short after a fixed byte budget
    struct TruncatingReader {
        inner: MemReader,
        budget: Mutex<usize>,
    }

    impl PhysicalReader for TruncatingReader {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
            let mut budget = self.budget.lock().unwrap();
            let allowed = buf.len().min(*budget);
            let n = self.inner.read_at(offset, &mut buf[..allowed])?;
            *budget -= n;
            Ok(n)
        }
    }

    fn parent_bytes() -> Vec<u8> {
        (0..=255u8).cycle().take(2000).collect()
    }

    #[test]
    fn test_partial_overlap_across_fragments() {
        // Two fragments: 10 bytes at 1000, then 5 bytes at 50
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![
            Extent::new(1, 1000, 10, 0),
            Extent::new(1, 50, 5, 1),
        ]);
        assert_eq!(list.total_len(), 15);

        let out = read_range(&list, &reader, 8, 10);
        // Clamped to 15 - 8 = 7 bytes: last 2 of extent 0, all 5 of extent 1
        let mut expected = parent_bytes()[1008..1010].to_vec();
        expected.extend_from_slice(&parent_bytes()[50..55]);
        assert_eq!(out, expected);
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn test_full_read_concatenates_in_sequence_order() {
        // Physically out of order, logically sequenced
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![
            Extent::new(1, 500, 4, 1),
            Extent::new(1, 1200, 6, 0),
            Extent::new(1, 0, 3, 2),
        ]);

        let out = read_range(&list, &reader, 0, 13);
        let data = parent_bytes();
        let mut expected = data[1200..1206].to_vec();
        expected.extend_from_slice(&data[500..504]);
        expected.extend_from_slice(&data[0..3]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_read_within_single_extent() {
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![
            Extent::new(1, 100, 20, 0),
            Extent::new(1, 700, 20, 1),
        ]);

        let out = read_range(&list, &reader, 25, 10);
        assert_eq!(out, &parent_bytes()[705..715]);
    }

    #[test]
    fn test_read_at_logical_size_returns_empty() {
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![Extent::new(1, 100, 20, 0)]);
        assert!(read_range(&list, &reader, 20, 10).is_empty());
        assert!(read_range(&list, &reader, 9999, 1).is_empty());
    }

    #[test]
    fn test_zero_length_content() {
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(Vec::new());
        assert!(read_range(&list, &reader, 0, 100).is_empty());

        let list = ExtentList::new(vec![Extent::new(1, 100, 0, 0)]);
        assert!(read_range(&list, &reader, 0, 100).is_empty());
    }

    #[test]
    fn test_zero_length_extent_is_skipped() {
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![
            Extent::new(1, 100, 5, 0),
            Extent::new(1, 300, 0, 1),
            Extent::new(1, 600, 5, 2),
        ]);

        let out = read_range(&list, &reader, 0, 10);
        let data = parent_bytes();
        let mut expected = data[100..105].to_vec();
        expected.extend_from_slice(&data[600..605]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_zero_length_extent_mid_request() {
        // Request starts after the zero-length extent's logical position
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![
            Extent::new(1, 100, 5, 0),
            Extent::new(1, 300, 0, 1),
            Extent::new(1, 600, 5, 2),
        ]);

        let out = read_range(&list, &reader, 7, 3);
        assert_eq!(out, &parent_bytes()[602..605]);
    }

    #[test]
    fn test_length_clamped_to_logical_size() {
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![Extent::new(1, 100, 10, 0)]);

        let full = read_range(&list, &reader, 0, 10);
        let clamped = read_range(&list, &reader, 4, 1000);
        assert_eq!(clamped.len(), 6);
        assert_eq!(clamped, &full[4..]);
    }

    #[test]
    fn test_zero_length_request() {
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![Extent::new(1, 100, 10, 0)]);
        assert!(read_range(&list, &reader, 0, 0).is_empty());
    }

    #[test]
    fn test_short_read_truncates_result() {
        // First extent read requests 10 bytes, only 4 are available
        let reader = TruncatingReader {
            inner: MemReader::new(parent_bytes()),
            budget: Mutex::new(4),
        };
        let list = ExtentList::new(vec![
            Extent::new(1, 100, 10, 0),
            Extent::new(1, 500, 10, 1),
        ]);

        let out = read_range(&list, &reader, 0, 20);
        assert_eq!(out, &parent_bytes()[100..104]);
    }

    #[test]
    fn test_read_never_spills_across_extent_boundary() {
        // Extents physically adjacent in the parent: each must still be
        // read separately so sequence order decides the logical content.
        let reader = MemReader::new(parent_bytes());
        let list = ExtentList::new(vec![
            Extent::new(1, 105, 5, 0),
            Extent::new(1, 100, 5, 1),
        ]);

        let out = read_range(&list, &reader, 0, 10);
        let data = parent_bytes();
        let mut expected = data[105..110].to_vec();
        expected.extend_from_slice(&data[100..105]);
        assert_eq!(out, expected);
    }
}
