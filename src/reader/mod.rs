//! Physical readers - raw byte access to parent containers
//!
//! The translator never touches the medium itself; it goes through a
//! [`PhysicalReader`], the capability the native forensic engine exposes per
//! parent container (image, volume, pool). The contract is deliberately
//! loose: a read may return fewer bytes than requested, which signals end of
//! readable data and is never treated as a hard error by the read path.

mod file;
mod pool;

pub use file::FileReader;
pub use pool::{ReaderPool, DEFAULT_MAX_OPEN_READERS};

use std::io;

/// Raw byte access to one opened parent container.
///
/// Implementations open their underlying handle lazily on first use and keep
/// it for the reader's lifetime; the handle is released when the reader
/// itself is dropped, never per read.
pub trait PhysicalReader: Send + Sync {
    /// Read up to `buf.len()` bytes at `offset` into `buf`.
    ///
    /// Returns the number of bytes read, between 0 and `buf.len()`. Fewer
    /// bytes than requested signals end-of-readable-data or a lower-level
    /// I/O fault; callers must not treat a short read as an error.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}
