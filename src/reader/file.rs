//! File-backed physical reader with a lazily opened handle

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::PhysicalReader;

/// Physical reader over a flat file (raw image, exported volume, etc.).
///
/// The file handle is opened on first read and reused for the reader's
/// lifetime. Dropping the reader closes the handle.
pub struct FileReader {
    path: PathBuf,
    handle: Mutex<Option<File>>,
}

impl FileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying handle has been opened yet.
    pub fn is_open(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }
}

impl PhysicalReader for FileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = self.handle.lock().unwrap();
        if guard.is_none() {
            debug!(path = ?self.path, "Opening parent container handle");
            *guard = Some(File::open(&self.path)?);
        }
        // Guard is Some after the lazy open above
        let file = guard.as_mut().unwrap();

        file.seek(SeekFrom::Start(offset))?;
        let mut total = 0;
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break; // end of readable data
            }
            total += n;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_at() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();

        let reader = FileReader::new(tmp.path());
        assert!(!reader.is_open());

        let mut buf = [0u8; 4];
        let n = reader.read_at(3, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"3456");
        assert!(reader.is_open());
    }

    #[test]
    fn test_short_read_at_end_of_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"abcdef").unwrap();

        let reader = FileReader::new(tmp.path());
        let mut buf = [0u8; 10];
        let n = reader.read_at(4, &mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_read_past_end_returns_zero() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"abc").unwrap();

        let reader = FileReader::new(tmp.path());
        let mut buf = [0u8; 4];
        assert_eq!(reader.read_at(100, &mut buf).unwrap(), 0);
    }
}
