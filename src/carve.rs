//! Carving and layout registration
//!
//! Packages the output of a carving or unallocated-space-reconstruction
//! pass into the shape the read path consumes: per-file descriptors with
//! their extent lists, grouped under one parent container. Registration
//! produces ordinary virtual content objects; nothing downstream
//! distinguishes a carved file from any other layout file.

use serde::{Deserialize, Serialize};

use crate::error::{ContentError, ContentResult};
use crate::extent::Extent;

/// One recoverable file identified by a carving pass.
///
/// The declared size must equal the sum of the extent lengths; the
/// constructor rejects a mismatch rather than letting reads silently
/// truncate later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarvedFile {
    name: String,
    size: u64,
    extents: Vec<Extent>,
}

impl CarvedFile {
    pub fn new(name: impl Into<String>, size: u64, extents: Vec<Extent>) -> ContentResult<Self> {
        let name = name.into();

        let extent_total: u64 = extents.iter().map(|e| e.length).sum();
        if extent_total != size {
            return Err(ContentError::InvalidDescriptor(format!(
                "Carved file '{}' declares {} bytes but its extents cover {}",
                name, size, extent_total
            )));
        }

        let mut sequences: Vec<u64> = extents.iter().map(|e| e.sequence).collect();
        sequences.sort_unstable();
        sequences.dedup();
        if sequences.len() != extents.len() {
            return Err(ContentError::InvalidDescriptor(format!(
                "Carved file '{}' has duplicate extent sequence numbers",
                name
            )));
        }

        Ok(Self {
            name,
            size,
            extents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }
}

/// The files a carving pass recovered from one parent container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarvingResult {
    parent_id: i64,
    files: Vec<CarvedFile>,
}

impl CarvingResult {
    pub fn new(parent_id: i64, files: Vec<CarvedFile>) -> Self {
        Self { parent_id, files }
    }

    pub fn parent_id(&self) -> i64 {
        self.parent_id
    }

    pub fn files(&self) -> &[CarvedFile] {
        &self.files
    }
}
