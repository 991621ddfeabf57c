//! layout-content - extent-mapped virtual content engine
//!
//! Models forensic content recovered from a storage medium as addressable
//! objects and materializes the bytes of objects that are not contiguous
//! regions of the medium: carved files, unallocated-space containers, and
//! other virtual files built from ordered lists of physical byte ranges.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ ContentEngine            read(id, offset, len) / size(id)    │
//! ├──────────────┬────────────────────────┬──────────────────────┤
//! │ ContentCache │ Translator             │ CaseStore            │
//! │ bounded FIFO │ extent walk in         │ SQLite: objects,     │
//! │ full-buffer  │ sequence order         │ extents, parents     │
//! │ cache        │ (extent::read_range)   │                      │
//! ├──────────────┴────────────────────────┴──────────────────────┤
//! │ ReaderPool -> PhysicalReader (lazily opened parent handles)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A read first checks the cache; on miss the object's extent list is
//! loaded (once, memoized), the translator walks it issuing physical reads
//! in `sequence` order, the assembled buffer is cached if small enough, and
//! the requested slice is returned. Short physical reads truncate the
//! result instead of failing; out-of-range requests return empty buffers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use layout_content::{CaseStore, ContentCache, ContentEngine, Extent};
//!
//! let store = CaseStore::open(path, "my case")?;
//! let engine = ContentEngine::new(store, ContentCache::with_defaults())?;
//!
//! let image = engine.add_parent("/evidence/disk.dd", None)?;
//! let carved = engine.add_layout_content(image, "carved_0001.jpg", &[
//!     Extent::new(image, 1_048_576, 4096, 0),
//!     Extent::new(image, 32_768, 512, 1),
//! ])?;
//!
//! let header = engine.read(carved, 0, 16)?;
//! ```

pub mod cache;
pub mod carve;
pub mod content;
pub mod engine;
pub mod error;
pub mod extent;
pub mod logging;
pub mod reader;
pub mod store;

pub use cache::{ContentCache, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_ENTRY_SIZE};
pub use carve::{CarvedFile, CarvingResult};
pub use content::{Content, RegularContent, VirtualContent};
pub use engine::ContentEngine;
pub use error::{ContentError, ContentResult};
pub use extent::{Extent, ExtentList};
pub use reader::{FileReader, PhysicalReader, ReaderPool};
pub use store::{CaseInfo, CaseStore, ParentRecord};
