//! Extents and the logical-to-physical translator
//!
//! A virtual content object (carved file, unallocated-space container,
//! layout file) owns an ordered list of physical byte ranges - extents -
//! within a parent container. This module defines the extent types and the
//! single-pass walk that turns a logical read into physical reads.

mod translate;
mod types;

pub use translate::read_range;
pub use types::{Extent, ExtentList};
