//! Error types for the content engine

use std::fmt;
use std::io;

/// Result type alias for content operations
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while registering or reading content
#[derive(Debug)]
pub enum ContentError {
    /// I/O error opening a parent container
    Io(io::Error),
    /// Case database error (schema, query, extent load)
    Database(rusqlite::Error),
    /// No content object with the given id in the open case
    MissingContent(i64),
    /// No parent container registered under the given id
    MissingParent(i64),
    /// Carved-file descriptor failed validation
    InvalidDescriptor(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Io(e) => write!(f, "I/O error: {}", e),
            ContentError::Database(e) => write!(f, "Case database error: {}", e),
            ContentError::MissingContent(id) => write!(f, "No content object with id {}", id),
            ContentError::MissingParent(id) => write!(f, "No parent container with id {}", id),
            ContentError::InvalidDescriptor(e) => write!(f, "Invalid descriptor: {}", e),
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContentError::Io(e) => Some(e),
            ContentError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ContentError {
    fn from(err: io::Error) -> Self {
        ContentError::Io(err)
    }
}

impl From<rusqlite::Error> for ContentError {
    fn from(err: rusqlite::Error) -> Self {
        ContentError::Database(err)
    }
}
