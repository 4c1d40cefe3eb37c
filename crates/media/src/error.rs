//! Media Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A media cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
    /// The cache has been released; a new instance must be opened.
    #[display("media cache has been released")]
    Released,
    /// A single span larger than the whole cache budget can never fit.
    #[display("span of {_0} bytes exceeds the cache budget")]
    SpanTooLarge(#[error(not(source))] u64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
