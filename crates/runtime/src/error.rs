//! Runtime Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A runtime error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories; the underlying crate error rides along as
/// the exn source.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration could not be resolved")]
    Config,
    #[display("persistent store failed to start")]
    Store,
    #[display("media cache failed to start")]
    Media,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store | Self::Media)
    }
}
