//! Error types for untab

use thiserror::Error;

/// Main error type for table decoding
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tab-separated parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Truncated input: needed {needed} byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Invalid table header: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// Map an end-of-buffer IO error from a fixed-width read onto `Truncated`
    pub(crate) fn from_fixed_read(err: std::io::Error, offset: usize, needed: usize) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Truncated { offset, needed }
        } else {
            Error::Io(err)
        }
    }
}

/// Result type alias for untab operations
pub type Result<T> = std::result::Result<T, Error>;
