//! Error types for zpng-common.

use thiserror::Error;

/// Common error type for zpng cursor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Destination buffer has no room for a write.
    #[error("buffer full: needed {needed} bytes but only {available} available")]
    BufferFull { needed: usize, available: usize },

    /// Invalid magic bytes encountered.
    #[error("invalid magic: expected {expected:02x?}, got {actual:02x?}")]
    InvalidMagic {
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
