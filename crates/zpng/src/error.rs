//! Error types for zpng containers.

use thiserror::Error;

use crate::chunk::ChunkType;

/// Errors that can occur when encoding or decoding zpng containers.
#[derive(Debug, Error)]
pub enum Error {
    /// Cursor error from the common library.
    #[error("{0}")]
    Common(#[from] zpng_common::Error),

    /// Input does not start with the container signature.
    #[error("invalid signature: got {actual:02x?}")]
    InvalidSignature { actual: Vec<u8> },

    /// A chunk appeared where a different one was required.
    #[error("unexpected chunk: expected {expected}, got {actual}")]
    UnexpectedChunk {
        expected: ChunkType,
        actual: ChunkType,
    },

    /// The IHDR record is malformed.
    #[error("invalid IHDR: {0}")]
    InvalidHeader(String),

    /// Container structure is broken outside the IHDR record.
    #[error("malformed container: {0}")]
    Malformed(String),

    /// Bit depth other than 8 or 16.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u8),

    /// Stored chunk CRC does not match its contents.
    #[error("CRC mismatch in {chunk} chunk: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        chunk: ChunkType,
        expected: u32,
        actual: u32,
    },

    /// Destination buffer cannot hold the output.
    #[error("buffer too small: needed {needed} bytes but only {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// Width or height of zero.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Raw buffer length disagrees with the raster descriptor.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Image byte size does not fit in `usize`.
    #[error("image {width}x{height} at {bit_depth} bits is too large to address")]
    ImageTooLarge {
        width: u32,
        height: u32,
        bit_depth: u8,
    },

    /// Chunk data longer than a 32-bit length field can describe.
    #[error("chunk data of {0} bytes exceeds the 32-bit length field")]
    ChunkTooLarge(usize),

    /// Compressor back-end failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// Decompressor back-end failure.
    #[error("decompression error: {0}")]
    Decompression(String),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not a well-formed container.
    Malformed,
    /// A destination buffer is too small.
    Capacity,
    /// The compressor or decompressor reported a failure.
    Codec,
    /// A chunk checksum did not match.
    Corruption,
    /// The caller passed inconsistent arguments.
    InvalidInput,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Common(zpng_common::Error::BufferFull { .. }) | Error::BufferTooSmall { .. } => {
                ErrorKind::Capacity
            }
            Error::Common(_)
            | Error::InvalidSignature { .. }
            | Error::UnexpectedChunk { .. }
            | Error::InvalidHeader(_)
            | Error::Malformed(_)
            | Error::UnsupportedBitDepth(_) => ErrorKind::Malformed,
            Error::CrcMismatch { .. } => ErrorKind::Corruption,
            Error::Compression(_) | Error::Decompression(_) => ErrorKind::Codec,
            Error::InvalidDimensions { .. }
            | Error::SizeMismatch { .. }
            | Error::ImageTooLarge { .. }
            | Error::ChunkTooLarge(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for zpng operations.
pub type Result<T> = std::result::Result<T, Error>;
