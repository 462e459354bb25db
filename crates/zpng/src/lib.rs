//! zpng: greyscale PNG-style containers with a pluggable compressor.
//!
//! A zpng file reuses the PNG signature and chunk framing but carries a
//! general-purpose compressed byte stream (Zstandard by default) in place of
//! PNG's filtered deflate data. Only single-channel images at 8 or 16 bits
//! per sample are supported.
//!
//! # File Format
//!
//! All integers are big-endian.
//!
//! - 8 bytes: Signature (`89 50 4E 47 0D 0A 1A 0A`)
//! - 25 bytes: IHDR chunk (width, height, bit depth, four zero mode bytes)
//! - 12 + N bytes: IDAT chunk holding the N byte compressed payload
//! - 12 bytes: IEND chunk
//!
//! Each chunk is `length | type | data | crc`, with the CRC-32 computed over
//! the type and data.
//!
//! # Example
//!
//! ```
//! use zpng::{BitDepth, RasterInfo};
//!
//! let pixels: Vec<u8> = (0..8).collect();
//! let info = RasterInfo::new(4, 2, BitDepth::Eight);
//!
//! // Encode into a caller-owned buffer
//! let mut buffer = [0u8; 256];
//! let written = zpng::encode(info, &pixels, &mut buffer, 3)?;
//!
//! // Parse without copying, then decompress as a separate step
//! let container = zpng::parse(&buffer[..written])?;
//! assert_eq!(container.info(), &info);
//!
//! let mut raw = [0u8; 8];
//! container.decode_into(&mut raw)?;
//! assert_eq!(&raw[..], &pixels[..]);
//! # Ok::<(), zpng::Error>(())
//! ```

pub mod chunk;
pub mod compress;
mod decoder;
mod encoder;
mod error;
mod header;
mod options;

pub use compress::{Codec, Compressor, DEFAULT_LEVEL};
pub use decoder::{chunks, inflate, is_zpng, parse, Container, ZpngDecoder};
pub use encoder::{encode, ZpngEncoder};
pub use error::{Error, ErrorKind, Result};
pub use header::{BitDepth, IhdrData, RasterInfo};
pub use options::{DecoderOptions, EncoderOptions};

pub use zpng_common as common;

/// Container signature, identical to PNG's.
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes a container occupies beyond its payload: signature, IHDR, and the
/// IDAT and IEND framing. Also the smallest possible container.
pub const CONTAINER_OVERHEAD: usize =
    SIGNATURE.len() + chunk::CHUNK_OVERHEAD + IhdrData::SIZE + chunk::CHUNK_OVERHEAD + chunk::CHUNK_OVERHEAD;
