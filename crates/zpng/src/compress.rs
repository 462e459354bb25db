//! Byte-stream compressor back-ends.
//!
//! The container treats the IDAT payload as opaque; whatever implements
//! [`Compressor`] produces and consumes it. Both operations work against
//! caller-sized buffers so the encoder can compress straight into its output.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tracing::debug;

use crate::{Error, Result};

/// Default compression level.
pub const DEFAULT_LEVEL: i32 = 3;

/// A byte-stream compressor writing into bounded buffers.
pub trait Compressor {
    /// Compress `input` into `output`, returning the bytes written.
    ///
    /// Must fail rather than write past `output.len()`.
    fn compress(&self, input: &[u8], output: &mut [u8], level: i32) -> Result<usize>;

    /// Decompress `input` into `output`, returning the bytes written.
    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Worst-case compressed size for `len` input bytes.
    fn compress_bound(&self, len: usize) -> usize;
}

/// The bundled back-ends.
///
/// The container does not record which one produced a payload, so encoder
/// and decoder must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Codec {
    /// Zstandard.
    #[default]
    Zstd,
    /// zlib-wrapped DEFLATE.
    Deflate,
}

impl Compressor for Codec {
    fn compress(&self, input: &[u8], output: &mut [u8], level: i32) -> Result<usize> {
        match self {
            Codec::Zstd => compress_zstd(input, output, level),
            Codec::Deflate => compress_deflate(input, output, level),
        }
    }

    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        match self {
            Codec::Zstd => decompress_zstd(input, output),
            Codec::Deflate => decompress_deflate(input, output),
        }
    }

    fn compress_bound(&self, len: usize) -> usize {
        match self {
            Codec::Zstd => zstd::zstd_safe::compress_bound(len),
            // zlib's compressBound plus the zlib wrapper
            Codec::Deflate => len + (len >> 12) + (len >> 14) + (len >> 25) + 13 + 6,
        }
    }
}

/// Compress with Zstandard into a bounded buffer.
pub fn compress_zstd(input: &[u8], output: &mut [u8], level: i32) -> Result<usize> {
    zstd::bulk::compress_to_buffer(input, output, level)
        .map_err(|e| Error::Compression(e.to_string()))
}

/// Decompress a Zstandard frame into a bounded buffer.
///
/// Frames that record their content size are checked against `output`
/// before any work is done.
pub fn decompress_zstd(input: &[u8], output: &mut [u8]) -> Result<usize> {
    if let Ok(Some(size)) = zstd::zstd_safe::get_frame_content_size(input) {
        let needed = usize::try_from(size).unwrap_or(usize::MAX);
        if needed > output.len() {
            return Err(Error::BufferTooSmall {
                needed,
                available: output.len(),
            });
        }
    }

    zstd::bulk::decompress_to_buffer(input, output)
        .map_err(|e| Error::Decompression(e.to_string()))
}

/// Compress with zlib-wrapped DEFLATE into a bounded buffer.
///
/// The level is clamped to 0..=9.
pub fn compress_deflate(input: &[u8], output: &mut [u8], level: i32) -> Result<usize> {
    let clamped = level.clamp(0, 9);
    if clamped != level {
        debug!("Clamped deflate level {level} to {clamped}");
    }

    let mut compress = Compress::new(Compression::new(clamped as u32), true);

    loop {
        let consumed = compress.total_in() as usize;
        let produced = compress.total_out() as usize;

        let status = compress
            .compress(&input[consumed..], &mut output[produced..], FlushCompress::Finish)
            .map_err(|e| Error::Compression(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(compress.total_out() as usize),
            Status::Ok | Status::BufError => {
                let stalled = compress.total_in() as usize == consumed
                    && compress.total_out() as usize == produced;
                if compress.total_out() as usize == output.len() || stalled {
                    return Err(Error::Compression(format!(
                        "compressed output exceeds budget of {} bytes",
                        output.len()
                    )));
                }
            }
        }
    }
}

/// Decompress a zlib stream into a bounded buffer.
///
/// A stream that fills `output` before ending is drained into scratch space
/// so the error can report the size it actually needs.
pub fn decompress_deflate(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut decompress = Decompress::new(true);

    loop {
        let consumed = decompress.total_in() as usize;
        let produced = decompress.total_out() as usize;

        let status = decompress
            .decompress(&input[consumed..], &mut output[produced..], FlushDecompress::None)
            .map_err(|e| Error::Decompression(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(decompress.total_out() as usize),
            Status::Ok | Status::BufError => {
                if decompress.total_out() as usize == output.len() {
                    let needed = drain_deflate(&mut decompress, input)?;
                    if needed > output.len() {
                        return Err(Error::BufferTooSmall {
                            needed,
                            available: output.len(),
                        });
                    }
                    return Ok(needed);
                }
                let stalled = decompress.total_in() as usize == consumed
                    && decompress.total_out() as usize == produced;
                if stalled {
                    return Err(Error::Decompression("truncated stream".into()));
                }
            }
        }
    }
}

/// Run a stream to its end without keeping the output, returning its total size.
fn drain_deflate(decompress: &mut Decompress, input: &[u8]) -> Result<usize> {
    let mut scratch = [0u8; 4096];

    loop {
        let consumed = decompress.total_in() as usize;
        let produced = decompress.total_out();

        let status = decompress
            .decompress(&input[consumed..], &mut scratch, FlushDecompress::None)
            .map_err(|e| Error::Decompression(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(decompress.total_out() as usize),
            Status::Ok | Status::BufError => {
                if decompress.total_in() as usize == consumed && decompress.total_out() == produced
                {
                    return Err(Error::Decompression("truncated stream".into()));
                }
            }
        }
    }
}

/// Pass-through back-end that makes container bytes predictable in tests.
#[cfg(test)]
pub(crate) struct Stored;

#[cfg(test)]
impl Compressor for Stored {
    fn compress(&self, input: &[u8], output: &mut [u8], _level: i32) -> Result<usize> {
        if output.len() < input.len() {
            return Err(Error::Compression("no room".into()));
        }
        output[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn decompress(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if output.len() < input.len() {
            return Err(Error::Decompression("no room".into()));
        }
        output[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn compress_bound(&self, len: usize) -> usize {
        len
    }
}
