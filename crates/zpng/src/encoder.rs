//! Container encoding.

use tracing::debug;
use zerocopy::IntoBytes;
use zpng_common::BinaryWriter;

use crate::chunk::{fill_chunk, write_chunk, ChunkType, CHUNK_OVERHEAD};
use crate::compress::Compressor;
use crate::header::{IhdrData, RasterInfo};
use crate::options::EncoderOptions;
use crate::{Error, Result, CONTAINER_OVERHEAD, SIGNATURE};

/// Writes raw greyscale pixels as a zpng container.
///
/// # Example
///
/// ```
/// use zpng::{BitDepth, EncoderOptions, RasterInfo, ZpngEncoder};
///
/// let pixels: Vec<u8> = (0..8).collect();
/// let info = RasterInfo::new(4, 2, BitDepth::Eight);
///
/// let encoder = ZpngEncoder::new(&pixels, info, EncoderOptions::default());
/// let container = encoder.encode_to_vec()?;
/// assert!(zpng::is_zpng(&container));
/// # Ok::<(), zpng::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ZpngEncoder<'a> {
    data: &'a [u8],
    info: RasterInfo,
    options: EncoderOptions,
}

impl<'a> ZpngEncoder<'a> {
    /// Create an encoder for `data` described by `info`.
    pub fn new(data: &'a [u8], info: RasterInfo, options: EncoderOptions) -> Self {
        Self {
            data,
            info,
            options,
        }
    }

    /// The raster being encoded.
    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    /// The encoder options.
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// An output size that is always large enough for [`encode`](Self::encode).
    pub fn max_encoded_size(&self) -> usize {
        CONTAINER_OVERHEAD + self.options.codec.compress_bound(self.data.len())
    }

    /// Encode into `output` with the configured back-end.
    ///
    /// Returns the container length. See [`encode_with`](Self::encode_with).
    pub fn encode(&self, output: &mut [u8]) -> Result<usize> {
        self.encode_with(&self.options.codec, output)
    }

    /// Encode into `output` using `compressor` for the payload.
    ///
    /// The payload is compressed directly into its final position inside the
    /// IDAT chunk, bounded so the IEND chunk always still fits. Fails without
    /// writing if `output` is shorter than the smallest possible container.
    pub fn encode_with<C>(&self, compressor: &C, output: &mut [u8]) -> Result<usize>
    where
        C: Compressor + ?Sized,
    {
        self.info.validate()?;

        let expected = self.info.raw_size()?;
        if self.data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }

        if output.len() < CONTAINER_OVERHEAD {
            return Err(Error::BufferTooSmall {
                needed: CONTAINER_OVERHEAD,
                available: output.len(),
            });
        }

        let mut writer = BinaryWriter::new(output);

        writer.write_bytes(&SIGNATURE)?;
        write_chunk(
            &mut writer,
            ChunkType::IHDR,
            IhdrData::new(&self.info).as_bytes(),
        )?;

        // Leave room for the IDAT framing and the IEND chunk
        let budget = writer.remaining() - CHUNK_OVERHEAD - CHUNK_OVERHEAD;
        let level = self.options.level;
        let idat_len = fill_chunk(&mut writer, ChunkType::IDAT, budget, |region| {
            compressor.compress(self.data, region, level)
        })?;

        write_chunk(&mut writer, ChunkType::IEND, &[])?;

        let written = writer.position();
        debug!(
            "Encoded {}x{}@{} image: {} raw bytes -> {} byte payload, {written} bytes total (capacity {})",
            self.info.width,
            self.info.height,
            self.info.bit_depth,
            self.data.len(),
            idat_len - CHUNK_OVERHEAD,
            writer.capacity(),
        );

        Ok(written)
    }

    /// Encode into a freshly allocated buffer.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut output = vec![0u8; self.max_encoded_size()];
        let written = self.encode(&mut output)?;
        output.truncate(written);
        Ok(output)
    }
}

/// Encode `raw` into `output` with the default back-end at `level`.
///
/// Returns the container length.
pub fn encode(info: RasterInfo, raw: &[u8], output: &mut [u8], level: i32) -> Result<usize> {
    ZpngEncoder::new(raw, info, EncoderOptions::new().with_level(level)).encode(output)
}
