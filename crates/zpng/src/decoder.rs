//! Container decoding.
//!
//! Decoding happens in two steps. [`ZpngDecoder::parse`] validates the
//! framing and returns a [`Container`] that borrows the payload straight out
//! of the input buffer. Turning that payload back into pixels is a separate
//! call ([`Container::decode_into`] or [`inflate`]), so callers that only need
//! the geometry never pay for decompression.

use tracing::{debug, warn};
use zpng_common::BinaryReader;

use crate::chunk::{read_chunk, read_chunk_header, Chunk, ChunkType, Chunks, CHUNK_CRC_LEN};
use crate::compress::{Codec, Compressor};
use crate::header::{BitDepth, IhdrData, RasterInfo};
use crate::options::DecoderOptions;
use crate::{Error, Result, SIGNATURE};

/// Check whether `data` starts with the container signature.
pub fn is_zpng(data: &[u8]) -> bool {
    data.starts_with(&SIGNATURE)
}

/// Consume the signature, reporting whatever stands in its place.
fn read_signature(reader: &mut BinaryReader<'_>) -> Result<()> {
    reader.expect_magic(&SIGNATURE).map_err(|err| match err {
        zpng_common::Error::InvalidMagic { actual, .. } => Error::InvalidSignature { actual },
        other => other.into(),
    })
}

fn expect_chunk(expected: ChunkType, actual: ChunkType) -> Result<()> {
    if expected != actual {
        return Err(Error::UnexpectedChunk { expected, actual });
    }
    Ok(())
}

/// Iterate over every chunk after the signature, without validating order.
pub fn chunks(data: &[u8]) -> Result<Chunks<'_>> {
    let mut reader = BinaryReader::new(data);
    read_signature(&mut reader)?;
    Ok(Chunks::new(data, reader.position()))
}

/// A parsed container: geometry plus a view of the compressed payload.
#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
    info: RasterInfo,
    payload: &'a [u8],
    payload_offset: usize,
    encoded_len: usize,
    codec: Codec,
}

impl<'a> Container<'a> {
    /// Raster geometry from the IHDR chunk.
    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    /// Image width.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Bits per sample.
    pub fn bit_depth(&self) -> BitDepth {
        self.info.bit_depth
    }

    /// The compressed payload, borrowed from the input buffer.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Offset of the payload within the input buffer.
    pub fn payload_offset(&self) -> usize {
        self.payload_offset
    }

    /// Length of the compressed payload.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Bytes of the input buffer the container spans.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Expected raw size, `width * height * bit_depth / 8`.
    pub fn raw_size(&self) -> Result<usize> {
        self.info.raw_size()
    }

    /// Decompress the payload into `output` with the configured back-end.
    ///
    /// `output` must hold at least [`raw_size`](Self::raw_size) bytes, and the
    /// payload must decompress to exactly that many.
    pub fn decode_into(&self, output: &mut [u8]) -> Result<usize> {
        self.decode_into_with(&self.codec, output)
    }

    /// Like [`decode_into`](Self::decode_into) with an explicit decompressor.
    pub fn decode_into_with<C>(&self, decompressor: &C, output: &mut [u8]) -> Result<usize>
    where
        C: Compressor + ?Sized,
    {
        let expected = self.raw_size()?;
        if output.len() < expected {
            return Err(Error::BufferTooSmall {
                needed: expected,
                available: output.len(),
            });
        }

        let written = inflate(self.payload, &mut output[..expected], decompressor)?;
        if written != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: written,
            });
        }

        Ok(written)
    }

    /// Decompress the payload into a freshly allocated buffer.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let mut output = vec![0u8; self.raw_size()?];
        self.decode_into(&mut output)?;
        Ok(output)
    }
}

/// Reads zpng containers from a borrowed buffer.
#[derive(Debug, Clone)]
pub struct ZpngDecoder<'a> {
    data: &'a [u8],
    options: DecoderOptions,
}

impl<'a> ZpngDecoder<'a> {
    /// Create a decoder with default options.
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_with_options(data, DecoderOptions::default())
    }

    /// Create a decoder with explicit options.
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> Self {
        Self { data, options }
    }

    /// The decoder options.
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Validate the framing and locate the payload.
    ///
    /// Only the IDAT length prefix is needed to find the payload; its bytes
    /// are borrowed, never copied. CRCs are checked when
    /// [`verify_crc`](DecoderOptions::verify_crc) is set, and the IEND chunk
    /// is required when [`strict`](DecoderOptions::strict) is set.
    pub fn parse(&self) -> Result<Container<'a>> {
        let data = self.data;
        let mut reader = BinaryReader::new(data);
        read_signature(&mut reader)?;

        let ihdr = read_chunk(&mut reader)?;
        expect_chunk(ChunkType::IHDR, ihdr.chunk_type)?;
        if self.options.verify_crc {
            ihdr.verify()?;
        }
        let info = IhdrData::parse(ihdr.data)?.to_info(self.options.strict)?;

        let idat = read_chunk_header(&mut reader)?;
        expect_chunk(ChunkType::IDAT, idat.chunk_type)?;
        let payload_offset = reader.position();
        let payload = reader.read_bytes(idat.data_len())?;

        if self.options.verify_crc {
            let crc = reader.read_u32()?;
            Chunk {
                chunk_type: ChunkType::IDAT,
                data: payload,
                crc,
            }
            .verify()?;
        } else {
            reader.advance(CHUNK_CRC_LEN);
        }

        if self.options.strict {
            if payload.is_empty() {
                return Err(Error::Malformed("empty IDAT chunk".into()));
            }

            let iend = read_chunk(&mut reader)?;
            expect_chunk(ChunkType::IEND, iend.chunk_type)?;
            if !iend.data.is_empty() {
                return Err(Error::Malformed(format!(
                    "IEND chunk carries {} data bytes",
                    iend.data.len()
                )));
            }
            if self.options.verify_crc {
                iend.verify()?;
            }
            if !reader.is_empty() {
                warn!("Ignoring {} trailing bytes after IEND", reader.remaining());
            }
        }

        let container = Container {
            info,
            payload,
            payload_offset,
            encoded_len: reader.position().min(data.len()),
            codec: self.options.codec,
        };

        debug!(
            "Parsed {}x{}@{} container: {} byte payload at offset {payload_offset}",
            info.width,
            info.height,
            info.bit_depth,
            payload.len()
        );

        Ok(container)
    }

    /// Parse and decompress in one go.
    pub fn decode(&self) -> Result<Vec<u8>> {
        self.parse()?.decode()
    }
}

/// Parse a container with default options.
pub fn parse(data: &[u8]) -> Result<Container<'_>> {
    ZpngDecoder::new(data).parse()
}

/// Decompress a payload into `output`, returning the raw bytes produced.
pub fn inflate<C>(payload: &[u8], output: &mut [u8], decompressor: &C) -> Result<usize>
where
    C: Compressor + ?Sized,
{
    decompressor.decompress(payload, output)
}
