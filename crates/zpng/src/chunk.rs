//! Chunk framing.
//!
//! A chunk is a length-prefixed, typed, checksummed record:
//!
//! ```text
//! +--------+--------+----------------+--------+
//! | length | type   | data           | crc    |
//! | u32 BE | [u8;4] | `length` bytes | u32 BE |
//! +--------+--------+----------------+--------+
//! ```
//!
//! The CRC covers the type and the data, never the length.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;
use zerocopy::byteorder::{BigEndian as BE, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
use zpng_common::{crc, BinaryReader, BinaryWriter};

use crate::{Error, Result};

/// Size of the length and type prefix.
pub const CHUNK_HEADER_LEN: usize = 8;

/// Size of the trailing CRC.
pub const CHUNK_CRC_LEN: usize = 4;

/// Bytes a chunk occupies beyond its data.
pub const CHUNK_OVERHEAD: usize = CHUNK_HEADER_LEN + CHUNK_CRC_LEN;

/// Four-character chunk type tag.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image header.
    pub const IHDR: Self = Self(*b"IHDR");
    /// Compressed pixel payload.
    pub const IDAT: Self = Self(*b"IDAT");
    /// End of container.
    pub const IEND: Self = Self(*b"IEND");
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType(\"{self}\")")
    }
}

/// Length and type prefix as stored.
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawChunkHeader {
    length: U32<BE>,
    chunk_type: ChunkType,
}

/// The length and type prefix of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Length of the data field only.
    pub length: u32,
    /// Chunk type tag.
    pub chunk_type: ChunkType,
}

impl ChunkHeader {
    /// Length of the data field in bytes.
    #[inline]
    pub const fn data_len(&self) -> usize {
        self.length as usize
    }

    /// Bytes the whole chunk occupies, framing included.
    #[inline]
    pub const fn total_len(&self) -> usize {
        self.length as usize + CHUNK_OVERHEAD
    }
}

/// A chunk borrowed from a container buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Chunk type tag.
    pub chunk_type: ChunkType,
    /// Data field, borrowed from the source buffer.
    pub data: &'a [u8],
    /// CRC as stored in the container.
    pub crc: u32,
}

impl Chunk<'_> {
    /// Bytes the whole chunk occupies, framing included.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.data.len() + CHUNK_OVERHEAD
    }

    /// CRC recomputed from the type and data.
    pub fn computed_crc(&self) -> u32 {
        chunk_crc(self.chunk_type, self.data)
    }

    /// Whether the stored CRC matches the contents.
    pub fn is_valid(&self) -> bool {
        self.crc == self.computed_crc()
    }

    /// Check the stored CRC against the contents.
    pub fn verify(&self) -> Result<()> {
        let actual = self.computed_crc();
        if actual != self.crc {
            return Err(Error::CrcMismatch {
                chunk: self.chunk_type,
                expected: self.crc,
                actual,
            });
        }
        Ok(())
    }
}

/// CRC of a chunk: type tag followed by data.
pub fn chunk_crc(chunk_type: ChunkType, data: &[u8]) -> u32 {
    let mut hasher = crc::Hasher::new();
    hasher.update(chunk_type.as_bytes());
    hasher.update(data);
    hasher.finalize()
}

/// Read only the length and type prefix of a chunk.
///
/// The reader is left untouched on failure.
pub fn read_chunk_header(reader: &mut BinaryReader<'_>) -> Result<ChunkHeader> {
    let raw: RawChunkHeader = reader.read_struct()?;

    Ok(ChunkHeader {
        length: raw.length.get(),
        chunk_type: raw.chunk_type,
    })
}

/// Read a whole chunk without copying its data.
///
/// The CRC is returned as stored; call [`Chunk::verify`] to check it. The
/// reader is left untouched on failure.
pub fn read_chunk<'a>(reader: &mut BinaryReader<'a>) -> Result<Chunk<'a>> {
    let start = reader.position();
    let mut probe = reader.clone();
    let header = read_chunk_header(&mut probe)?;
    let data = probe.read_bytes(header.data_len())?;
    let crc = probe.read_u32()?;
    *reader = probe;

    trace!(
        "Read {} chunk at offset {start:#x} ({} data bytes)",
        header.chunk_type,
        data.len()
    );

    Ok(Chunk {
        chunk_type: header.chunk_type,
        data,
        crc,
    })
}

/// Read a chunk from the start of `src`, copying its data into `out`.
///
/// The data is copied only when `out` can hold all of it; otherwise `out` is
/// left alone. Either way the returned header's
/// [`total_len`](ChunkHeader::total_len) tells the caller how far to skip.
pub fn read_chunk_into(src: &[u8], out: &mut [u8]) -> Result<ChunkHeader> {
    let mut reader = BinaryReader::new(src);
    let header = read_chunk_header(&mut reader)?;

    if out.len() >= header.data_len() {
        let data = reader.read_bytes(header.data_len())?;
        out[..data.len()].copy_from_slice(data);
    }

    Ok(header)
}

/// Reserve room for a chunk, let `fill` write its data in place, then frame it.
///
/// `fill` receives a region of exactly `capacity` bytes positioned where the
/// chunk data belongs and returns how many of them it used. The length, type
/// and CRC are then written around those bytes, so the data is written once
/// and never copied. Returns the total bytes the chunk occupies.
///
/// Fails before writing anything if the writer cannot hold `capacity` bytes
/// plus framing.
pub fn fill_chunk<F>(
    writer: &mut BinaryWriter<'_>,
    chunk_type: ChunkType,
    capacity: usize,
    fill: F,
) -> Result<usize>
where
    F: FnOnce(&mut [u8]) -> Result<usize>,
{
    let reserved = capacity
        .checked_add(CHUNK_OVERHEAD)
        .ok_or(Error::ChunkTooLarge(capacity))?;
    let region = writer.peek_mut(reserved)?;

    let produced = fill(&mut region[CHUNK_HEADER_LEN..CHUNK_HEADER_LEN + capacity])?;
    if produced > capacity {
        return Err(Error::BufferTooSmall {
            needed: produced,
            available: capacity,
        });
    }
    let length = u32::try_from(produced).map_err(|_| Error::ChunkTooLarge(produced))?;

    let total = produced + CHUNK_OVERHEAD;
    frame(&mut region[..total], chunk_type, length);
    writer.advance(total)?;

    trace!("Wrote {chunk_type} chunk ({produced} data bytes)");

    Ok(total)
}

/// Write a chunk, copying `data` into place. Returns `data.len() + 12`.
pub fn write_chunk(
    writer: &mut BinaryWriter<'_>,
    chunk_type: ChunkType,
    data: &[u8],
) -> Result<usize> {
    fill_chunk(writer, chunk_type, data.len(), |region| {
        region.copy_from_slice(data);
        Ok(data.len())
    })
}

/// Write length, type and CRC around data already sitting at offset 8.
fn frame(region: &mut [u8], chunk_type: ChunkType, length: u32) {
    let data_end = CHUNK_HEADER_LEN + length as usize;

    let header = RawChunkHeader {
        length: U32::new(length),
        chunk_type,
    };
    region[..CHUNK_HEADER_LEN].copy_from_slice(header.as_bytes());

    // Type and data are contiguous here
    let crc = crc::hash_bytes(&region[4..data_end]);
    BigEndian::write_u32(&mut region[data_end..data_end + CHUNK_CRC_LEN], crc);
}

/// Iterator over consecutive chunks in a buffer.
///
/// Yields an error and stops if a chunk is truncated.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    reader: BinaryReader<'a>,
    failed: bool,
}

impl<'a> Chunks<'a> {
    /// Iterate over the chunks in `data` starting at `offset`.
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self {
            reader: BinaryReader::new_at(data, offset),
            failed: false,
        }
    }

    /// Offset of the next chunk.
    pub fn position(&self) -> usize {
        self.reader.position()
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }

        let chunk = read_chunk(&mut self.reader);
        self.failed = chunk.is_err();
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const IEND_BYTES: [u8; 12] = [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];

    #[test]
    fn test_iend_layout() {
        let mut buffer = [0u8; 12];
        let mut writer = BinaryWriter::new(&mut buffer);

        assert_eq!(write_chunk(&mut writer, ChunkType::IEND, &[]).unwrap(), 12);
        assert_eq!(buffer, IEND_BYTES);
    }

    #[test]
    fn test_write_chunk_layout() {
        let mut buffer = [0u8; 16];
        let mut writer = BinaryWriter::new(&mut buffer);

        let written = write_chunk(&mut writer, ChunkType::IDAT, b"abcd").unwrap();
        assert_eq!(written, 4 + 12);
        assert_eq!(writer.position(), 16);

        assert_eq!(&buffer[..8], &[0, 0, 0, 4, b'I', b'D', b'A', b'T']);
        assert_eq!(&buffer[8..12], b"abcd");
        assert_eq!(
            BigEndian::read_u32(&buffer[12..]),
            crc::hash_bytes(b"IDATabcd")
        );
    }

    #[test]
    fn test_write_chunk_capacity() {
        let mut buffer = [0x55u8; 15];
        let mut writer = BinaryWriter::new(&mut buffer);

        let err = write_chunk(&mut writer, ChunkType::IDAT, b"abcd").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert_eq!(writer.position(), 0);
        assert!(buffer.iter().all(|&b| b == 0x55));
    }

    #[test]
    fn test_fill_chunk_in_place() {
        let mut buffer = [0u8; 64];
        let mut writer = BinaryWriter::new(&mut buffer);

        let written = fill_chunk(&mut writer, ChunkType::IDAT, 40, |region| {
            assert_eq!(region.len(), 40);
            region[..3].copy_from_slice(b"xyz");
            Ok(3)
        })
        .unwrap();
        assert_eq!(written, 15);
        assert_eq!(writer.position(), 15);

        let mut reader = BinaryReader::new(&buffer);
        let chunk = read_chunk(&mut reader).unwrap();
        assert_eq!(chunk.chunk_type, ChunkType::IDAT);
        assert_eq!(chunk.data, b"xyz");
        chunk.verify().unwrap();
    }

    #[test]
    fn test_fill_chunk_propagates_failure() {
        let mut buffer = [0u8; 32];
        let mut writer = BinaryWriter::new(&mut buffer);

        let err = fill_chunk(&mut writer, ChunkType::IDAT, 8, |_| {
            Err(Error::Compression("boom".into()))
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn test_read_chunk_and_verify() {
        let mut reader = BinaryReader::new(&IEND_BYTES);
        let chunk = read_chunk(&mut reader).unwrap();

        assert_eq!(chunk.chunk_type, ChunkType::IEND);
        assert!(chunk.data.is_empty());
        assert_eq!(chunk.crc, 0xAE42_6082);
        assert_eq!(chunk.total_len(), 12);
        assert!(chunk.is_valid());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_corrupt_chunk_fails_verify() {
        let mut buffer = [0u8; 16];
        let mut writer = BinaryWriter::new(&mut buffer);
        write_chunk(&mut writer, ChunkType::IDAT, b"abcd").unwrap();
        buffer[9] ^= 0x01;

        let mut reader = BinaryReader::new(&buffer);
        let chunk = read_chunk(&mut reader).unwrap();
        let err = chunk.verify().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption);
    }

    #[test]
    fn test_truncated_chunk() {
        // Claims 4 data bytes but only has 2
        let data = [0, 0, 0, 4, b'I', b'D', b'A', b'T', 1, 2];
        let mut reader = BinaryReader::new(&data);

        let err = read_chunk(&mut reader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(reader.position(), 0);

        // The prefix alone is still readable
        let header = read_chunk_header(&mut reader).unwrap();
        assert_eq!(header.length, 4);
        assert_eq!(header.total_len(), 16);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn test_header_prefix() {
        assert_eq!(std::mem::size_of::<RawChunkHeader>(), CHUNK_HEADER_LEN);

        let data = [0xFF, 0xFF, 0xFF, 0xFF, b'I', b'D', b'A', b'T'];
        let mut reader = BinaryReader::new(&data);
        let header = read_chunk_header(&mut reader).unwrap();
        assert_eq!(header.length, u32::MAX);
        assert_eq!(header.chunk_type, ChunkType::IDAT);
        assert!(reader.is_empty());

        let mut short = BinaryReader::new(&data[..7]);
        assert_eq!(read_chunk_header(&mut short).unwrap_err().kind(), ErrorKind::Malformed);
        assert_eq!(short.position(), 0);
    }

    #[test]
    fn test_read_chunk_into_skips_when_too_small() {
        let mut buffer = [0u8; 16];
        let mut writer = BinaryWriter::new(&mut buffer);
        write_chunk(&mut writer, ChunkType::IDAT, b"abcd").unwrap();

        let mut small = [0u8; 3];
        let header = read_chunk_into(&buffer, &mut small).unwrap();
        assert_eq!(header.chunk_type, ChunkType::IDAT);
        assert_eq!(header.total_len(), 16);
        assert_eq!(small, [0, 0, 0]);

        let mut large = [0u8; 6];
        let header = read_chunk_into(&buffer, &mut large).unwrap();
        assert_eq!(header.total_len(), 16);
        assert_eq!(&large[..4], b"abcd");
    }

    #[test]
    fn test_chunks_iterator() {
        let mut buffer = [0u8; 28];
        let mut writer = BinaryWriter::new(&mut buffer);
        write_chunk(&mut writer, ChunkType::IDAT, b"abcd").unwrap();
        write_chunk(&mut writer, ChunkType::IEND, &[]).unwrap();

        let types: Vec<ChunkType> = Chunks::new(&buffer, 0)
            .map(|c| c.unwrap().chunk_type)
            .collect();
        assert_eq!(types, vec![ChunkType::IDAT, ChunkType::IEND]);

        let mut truncated = Chunks::new(&buffer[..20], 0);
        assert!(truncated.next().unwrap().is_ok());
        assert!(truncated.next().unwrap().is_err());
        assert!(truncated.next().is_none());
    }

    #[test]
    fn test_chunk_type_display() {
        assert_eq!(ChunkType::IHDR.to_string(), "IHDR");
        assert_eq!(ChunkType(*b"a\0cd").to_string(), "a\\x00cd");
        assert_eq!(format!("{:?}", ChunkType::IEND), "ChunkType(\"IEND\")");
    }
}
