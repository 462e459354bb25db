//! Binary writer over a caller-owned buffer.
//!
//! [`BinaryWriter`] is the write-side counterpart of
//! [`BinaryReader`](crate::BinaryReader): an explicit cursor into a fixed
//! `&mut [u8]` that checks bounds before every write and never allocates.

use byteorder::{BigEndian, ByteOrder};

use crate::{Error, Result};

/// A bounds-checked big-endian writer over a mutable byte slice.
///
/// # Example
///
/// ```
/// use zpng_common::BinaryWriter;
///
/// let mut buffer = [0u8; 8];
/// let mut writer = BinaryWriter::new(&mut buffer);
///
/// writer.write_u32(13).unwrap();
/// writer.write_bytes(b"IHDR").unwrap();
/// assert_eq!(writer.remaining(), 0);
/// assert!(writer.write_u8(0).is_err());
/// assert_eq!(buffer, [0, 0, 0, 13, b'I', b'H', b'D', b'R']);
/// ```
#[derive(Debug)]
pub struct BinaryWriter<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> BinaryWriter<'a> {
    /// Create a new writer at the start of a buffer.
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer, which is also the number of
    /// bytes written so far.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total capacity of the underlying buffer.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes that can still be written.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Fail unless at least `count` bytes can be written.
    #[inline]
    pub fn ensure(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(Error::BufferFull {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Borrow the next `count` bytes for in-place writing without advancing.
    ///
    /// Pair with [`advance`](Self::advance) once the region is filled.
    #[inline]
    pub fn peek_mut(&mut self, count: usize) -> Result<&mut [u8]> {
        self.ensure(count)?;
        Ok(&mut self.data[self.position..self.position + count])
    }

    /// Advance the position by `count` bytes that were filled in place.
    #[inline]
    pub fn advance(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.position += count;
        Ok(())
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.peek_mut(bytes.len())?.copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Write a big-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        BigEndian::write_u32(self.peek_mut(4)?, value);
        self.position += 4;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_primitives() {
        let mut buffer = [0u8; 6];
        let mut writer = BinaryWriter::new(&mut buffer);

        writer.write_u32(0x0102_0304).unwrap();
        writer.write_u8(0xAA).unwrap();
        assert_eq!(writer.position(), 5);
        assert_eq!(writer.remaining(), 1);
        assert_eq!(writer.capacity(), 6);
        assert_eq!(buffer, [1, 2, 3, 4, 0xAA, 0]);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut buffer = [0u8; 3];
        let mut writer = BinaryWriter::new(&mut buffer);

        match writer.write_u32(7) {
            Err(Error::BufferFull { needed, available }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(writer.position(), 0);
        assert_eq!(buffer, [0, 0, 0]);
    }

    #[test]
    fn test_fill_in_place() {
        let mut buffer = [0u8; 4];
        let mut writer = BinaryWriter::new(&mut buffer);

        writer.peek_mut(3).unwrap().copy_from_slice(b"abc");
        assert_eq!(writer.position(), 0);
        writer.advance(3).unwrap();
        assert!(writer.advance(2).is_err());
        writer.write_u8(b'd').unwrap();
        assert_eq!(&buffer, b"abcd");
    }
}
