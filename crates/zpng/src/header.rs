//! IHDR record and raster descriptor.

use std::fmt;

use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result};

/// Bits per greyscale sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// One byte per pixel.
    #[default]
    Eight,
    /// Two bytes per pixel, most significant byte first.
    Sixteen,
}

impl BitDepth {
    /// Parse the IHDR bit depth byte.
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(Error::UnsupportedBitDepth(other)),
        }
    }

    /// Bits per sample.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    /// Bytes per sample.
    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Geometry of an uncompressed single-channel image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bits per sample.
    pub bit_depth: BitDepth,
}

impl RasterInfo {
    /// Create a new raster descriptor.
    pub const fn new(width: u32, height: u32, bit_depth: BitDepth) -> Self {
        Self {
            width,
            height,
            bit_depth,
        }
    }

    /// Bytes of raw pixel data: `width * height * bit_depth / 8`.
    ///
    /// Fails if the product does not fit in `usize`.
    pub fn raw_size(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(self.bit_depth.bytes()))
            .ok_or(Error::ImageTooLarge {
                width: self.width,
                height: self.height,
                bit_depth: self.bit_depth.bits(),
            })
    }

    /// Fail on a zero width or height.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// The 13-byte IHDR data field, laid out exactly as stored.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct IhdrData {
    /// Image width.
    pub width: U32<BigEndian>,
    /// Image height.
    pub height: U32<BigEndian>,
    /// Bits per sample.
    pub bit_depth: u8,
    /// Colour type (0 = greyscale).
    pub color_type: u8,
    /// Compression method (0).
    pub compression: u8,
    /// Filter method (0).
    pub filter: u8,
    /// Interlace method (0 = none).
    pub interlace: u8,
}

impl IhdrData {
    /// Size of the IHDR data field.
    pub const SIZE: usize = 13;

    /// Greyscale colour type.
    pub const COLOR_GREYSCALE: u8 = 0;

    /// Build the record for a raster. The mode bytes are always zero.
    pub fn new(info: &RasterInfo) -> Self {
        Self {
            width: U32::new(info.width),
            height: U32::new(info.height),
            bit_depth: info.bit_depth.bits(),
            color_type: Self::COLOR_GREYSCALE,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    /// Parse the IHDR data field.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != Self::SIZE {
            return Err(Error::InvalidHeader(format!(
                "expected {} bytes, got {}",
                Self::SIZE,
                data.len()
            )));
        }
        Self::read_from_bytes(data).map_err(|_| Error::InvalidHeader("unreadable record".into()))
    }

    /// Recover the raster descriptor.
    ///
    /// With `strict`, zero dimensions and non-zero mode bytes are rejected.
    pub fn to_info(&self, strict: bool) -> Result<RasterInfo> {
        let info = RasterInfo::new(
            self.width.get(),
            self.height.get(),
            BitDepth::from_bits(self.bit_depth)?,
        );

        if strict {
            if info.width == 0 || info.height == 0 {
                return Err(Error::InvalidHeader(format!(
                    "zero dimension {}x{}",
                    info.width, info.height
                )));
            }

            let modes = [
                ("colour type", self.color_type),
                ("compression method", self.compression),
                ("filter method", self.filter),
                ("interlace method", self.interlace),
            ];
            for (name, value) in modes {
                if value != 0 {
                    return Err(Error::InvalidHeader(format!("unsupported {name} {value}")));
                }
            }
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_record_size() {
        assert_eq!(std::mem::size_of::<IhdrData>(), IhdrData::SIZE);
    }

    #[test]
    fn test_record_layout() {
        let info = RasterInfo::new(0x0102_0304, 2, BitDepth::Sixteen);
        let bytes = IhdrData::new(&info).as_bytes().to_vec();

        assert_eq!(bytes, [1, 2, 3, 4, 0, 0, 0, 2, 16, 0, 0, 0, 0]);
    }

    #[test]
    fn test_field_fidelity() {
        let cases = [
            (1, 1, BitDepth::Eight),
            (4, 2, BitDepth::Eight),
            (u32::MAX, 1, BitDepth::Sixteen),
            (1, u32::MAX, BitDepth::Eight),
            (u32::MAX, u32::MAX, BitDepth::Sixteen),
            (0x8000_0000, 0x7FFF_FFFF, BitDepth::Eight),
        ];

        for (width, height, depth) in cases {
            let info = RasterInfo::new(width, height, depth);
            let record = IhdrData::new(&info);
            let parsed = IhdrData::parse(record.as_bytes()).unwrap();
            assert_eq!(parsed.to_info(true).unwrap(), info);
        }
    }

    #[test]
    fn test_raw_size() {
        assert_eq!(RasterInfo::new(4, 2, BitDepth::Eight).raw_size().unwrap(), 8);
        assert_eq!(RasterInfo::new(4, 2, BitDepth::Sixteen).raw_size().unwrap(), 16);

        let huge = RasterInfo::new(u32::MAX, u32::MAX, BitDepth::Sixteen);
        assert_eq!(huge.raw_size().unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_bad_bit_depth() {
        let mut bytes = IhdrData::new(&RasterInfo::new(1, 1, BitDepth::Eight))
            .as_bytes()
            .to_vec();
        bytes[8] = 4;

        let record = IhdrData::parse(&bytes).unwrap();
        assert!(matches!(
            record.to_info(true),
            Err(Error::UnsupportedBitDepth(4))
        ));
    }

    #[test]
    fn test_strict_modes() {
        let mut bytes = IhdrData::new(&RasterInfo::new(1, 1, BitDepth::Eight))
            .as_bytes()
            .to_vec();
        bytes[12] = 1; // Adam7

        let record = IhdrData::parse(&bytes).unwrap();
        assert_eq!(record.to_info(true).unwrap_err().kind(), ErrorKind::Malformed);
        assert!(record.to_info(false).is_ok());
    }

    #[test]
    fn test_wrong_length() {
        assert!(matches!(
            IhdrData::parse(&[0u8; 12]),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_zero_dimensions() {
        assert!(RasterInfo::new(0, 5, BitDepth::Eight).validate().is_err());
        assert!(RasterInfo::new(5, 5, BitDepth::Eight).validate().is_ok());

        let record = IhdrData::new(&RasterInfo::new(0, 5, BitDepth::Eight));
        assert!(record.to_info(true).is_err());
        assert!(record.to_info(false).is_ok());
    }
}
