//! CRC-32 hashing utilities.
//!
//! This is the reflected CRC-32 shared by PNG, zlib and Ethernet
//! (polynomial `0xEDB88320`, all-ones initial value, complemented result).
//! Every chunk in a zpng container carries one, computed over the chunk type
//! followed by the chunk data.

/// Reflected CRC-32 polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table for byte-at-a-time CRC computation.
///
/// Built at compile time, so there is no runtime initialisation to race on.
pub static TABLE: [u32; 256] = make_table();

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;

    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }

    table
}

/// Run the raw (uncomplemented) register over `data`.
#[inline]
fn update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// Compute the CRC-32 of a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    !update(u32::MAX, data)
}

/// Incremental CRC-32 hasher.
///
/// Lets a chunk's type and data be checksummed as one sequence without
/// concatenating them first.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    state: u32,
}

impl Hasher {
    /// Create a hasher in the initial state.
    #[inline]
    pub const fn new() -> Self {
        Self { state: u32::MAX }
    }

    /// Feed more bytes into the hasher.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.state = update(self.state, data);
    }

    /// Finish and return the checksum.
    #[inline]
    pub const fn finalize(self) -> u32 {
        !self.state
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hash() {
        assert_eq!(hash_bytes(&[]), 0);
    }

    #[test]
    fn test_check_value() {
        // Standard CRC-32 check value
        assert_eq!(hash_bytes(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_iend_hash() {
        assert_eq!(hash_bytes(b"IEND"), 0xAE42_6082);
    }

    #[test]
    fn test_table_entries() {
        assert_eq!(TABLE[0], 0);
        assert_eq!(TABLE[1], 0x7707_3096);
        assert_eq!(TABLE[128], 0xEDB8_8320);
        assert_eq!(TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn test_deterministic() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let first = hash_bytes(&data);
        for _ in 0..4 {
            assert_eq!(hash_bytes(&data), first);
        }
    }

    #[test]
    fn test_hasher_spans_type_and_data() {
        let mut hasher = Hasher::new();
        hasher.update(b"IHDR");
        hasher.update(b"payload");
        assert_eq!(hasher.finalize(), hash_bytes(b"IHDRpayload"));
    }

    #[test]
    fn test_hasher_matches_one_shot() {
        let mut hasher = Hasher::new();
        hasher.update(b"1234");
        hasher.update(b"");
        hasher.update(b"56789");
        assert_eq!(hasher.finalize(), 0xCBF4_3926);
        assert_eq!(Hasher::default().finalize(), 0);
    }
}
