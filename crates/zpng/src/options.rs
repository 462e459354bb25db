//! Encoder and decoder configuration.

use crate::compress::{Codec, DEFAULT_LEVEL};

/// Options controlling how a container is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Compression level passed to the back-end.
    pub level: i32,
    /// Compressor back-end.
    pub codec: Codec,
}

impl EncoderOptions {
    /// Options with the default level and back-end.
    pub const fn new() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            codec: Codec::Zstd,
        }
    }

    /// Set the compression level.
    pub const fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Set the compressor back-end.
    pub const fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Options controlling how a container is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Decompressor back-end.
    pub codec: Codec,
    /// Verify every chunk CRC.
    pub verify_crc: bool,
    /// Require zero mode bytes, non-zero dimensions and a trailing IEND.
    pub strict: bool,
}

impl DecoderOptions {
    /// Options that verify everything.
    pub const fn new() -> Self {
        Self {
            codec: Codec::Zstd,
            verify_crc: true,
            strict: true,
        }
    }

    /// Set the decompressor back-end.
    pub const fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Enable or disable CRC verification.
    pub const fn with_verify_crc(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }

    /// Enable or disable strict structure checks.
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::new()
    }
}
