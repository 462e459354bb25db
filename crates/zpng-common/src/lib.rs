//! Common utilities for zpng.
//!
//! This crate provides the low-level building blocks shared by the zpng crates:
//!
//! - [`BinaryReader`] - Zero-copy big-endian reading from byte slices
//! - [`BinaryWriter`] - Bounds-checked big-endian writing into caller buffers
//! - [`crc`] - CRC-32 checksums as used by PNG-style chunks

mod error;
mod reader;
mod writer;

pub mod crc;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;
