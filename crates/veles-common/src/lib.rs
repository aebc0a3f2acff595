//! Common utilities for Veles.
//!
//! This crate provides the foundational pieces used across all Veles crates:
//!
//! - [`ByteCursor`] - Bounded little-endian reading over borrowed byte regions
//! - [`ByteWriter`] - Little-endian serialization buffer
//! - [`compress`] - zlib and LZ4 codecs with declared-size contracts

mod cursor;
mod error;
mod writer;

pub mod compress;

pub use cursor::ByteCursor;
pub use error::{Error, Result};
pub use writer::ByteWriter;
