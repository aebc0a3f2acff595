//! Compression codecs shared by the container and plugin parsers.
//!
//! Two schemes appear on disk: zlib (v103/v104 archives, BA2 file data, and
//! compressed plugin records) and LZ4 frame (v105 archives). Decompression is
//! always against a size declared elsewhere in the format; producing anything
//! other than exactly that many bytes is a data-integrity error, never a
//! silent truncation.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lz4_flex::frame::{FrameDecoder, FrameEncoder};

use crate::{Error, Result};

/// Compress data with zlib at the default level.
pub fn compress_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Compression(e.to_string()))?;
    encoder.finish().map_err(|e| Error::Compression(e.to_string()))
}

/// Decompress zlib data that must inflate to exactly `expected` bytes.
pub fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected);
    ZlibDecoder::new(data)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    check_size(output, expected)
}

/// Compress data into an LZ4 frame.
pub fn compress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = FrameEncoder::new(Vec::new());
    encoder
        .write_all(data)
        .map_err(|e| Error::Compression(e.to_string()))?;
    encoder.finish().map_err(|e| Error::Compression(e.to_string()))
}

/// Decompress an LZ4 frame that must inflate to exactly `expected` bytes.
pub fn decompress_lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected);
    FrameDecoder::new(data)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    check_size(output, expected)
}

fn check_size(output: Vec<u8>, expected: usize) -> Result<Vec<u8>> {
    if output.len() == expected {
        Ok(output)
    } else {
        Err(Error::SizeMismatch {
            expected,
            actual: output.len(),
        })
    }
}
