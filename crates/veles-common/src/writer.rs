//! Little-endian output buffer mirroring [`ByteCursor`](crate::ByteCursor)'s
//! string conventions.
//!
//! Serialization in Veles is sized up front from the in-memory entities, so
//! the writer is a plain growing buffer; callers that know the final size
//! pre-allocate with [`ByteWriter::with_capacity`].

use zerocopy::{Immutable, IntoBytes};

/// A growing little-endian byte writer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the buffer.
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.write_u8(value as u8);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.write_u16(value as u16);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.write_u64(value as u64);
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Write a null-terminated string (zstring).
    pub fn write_zstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Write a u8 length-prefixed string where the length includes the
    /// terminating null (bzstring).
    pub fn write_bzstring(&mut self, s: &str) {
        debug_assert!(s.len() < 255);
        self.write_u8((s.len() + 1) as u8);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Write a u8 length-prefixed string with no terminator (bstring).
    pub fn write_bstring(&mut self, s: &str) {
        debug_assert!(s.len() <= 255);
        self.write_u8(s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Write a u16 length-prefixed string with no terminator (wstring).
    pub fn write_wstring(&mut self, s: &str) {
        debug_assert!(s.len() <= u16::MAX as usize);
        self.write_u16(s.len() as u16);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Write a fixed-layout struct using zerocopy.
    #[inline]
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) {
        self.buf.extend_from_slice(value.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteCursor;

    #[test]
    fn primitives_round_trip() {
        let mut w = ByteWriter::new();
        w.write_u32(0xDEAD_BEEF);
        w.write_i16(-2);
        w.write_f32(1.5);

        let bytes = w.into_vec();
        let mut cur = ByteCursor::new(&bytes);
        assert_eq!(cur.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(cur.read_i16().unwrap(), -2);
        assert_eq!(cur.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn strings_round_trip() {
        let mut w = ByteWriter::new();
        w.write_zstring("meshes");
        w.write_bzstring("armor");
        w.write_bstring("iron");
        w.write_wstring("cuisse");

        let bytes = w.into_vec();
        let mut cur = ByteCursor::new(&bytes);
        assert_eq!(cur.read_zstring().unwrap(), "meshes");
        assert_eq!(cur.read_bzstring().unwrap(), "armor");
        assert_eq!(cur.read_bstring().unwrap(), "iron");
        assert_eq!(cur.read_wstring().unwrap(), "cuisse");
        assert!(cur.is_empty());
    }
}
