//! Bounded little-endian cursor over a borrowed byte region.
//!
//! [`ByteCursor`] is the primitive every format parser in Veles is built on. It
//! borrows a byte window and tracks a position within it; the window boundary
//! is the read limit, so every access past it is a hard bounds failure rather
//! than a silent wrap. Sub-regions are split off with [`ByteCursor::take`],
//! which borrows the same backing storage without copying.

use memchr::memchr;
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A bounded cursor reading little-endian data from a byte slice.
///
/// The slice itself is the limit: `remaining()` bytes may still be read, and
/// any access beyond that yields [`Error::UnexpectedEof`] carrying the offset
/// at which the read was attempted.
///
/// # Example
///
/// ```
/// use veles_common::ByteCursor;
///
/// let data = [0x34, 0x12, 0x00, 0x00, 0xFF];
/// let mut cur = ByteCursor::new(&data);
///
/// assert_eq!(cur.read_u32().unwrap(), 0x1234);
/// assert_eq!(cur.remaining(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor over the whole slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current position within the window.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Total window length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Bytes left before the limit.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// True if the cursor is exhausted.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Advance the position by `count` bytes.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Remaining bytes as a slice, without advancing.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    fn bounds_error(&self, needed: usize) -> Error {
        Error::UnexpectedEof {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }

    /// Peek at bytes without advancing.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(self.bounds_error(count));
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Split off a sub-cursor over the next `len` bytes.
    ///
    /// The child borrows the same backing storage, bounded to
    /// `[position, position + len)`; the parent advances past it. Fails if
    /// fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize) -> Result<ByteCursor<'a>> {
        let bytes = self.read_bytes(len)?;
        Ok(ByteCursor::new(bytes))
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read a boolean (non-zero = true).
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|b| b != 0)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_u16().map(|v| v as i16)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_u32().map(|v| v as i32)
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_u64().map(|v| v as i64)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_u32().map(f32::from_bits)
    }

    /// Read a 4-byte tag (record/field code, magic).
    #[inline]
    pub fn read_four(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read a null-terminated string (zstring).
    pub fn read_zstring(&mut self) -> Result<&'a str> {
        let rest = self.remaining_bytes();
        let null_pos = memchr(0, rest).ok_or(Error::MissingNullTerminator)?;
        let s = std::str::from_utf8(&rest[..null_pos])?;
        self.position += null_pos + 1;
        Ok(s)
    }

    /// Read a length-prefixed string where the u8 length includes the
    /// terminating null (bzstring).
    pub fn read_bzstring(&mut self) -> Result<&'a str> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(std::str::from_utf8(&bytes[..end])?)
    }

    /// Read a u8 length-prefixed string with no terminator (bstring).
    pub fn read_bstring(&mut self) -> Result<&'a str> {
        let len = self.read_u8()? as usize;
        Ok(std::str::from_utf8(self.read_bytes(len)?)?)
    }

    /// Read a u16 length-prefixed string with no terminator (wstring).
    pub fn read_wstring(&mut self) -> Result<&'a str> {
        let len = self.read_u16()? as usize;
        Ok(std::str::from_utf8(self.read_bytes(len)?)?)
    }

    /// Read a fixed-layout struct using zerocopy.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            offset: self.position,
            needed: size,
            available: bytes.len(),
        })
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.read_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_primitives() {
        let data = [
            0x01u8, 0x02, 0x03, 0x04, // u32 0x04030201
            0x05, // u8
            0x00, 0x80, // u16 0x8000
        ];
        let mut cur = ByteCursor::new(&data);
        assert_eq!(cur.read_u32().unwrap(), 0x04030201);
        assert_eq!(cur.read_u8().unwrap(), 5);
        assert_eq!(cur.read_u16().unwrap(), 0x8000);
        assert!(cur.is_empty());
    }

    #[test]
    fn take_bounds_child_and_advances_parent() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut cur = ByteCursor::new(&data);
        cur.advance(1);

        let mut child = cur.take(3).unwrap();
        assert_eq!(cur.position(), 4);
        assert_eq!(child.read_bytes(3).unwrap(), &[2, 3, 4]);
        assert!(child.read_u8().is_err());

        assert_eq!(cur.read_u16().unwrap(), 0x0605);
    }

    #[test]
    fn take_past_limit_fails() {
        let data = [0u8; 4];
        let mut cur = ByteCursor::new(&data);
        assert!(cur.take(5).is_err());
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn eof_carries_offset() {
        let data = [0u8; 2];
        let mut cur = ByteCursor::new(&data);
        cur.advance(1);
        match cur.read_u32() {
            Err(Error::UnexpectedEof {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 1);
            }
            other => panic!("expected bounds failure, got {:?}", other),
        }
    }

    #[test]
    fn string_forms() {
        let mut data = Vec::new();
        data.extend_from_slice(b"plain\0");
        data.push(4); // bzstring: len includes null
        data.extend_from_slice(b"abc\0");
        data.push(3); // bstring
        data.extend_from_slice(b"xyz");
        data.extend_from_slice(&5u16.to_le_bytes()); // wstring
        data.extend_from_slice(b"hello");

        let mut cur = ByteCursor::new(&data);
        assert_eq!(cur.read_zstring().unwrap(), "plain");
        assert_eq!(cur.read_bzstring().unwrap(), "abc");
        assert_eq!(cur.read_bstring().unwrap(), "xyz");
        assert_eq!(cur.read_wstring().unwrap(), "hello");
        assert!(cur.is_empty());
    }

    #[test]
    fn missing_terminator_is_an_error() {
        let mut cur = ByteCursor::new(b"no-null-here");
        assert!(matches!(
            cur.read_zstring(),
            Err(Error::MissingNullTerminator)
        ));
    }

    #[test]
    fn expect_magic_mismatch() {
        let mut cur = ByteCursor::new(b"BTDX....");
        assert!(cur.expect_magic(b"BSA\0").is_err());
    }
}
