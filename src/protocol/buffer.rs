//! Growable output buffer for primitive wire values.
//!
//! All fixed-width integers and floats are Little Endian. Counts and string
//! lengths are LEB128 unsigned varints.
//!
//! # Example
//!
//! ```
//! use ch_proto::protocol::Buffer;
//!
//! let mut buf = Buffer::new();
//! buf.put_str("id");
//! buf.put_u32(7);
//! assert_eq!(buf.as_slice(), &[2, b'i', b'd', 7, 0, 0, 0]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

/// Default initial capacity (4KB).
const DEFAULT_CAPACITY: usize = 4 * 1024;

/// Output buffer backed by `BytesMut`.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    buf: BytesMut,
}

impl Buffer {
    /// Create a new buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new buffer with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    #[inline]
    pub fn put_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    /// Booleans are a single octet, 0 or 1.
    #[inline]
    pub fn put_bool(&mut self, v: bool) {
        self.buf.put_u8(v as u8);
    }

    #[inline]
    pub fn put_u16(&mut self, v: u16) {
        self.buf.put_u16_le(v);
    }

    #[inline]
    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    #[inline]
    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    #[inline]
    pub fn put_i16(&mut self, v: i16) {
        self.buf.put_i16_le(v);
    }

    #[inline]
    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    #[inline]
    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    #[inline]
    pub fn put_f32(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    #[inline]
    pub fn put_f64(&mut self, v: f64) {
        self.buf.put_f64_le(v);
    }

    /// Write an unsigned LEB128 varint.
    pub fn put_uvarint(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.put_u8((v as u8) | 0x80);
            v >>= 7;
        }
        self.buf.put_u8(v as u8);
    }

    /// Write a count (column count, row count, length).
    #[inline]
    pub fn put_int(&mut self, v: usize) {
        self.put_uvarint(v as u64);
    }

    /// Write a length-prefixed string.
    pub fn put_str(&mut self, s: &str) {
        self.put_int(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Write raw bytes without a length prefix.
    #[inline]
    pub fn put_raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Get the number of written bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Clear written data, keeping capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Convert into immutable `Bytes` (zero-copy).
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uvarint_encoding() {
        let mut buf = Buffer::new();
        buf.put_uvarint(0);
        buf.put_uvarint(127);
        buf.put_uvarint(128);
        buf.put_uvarint(300);
        assert_eq!(buf.as_slice(), &[0x00, 0x7F, 0x80, 0x01, 0xAC, 0x02]);
    }

    #[test]
    fn test_uvarint_max_is_ten_bytes() {
        let mut buf = Buffer::new();
        buf.put_uvarint(u64::MAX);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn test_little_endian_byte_order() {
        let mut buf = Buffer::new();
        buf.put_u32(0x0102_0304);
        buf.put_i16(-2);
        assert_eq!(buf.as_slice(), &[0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn test_put_str_prefixes_length() {
        let mut buf = Buffer::new();
        buf.put_str("UInt8");
        assert_eq!(buf.as_slice()[0], 5);
        assert_eq!(&buf.as_slice()[1..], b"UInt8");
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut buf = Buffer::with_capacity(64);
        buf.put_raw(&[1; 32]);
        buf.reset();
        assert!(buf.is_empty());
        buf.put_bool(true);
        assert_eq!(buf.freeze().as_ref(), &[1]);
    }
}
