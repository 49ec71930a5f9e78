//! Cursor over received bytes for reading primitive wire values.
//!
//! Every read checks the remaining length first and fails with
//! [`ProtoError::UnexpectedEof`] instead of panicking. A failed read leaves
//! the cursor where it was.
//!
//! # Example
//!
//! ```
//! use ch_proto::protocol::Reader;
//!
//! let mut r = Reader::new(vec![2, b'i', b'd', 7, 0, 0, 0]);
//! assert_eq!(r.str().unwrap(), "id");
//! assert_eq!(r.u32().unwrap(), 7);
//! assert!(r.u8().is_err());
//! ```

use bytes::{Buf, Bytes};

use crate::error::{ProtoError, Result};

/// Maximum encoded length of a 64-bit varint.
const MAX_VARINT_LEN: usize = 10;

/// Reader over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
}

macro_rules! read_fixed {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $get:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            self.ensure(std::mem::size_of::<$ty>(), stringify!($name))?;
            Ok(self.buf.$get())
        }
    };
}

impl Reader {
    /// Create a reader over the given bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { buf: data.into() }
    }

    /// Get the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Check if all bytes were consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    #[inline]
    fn ensure(&self, needed: usize, what: &'static str) -> Result<()> {
        let available = self.buf.remaining();
        if available < needed {
            return Err(ProtoError::UnexpectedEof {
                what,
                needed,
                available,
            });
        }
        Ok(())
    }

    read_fixed!(u8, u8, get_u8);
    read_fixed!(i8, i8, get_i8);
    read_fixed!(u16, u16, get_u16_le);
    read_fixed!(u32, u32, get_u32_le);
    read_fixed!(u64, u64, get_u64_le);
    read_fixed!(i16, i16, get_i16_le);
    read_fixed!(i32, i32, get_i32_le);
    read_fixed!(i64, i64, get_i64_le);
    read_fixed!(f32, f32, get_f32_le);
    read_fixed!(f64, f64, get_f64_le);

    /// Read a boolean octet (0 or 1).
    pub fn bool(&mut self) -> Result<bool> {
        self.ensure(1, "bool")?;
        let v = self.buf.chunk()[0];
        let b = match v {
            0 => false,
            1 => true,
            v => return Err(ProtoError::InvalidBool(v)),
        };
        self.buf.advance(1);
        Ok(b)
    }

    /// Read an unsigned LEB128 varint.
    pub fn uvarint(&mut self) -> Result<u64> {
        let data = self.buf.chunk();
        let available = data.len();
        let mut value = 0u64;
        let mut consumed = None;
        for (i, &b) in data.iter().enumerate() {
            if i == MAX_VARINT_LEN || (i == MAX_VARINT_LEN - 1 && b > 1) {
                return Err(ProtoError::Protocol("varint overflows 64 bits".to_string()));
            }
            value |= u64::from(b & 0x7F) << (7 * i);
            if b < 0x80 {
                consumed = Some(i + 1);
                break;
            }
        }
        match consumed {
            Some(n) => {
                self.buf.advance(n);
                Ok(value)
            }
            None => Err(ProtoError::UnexpectedEof {
                what: "uvarint",
                needed: available + 1,
                available,
            }),
        }
    }

    /// Read a count (column count, row count, length).
    ///
    /// Returned as `u64` so callers can bound-check before narrowing.
    #[inline]
    pub fn int(&mut self) -> Result<u64> {
        self.uvarint()
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn str(&mut self) -> Result<String> {
        let data = self.str_bytes()?;
        String::from_utf8(data.to_vec()).map_err(|_| ProtoError::InvalidString)
    }

    /// Read a length-prefixed byte string without UTF-8 validation.
    pub fn str_bytes(&mut self) -> Result<Bytes> {
        let start = self.buf.clone();
        let len = self.uvarint()?;
        let len = usize::try_from(len)
            .map_err(|_| ProtoError::Protocol(format!("string length {} too large", len)))?;
        if let Err(e) = self.ensure(len, "string") {
            self.buf = start;
            return Err(e);
        }
        Ok(self.buf.copy_to_bytes(len))
    }

    /// Read exactly `n` raw bytes (zero-copy).
    pub fn read_raw(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n, "raw")?;
        Ok(self.buf.copy_to_bytes(n))
    }
}
