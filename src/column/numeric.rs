//! Fixed-width numeric columns.
//!
//! One generic [`ColNum`] covers every integer and float width. Rows are
//! stored in a `Vec<T>` and transferred as `rows` contiguous Little Endian
//! values; decode reads the whole run with a single bounds check.

use std::any::Any;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{ColInput, ColResult, Column, ColumnType};
use crate::error::{ProtoError, Result, ResultExt};
use crate::protocol::{Buffer, Reader};

/// Primitive value with a fixed wire width.
pub trait FixedWidth: Copy + Default + PartialEq + fmt::Debug + Send + 'static {
    /// Encoded size in bytes.
    const WIDTH: usize;
    /// Wire type name.
    const TYPE: &'static str;

    /// Append the Little Endian encoding.
    fn put(self, buf: &mut Buffer);

    /// Decode from exactly `WIDTH` bytes.
    fn from_le_slice(b: &[u8]) -> Self;
}

macro_rules! fixed_width {
    ($($t:ty => $name:expr, $put:ident;)*) => {
        $(
            impl FixedWidth for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();
                const TYPE: &'static str = $name;

                #[inline]
                fn put(self, buf: &mut Buffer) {
                    buf.$put(self);
                }

                #[inline]
                fn from_le_slice(b: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(b);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

fixed_width! {
    u8 => ColumnType::UINT8, put_u8;
    u16 => ColumnType::UINT16, put_u16;
    u32 => ColumnType::UINT32, put_u32;
    u64 => ColumnType::UINT64, put_u64;
    i8 => ColumnType::INT8, put_i8;
    i16 => ColumnType::INT16, put_i16;
    i32 => ColumnType::INT32, put_i32;
    i64 => ColumnType::INT64, put_i64;
    f32 => ColumnType::FLOAT32, put_f32;
    f64 => ColumnType::FLOAT64, put_f64;
}

/// Seconds since the Unix epoch, as stored by `DateTime` columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(pub u32);

impl DateTime {
    /// Convert from a system time, truncating sub-second precision.
    ///
    /// Returns `None` outside the representable range (1970..2106).
    pub fn from_system_time(t: SystemTime) -> Option<Self> {
        let secs = t.duration_since(UNIX_EPOCH).ok()?.as_secs();
        u32::try_from(secs).ok().map(DateTime)
    }

    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(u64::from(self.0))
    }
}

impl FixedWidth for DateTime {
    const WIDTH: usize = 4;
    const TYPE: &'static str = ColumnType::DATETIME;

    #[inline]
    fn put(self, buf: &mut Buffer) {
        buf.put_u32(self.0);
    }

    #[inline]
    fn from_le_slice(b: &[u8]) -> Self {
        DateTime(u32::from_le_slice(b))
    }
}

/// Column of fixed-width values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColNum<T: FixedWidth> {
    values: Vec<T>,
}

pub type ColUInt8 = ColNum<u8>;
pub type ColUInt16 = ColNum<u16>;
pub type ColUInt32 = ColNum<u32>;
pub type ColUInt64 = ColNum<u64>;
pub type ColInt8 = ColNum<i8>;
pub type ColInt16 = ColNum<i16>;
pub type ColInt32 = ColNum<i32>;
pub type ColInt64 = ColNum<i64>;
pub type ColFloat32 = ColNum<f32>;
pub type ColFloat64 = ColNum<f64>;
pub type ColDateTime = ColNum<DateTime>;

impl<T: FixedWidth> ColNum<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, v: T) {
        self.values.push(v);
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn get(&self, row: usize) -> Option<T> {
        self.values.get(row).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Allocated row capacity.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.values
    }
}

impl<T: FixedWidth> From<Vec<T>> for ColNum<T> {
    fn from(values: Vec<T>) -> Self {
        Self { values }
    }
}

impl<T: FixedWidth> FromIterator<T> for ColNum<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<T: FixedWidth> Extend<T> for ColNum<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl<T: FixedWidth> Column for ColNum<T> {
    fn column_type(&self) -> ColumnType {
        ColumnType::new(T::TYPE)
    }

    #[inline]
    fn rows(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: FixedWidth> ColInput for ColNum<T> {
    fn encode_column(&self, buf: &mut Buffer) {
        for &v in &self.values {
            v.put(buf);
        }
    }
}

impl<T: FixedWidth> ColResult for ColNum<T> {
    #[inline]
    fn reset(&mut self) {
        self.values.clear();
    }

    fn decode_column(&mut self, r: &mut Reader, rows: usize) -> Result<()> {
        let size = rows.checked_mul(T::WIDTH).ok_or_else(|| {
            ProtoError::Protocol(format!("{} rows of {} overflow", rows, T::TYPE))
        })?;
        let data = r.read_raw(size).context("read")?;
        self.values.reserve(rows);
        self.values
            .extend(data.chunks_exact(T::WIDTH).map(T::from_le_slice));
        Ok(())
    }
}
