//! Column module - typed, homogeneous row storage with wire encoding.
//!
//! Columns are split into capabilities rather than one large trait:
//!
//! - [`ColInput`] - can be encoded into a block
//! - [`ColResult`] - can be decoded from a block, reset and reused
//! - [`Infer`] - polymorphic column configured from the wire type
//! - [`StateDecoder`] / [`StateEncoder`] - column data is preceded by a
//!   type-specific prefix (e.g. a serialization version)
//!
//! A concrete column implements only what it needs. Optional capabilities
//! are discovered through `as_infer`, `as_state_decoder` and
//! `as_state_encoder`, which return `None` unless overridden.
//!
//! # Example
//!
//! ```
//! use ch_proto::column::{ColInput, ColResult, ColUInt8, Column};
//! use ch_proto::protocol::{Buffer, Reader};
//!
//! let input = ColUInt8::from(vec![1, 2, 3]);
//! let mut buf = Buffer::new();
//! input.encode_column(&mut buf);
//!
//! let mut output = ColUInt8::new();
//! output.decode_column(&mut Reader::new(buf.freeze()), 3).unwrap();
//! assert_eq!(output.values(), &[1, 2, 3]);
//! ```

mod auto;
mod column_type;
mod low_cardinality;
mod numeric;
mod string;

use std::any::Any;

pub use auto::ColAuto;
pub use column_type::ColumnType;
pub use low_cardinality::ColLowCardinality;
pub use numeric::{
    ColDateTime, ColFloat32, ColFloat64, ColInt16, ColInt32, ColInt64, ColInt8, ColNum,
    ColUInt16, ColUInt32, ColUInt64, ColUInt8, DateTime, FixedWidth,
};
pub use string::ColStr;

use crate::error::Result;
use crate::protocol::{Buffer, Reader};

/// Properties shared by input and result columns.
pub trait Column: Send + 'static {
    /// Wire type of this column.
    fn column_type(&self) -> ColumnType;

    /// Number of rows currently stored.
    fn rows(&self) -> usize;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Column that can be written into a block.
pub trait ColInput: Column {
    /// Write all rows.
    fn encode_column(&self, buf: &mut Buffer);

    /// State prefix capability, if this column needs one.
    fn as_state_encoder(&self) -> Option<&dyn StateEncoder> {
        None
    }
}

/// Column that can be read from a block.
pub trait ColResult: Column {
    /// Remove all rows, keeping allocated capacity.
    fn reset(&mut self);

    /// Read exactly `rows` rows and append them.
    fn decode_column(&mut self, r: &mut Reader, rows: usize) -> Result<()>;

    /// Type inference capability, if this column is polymorphic.
    fn as_infer(&mut self) -> Option<&mut dyn Infer> {
        None
    }

    /// State prefix capability, if this column needs one.
    fn as_state_decoder(&mut self) -> Option<&mut dyn StateDecoder> {
        None
    }
}

/// Polymorphic column that picks its representation from the wire type.
pub trait Infer {
    fn infer(&mut self, t: &ColumnType) -> Result<()>;
}

/// Reads a type-specific prefix before row data.
pub trait StateDecoder {
    fn decode_state(&mut self, r: &mut Reader) -> Result<()>;
}

/// Writes a type-specific prefix before row data.
pub trait StateEncoder {
    fn encode_state(&self, buf: &mut Buffer);
}

/// Named column to encode.
#[derive(Clone, Copy)]
pub struct InputColumn<'a> {
    pub name: &'a str,
    pub data: &'a dyn ColInput,
}

impl<'a> InputColumn<'a> {
    pub fn new(name: &'a str, data: &'a dyn ColInput) -> Self {
        Self { name, data }
    }

    /// Write name and type.
    pub fn encode_start(&self, buf: &mut Buffer) {
        buf.put_str(self.name);
        buf.put_str(self.data.column_type().as_str());
    }
}

/// Named column to decode into.
///
/// An empty name is filled in from the wire by strict result decoding.
pub struct ResultColumn {
    pub name: String,
    pub data: Box<dyn ColResult>,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, data: impl ColResult) -> Self {
        Self {
            name: name.into(),
            data: Box::new(data),
        }
    }

    /// Borrow the column as a concrete type.
    pub fn downcast_ref<T: ColResult>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the column as a concrete type.
    pub fn downcast_mut<T: ColResult>(&mut self) -> Option<&mut T> {
        self.data.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for ResultColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultColumn")
            .field("name", &self.name)
            .field("type", &self.data.column_type())
            .field("rows", &self.data.rows())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_start_writes_name_and_type() {
        let col = ColUInt8::from(vec![1]);
        let input = InputColumn::new("x", &col);
        let mut buf = Buffer::new();
        input.encode_start(&mut buf);
        assert_eq!(buf.as_slice(), b"\x01x\x05UInt8");
    }

    #[test]
    fn test_result_column_downcast() {
        let mut col = ResultColumn::new("x", ColUInt8::from(vec![7]));
        assert_eq!(col.downcast_ref::<ColUInt8>().unwrap().values(), &[7]);
        assert!(col.downcast_ref::<ColStr>().is_none());
        col.downcast_mut::<ColUInt8>().unwrap().push(8);
        assert_eq!(col.data.rows(), 2);
    }

    #[test]
    fn test_default_capabilities_absent() {
        let mut col = ColUInt8::new();
        assert!(col.as_infer().is_none());
        assert!(col.as_state_decoder().is_none());
        assert!(col.as_state_encoder().is_none());
    }
}
