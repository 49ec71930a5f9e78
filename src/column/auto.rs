//! Polymorphic column that selects its storage from the wire type.
//!
//! ```
//! use ch_proto::column::{ColAuto, ColumnType, Infer, Column};
//!
//! let mut col = ColAuto::new();
//! col.infer(&ColumnType::new("UInt64")).unwrap();
//! assert_eq!(col.column_type().as_str(), "UInt64");
//! assert!(col.infer(&ColumnType::new("Point")).is_err());
//! ```

use std::any::Any;

use super::{
    ColDateTime, ColFloat32, ColFloat64, ColInt16, ColInt32, ColInt64, ColInt8,
    ColLowCardinality, ColResult, ColStr, ColUInt16, ColUInt32, ColUInt64, ColUInt8, Column,
    ColumnType, Infer, StateDecoder,
};
use crate::error::{ProtoError, Result};
use crate::protocol::Reader;

/// Column whose concrete representation is picked by [`Infer::infer`].
///
/// Until inferred it reports an empty type, which conflicts with every wire
/// type, and refuses to decode. Downcasting goes to the inner column.
#[derive(Default)]
pub struct ColAuto {
    kind: Option<ColumnType>,
    data: Option<Box<dyn ColResult>>,
}

impl ColAuto {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a representation has been selected.
    pub fn is_inferred(&self) -> bool {
        self.data.is_some()
    }

    /// Inner column, if inferred.
    pub fn inner(&self) -> Option<&dyn ColResult> {
        self.data.as_deref()
    }

    /// Take the inner column, if inferred.
    pub fn into_inner(self) -> Option<Box<dyn ColResult>> {
        self.data
    }
}

/// Build an empty column for a wire type.
fn new_column(t: &ColumnType) -> Result<Box<dyn ColResult>> {
    let col: Box<dyn ColResult> = match t.base() {
        ColumnType::UINT8 => Box::new(ColUInt8::new()),
        ColumnType::UINT16 => Box::new(ColUInt16::new()),
        ColumnType::UINT32 => Box::new(ColUInt32::new()),
        ColumnType::UINT64 => Box::new(ColUInt64::new()),
        ColumnType::INT8 | ColumnType::ENUM8 => Box::new(ColInt8::new()),
        ColumnType::INT16 | ColumnType::ENUM16 => Box::new(ColInt16::new()),
        ColumnType::INT32 => Box::new(ColInt32::new()),
        ColumnType::INT64 => Box::new(ColInt64::new()),
        ColumnType::FLOAT32 => Box::new(ColFloat32::new()),
        ColumnType::FLOAT64 => Box::new(ColFloat64::new()),
        ColumnType::STRING => Box::new(ColStr::new()),
        ColumnType::DATETIME => Box::new(ColDateTime::new()),
        ColumnType::LOW_CARDINALITY
            if t.elem().map_or(false, |e| e.base() == ColumnType::STRING && !e.is_wrapper()) =>
        {
            Box::new(ColLowCardinality::new())
        }
        _ => return Err(ProtoError::Inference(t.clone())),
    };
    Ok(col)
}

impl Infer for ColAuto {
    fn infer(&mut self, t: &ColumnType) -> Result<()> {
        // Compatible types share a representation; keep the column.
        if let Some(kind) = self.kind.as_mut() {
            if !kind.conflicts(t) {
                *kind = t.clone();
                return Ok(());
            }
        }
        self.data = Some(new_column(t)?);
        self.kind = Some(t.clone());
        Ok(())
    }
}

impl Column for ColAuto {
    fn column_type(&self) -> ColumnType {
        self.kind.clone().unwrap_or_else(|| ColumnType::new(""))
    }

    fn rows(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.rows())
    }

    fn as_any(&self) -> &dyn Any {
        match &self.data {
            Some(d) => d.as_any(),
            None => self,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        match self.data {
            Some(ref mut d) => d.as_any_mut(),
            None => self,
        }
    }
}

impl ColResult for ColAuto {
    fn reset(&mut self) {
        if let Some(d) = self.data.as_mut() {
            d.reset();
        }
    }

    fn decode_column(&mut self, r: &mut Reader, rows: usize) -> Result<()> {
        match self.data.as_mut() {
            Some(d) => d.decode_column(r, rows),
            None => Err(ProtoError::Protocol(
                "column type is not inferred".to_string(),
            )),
        }
    }

    fn as_infer(&mut self) -> Option<&mut dyn Infer> {
        Some(self)
    }

    fn as_state_decoder(&mut self) -> Option<&mut dyn StateDecoder> {
        self.data.as_mut().and_then(|d| d.as_state_decoder())
    }
}
