//! Block: the unit of columnar data transfer.
//!
//! ```text
//! ┌──────────────────┬─────────┬──────┬──────────────────────────────┐
//! │ BlockInfo        │ Columns │ Rows │ per column:                  │
//! │ (revision gated) │ varint  │varint│ name, type, [state], payload │
//! └──────────────────┴─────────┴──────┴──────────────────────────────┘
//! ```
//!
//! A block with zero columns and zero rows marks the end of a data stream
//! and carries nothing after its header.

use tracing::{debug, trace};

use super::{BlockInfo, Buffer, Feature, Reader};
use crate::column::{ColumnType, InputColumn, ResultColumn};
use crate::error::{ProtoError, Result, ResultExt};
use crate::results::DecodeResult;

/// Maximum columns in a single block.
pub const MAX_COLUMNS_IN_BLOCK: u64 = 1_000_000;

/// Maximum rows in a single block.
pub const MAX_ROWS_IN_BLOCK: u64 = 1_000_000;

/// Block header: info plus declared column and row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Block {
    pub info: BlockInfo,
    pub columns: usize,
    pub rows: usize,
}

impl Block {
    /// Create a header with default info.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            info: BlockInfo::default(),
            columns,
            rows,
        }
    }

    /// Header describing `input`, taking rows from the first column.
    pub fn for_input(input: &[InputColumn<'_>]) -> Self {
        Self::new(input.len(), input.first().map_or(0, |c| c.data.rows()))
    }

    /// Check if this is the end-of-stream marker.
    #[inline]
    pub fn end(&self) -> bool {
        self.columns == 0 && self.rows == 0
    }

    /// Encode info (if the revision has it) and counts.
    pub fn encode_aware(&self, buf: &mut Buffer, revision: u32) {
        if Feature::BlockInfo.in_revision(revision) {
            self.info.encode(buf);
        }
        buf.put_int(self.columns);
        buf.put_int(self.rows);
    }

    /// Encode the header followed by every column.
    ///
    /// All columns are validated before anything is written, so on error
    /// `buf` is left untouched.
    pub fn encode_block(
        &self,
        buf: &mut Buffer,
        revision: u32,
        input: &[InputColumn<'_>],
    ) -> Result<()> {
        if input.len() != self.columns {
            return Err(ProtoError::SchemaMismatch(format!(
                "{} (columns) != {} (input)",
                self.columns,
                input.len()
            )));
        }
        for (i, col) in input.iter().enumerate() {
            let rows = col.data.rows();
            if rows != self.rows {
                return Err(ProtoError::SchemaMismatch(format!(
                    "column [{}] {:?} has {} rows, expected {}",
                    i, col.name, rows, self.rows
                )));
            }
        }

        self.encode_aware(buf, revision);
        for col in input {
            col.encode_start(buf);
            if self.rows > 0 {
                if let Some(state) = col.data.as_state_encoder() {
                    state.encode_state(buf);
                }
            }
            col.data.encode_column(buf);
        }
        Ok(())
    }

    /// Decode column and row counts, enforcing bounds.
    pub fn decode_header(&mut self, r: &mut Reader) -> Result<()> {
        self.columns = read_count(r, "columns", MAX_COLUMNS_IN_BLOCK)?;
        self.rows = read_count(r, "rows", MAX_ROWS_IN_BLOCK)?;
        Ok(())
    }

    /// Decode counts and columns into `target`.
    ///
    /// With an empty `target` and no rows, only column names and types are
    /// consumed. Otherwise columns must match `target` positionally by name
    /// and by compatible type.
    pub fn decode_raw_block(&mut self, r: &mut Reader, target: &mut [ResultColumn]) -> Result<()> {
        self.decode_header(r)?;
        if self.end() {
            debug!("end of data block");
            return Ok(());
        }

        let no_target = target.is_empty();
        check_columns(self, target.len())?;
        if no_target {
            debug!(columns = self.columns, "reading column headers only");
        }

        for i in 0..self.columns {
            let (name, column_type) = read_column_start(r, i)?;
            if no_target {
                trace!(index = i, name = %name, column_type = %column_type, "column header");
                continue;
            }

            let t = &mut target[i];
            check_name(i, &t.name, &name)?;
            check_type(i, &name, &column_type, &t.data.column_type())?;

            t.data.reset();
            if self.rows > 0 {
                if let Some(state) = t.data.as_state_decoder() {
                    state
                        .decode_state(r)
                        .with_context(|| format!("{} state", name))?;
                }
            }
            t.data
                .decode_column(r, self.rows)
                .with_context(|| format!("column [{}] {}", i, name))?;
            trace!(index = i, name = %name, rows = self.rows, "decoded column");
        }
        Ok(())
    }

    /// Decode info (if the revision has it) and a raw block into `target`.
    pub fn decode_block(
        &mut self,
        r: &mut Reader,
        revision: u32,
        target: &mut [ResultColumn],
    ) -> Result<()> {
        self.decode_info(r, revision)?;
        self.decode_raw_block(r, target)
    }

    /// Decode info and counts, then hand column decoding to `result`.
    ///
    /// `result` is not called for the end-of-stream marker.
    pub fn decode_result(
        &mut self,
        r: &mut Reader,
        revision: u32,
        result: &mut dyn DecodeResult,
    ) -> Result<()> {
        self.decode_info(r, revision)?;
        self.decode_header(r)?;
        if self.end() {
            debug!("end of data block");
            return Ok(());
        }
        result.decode_result(r, self)
    }

    fn decode_info(&mut self, r: &mut Reader, revision: u32) -> Result<()> {
        if Feature::BlockInfo.in_revision(revision) {
            self.info.decode(r).context("info")?;
        }
        Ok(())
    }
}

fn read_count(r: &mut Reader, what: &'static str, max: u64) -> Result<usize> {
    let v = r.int().context(what)?;
    if v > max {
        return Err(ProtoError::Bounds { what, value: v, max });
    }
    // Bounded by max, fits any usize.
    Ok(v as usize)
}

/// Column count must match the target unless there is neither a target
/// nor any rows to check.
pub(crate) fn check_columns(block: &Block, target: usize) -> Result<()> {
    let allow_mismatch = target == 0 && block.rows == 0;
    if block.columns != target && !allow_mismatch {
        return Err(ProtoError::SchemaMismatch(format!(
            "{} (columns) != {} (target)",
            block.columns, target
        )));
    }
    Ok(())
}

/// Read a column name and type.
pub(crate) fn read_column_start(r: &mut Reader, i: usize) -> Result<(String, ColumnType)> {
    let name = r.str().with_context(|| format!("column [{}] name", i))?;
    let column_type = r.str().with_context(|| format!("column [{}] type", i))?;
    Ok((name, ColumnType::new(column_type)))
}

pub(crate) fn check_name(i: usize, expected: &str, got: &str) -> Result<()> {
    if expected != got {
        return Err(ProtoError::SchemaMismatch(format!(
            "[{}]: unexpected column {:?} ({:?} expected)",
            i, got, expected
        )));
    }
    Ok(())
}

pub(crate) fn check_type(i: usize, name: &str, got: &ColumnType, has: &ColumnType) -> Result<()> {
    if got.conflicts(has) {
        return Err(ProtoError::SchemaMismatch(format!(
            "[{}]: {}: unexpected type {:?} (got) instead of {:?} (has)",
            i,
            name,
            got.as_str(),
            has.as_str()
        )));
    }
    Ok(())
}
