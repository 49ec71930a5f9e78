//! Result set: named result columns filled from data blocks.
//!
//! Two decoding modes:
//!
//! - **Strict** ([`Results`] as [`DecodeResult`]): wire columns are checked
//!   positionally against the expected columns. Blank expected names are
//!   filled in from the wire, and polymorphic columns are inferred before
//!   the type check.
//! - **Automatic** ([`Results::auto`]): the first block with columns defines
//!   the schema. [`ColAuto`] picks a concrete column per wire type and only
//!   that concrete column is kept, so every later block is decoded strictly
//!   against the schema and a changed type is a mismatch.
//!
//! # Example
//!
//! ```
//! use ch_proto::column::{ColUInt8, InputColumn};
//! use ch_proto::protocol::{Block, Buffer, Reader};
//! use ch_proto::results::{Results, SchemaState};
//!
//! let col = ColUInt8::from(vec![1, 2, 3]);
//! let input = [InputColumn::new("x", &col)];
//! let mut buf = Buffer::new();
//! Block::for_input(&input).encode_block(&mut buf, 0, &input).unwrap();
//!
//! let mut results = Results::new();
//! let mut block = Block::default();
//! block
//!     .decode_result(&mut Reader::new(buf.freeze()), 0, &mut results.auto())
//!     .unwrap();
//! assert_eq!(results.state(), SchemaState::Resolved);
//! assert_eq!(results.rows(), 3);
//! ```

use tracing::debug;

use crate::column::{ColAuto, ColResult, Infer, ResultColumn};
use crate::error::{ProtoError, Result, ResultExt};
use crate::protocol::block::{check_columns, check_name, check_type, read_column_start};
use crate::protocol::{Block, Reader};

/// Receiver of the columns of a decoded block header.
pub trait DecodeResult {
    /// Decode `block.columns` columns of `block.rows` rows each.
    fn decode_result(&mut self, r: &mut Reader, block: &Block) -> Result<()>;
}

/// Whether the result schema is known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// No columns; automatic decoding may define them.
    Unresolved,
    /// Columns fixed; every block is validated against them.
    Resolved,
}

/// Ordered result columns with an explicit schema state.
#[derive(Debug)]
pub struct Results {
    columns: Vec<ResultColumn>,
    state: SchemaState,
}

impl Default for Results {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<ResultColumn>> for Results {
    /// Expected schema; resolved unless `columns` is empty.
    fn from(columns: Vec<ResultColumn>) -> Self {
        let state = if columns.is_empty() {
            SchemaState::Unresolved
        } else {
            SchemaState::Resolved
        };
        Self { columns, state }
    }
}

impl FromIterator<ResultColumn> for Results {
    fn from_iter<I: IntoIterator<Item = ResultColumn>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Results {
    /// Create an unresolved, empty result set.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            state: SchemaState::Unresolved,
        }
    }

    pub fn state(&self) -> SchemaState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state == SchemaState::Resolved
    }

    /// Automatic decoding handle.
    pub fn auto(&mut self) -> AutoResults<'_> {
        AutoResults { results: self }
    }

    /// Rows in the last decoded block.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.rows())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    /// Mutable access to the data of a named column.
    ///
    /// Names and column kinds stay fixed; only the data is reachable.
    pub fn data_mut(&mut self, name: &str) -> Option<&mut dyn ColResult> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut *c.data)
    }

    /// Find a column by name.
    pub fn get(&self, name: &str) -> Option<&ResultColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Empty every column, keeping the schema and capacity.
    pub fn reset(&mut self) {
        for col in &mut self.columns {
            col.data.reset();
        }
    }

    /// Consume into the column list.
    pub fn into_columns(self) -> Vec<ResultColumn> {
        self.columns
    }

    fn decode_strict(&mut self, r: &mut Reader, block: &Block) -> Result<()> {
        check_columns(block, self.columns.len())?;
        let no_target = self.columns.is_empty();

        for i in 0..block.columns {
            let (name, column_type) = read_column_start(r, i)?;
            if no_target {
                continue;
            }

            let t = &mut self.columns[i];
            if t.name.is_empty() {
                t.name = name.clone();
            }
            check_name(i, &t.name, &name)?;
            if let Some(infer) = t.data.as_infer() {
                infer.infer(&column_type).context("infer")?;
            }
            check_type(i, &name, &column_type, &t.data.column_type())?;

            t.data.reset();
            if block.rows == 0 {
                continue;
            }
            decode_rows(&mut *t.data, r, &name, block.rows)?;
        }
        Ok(())
    }

    fn decode_auto(&mut self, r: &mut Reader, block: &Block) -> Result<()> {
        if self.state == SchemaState::Resolved {
            return self.decode_strict(r, block);
        }

        let mut columns = Vec::with_capacity(block.columns);
        for i in 0..block.columns {
            let (name, column_type) = read_column_start(r, i)?;
            let mut auto = ColAuto::new();
            auto.infer(&column_type)
                .context("column type inference")?;
            let mut data = auto
                .into_inner()
                .ok_or_else(|| ProtoError::Inference(column_type.clone()))?;
            data.reset();
            if block.rows != 0 {
                decode_rows(&mut *data, r, &name, block.rows)?;
            }
            columns.push(ResultColumn { name, data });
        }

        if !columns.is_empty() {
            debug!(
                columns = columns.len(),
                rows = block.rows,
                "inferred result schema"
            );
            self.columns = columns;
            self.state = SchemaState::Resolved;
        }
        Ok(())
    }
}

/// Decode optional state prefix and rows into one column.
fn decode_rows(col: &mut dyn ColResult, r: &mut Reader, name: &str, rows: usize) -> Result<()> {
    if let Some(state) = col.as_state_decoder() {
        state
            .decode_state(r)
            .with_context(|| format!("{} state", name))?;
    }
    col.decode_column(r, rows).context(name)
}

impl DecodeResult for Results {
    fn decode_result(&mut self, r: &mut Reader, block: &Block) -> Result<()> {
        self.decode_strict(r, block)
    }
}

/// Automatic decoding handle returned by [`Results::auto`].
pub struct AutoResults<'a> {
    results: &'a mut Results,
}

impl DecodeResult for AutoResults<'_> {
    fn decode_result(&mut self, r: &mut Reader, block: &Block) -> Result<()> {
        self.results.decode_auto(r, block)
    }
}
