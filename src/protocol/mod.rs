//! Protocol module - primitive wire values, feature gating and blocks.
//!
//! This module implements the data transfer layer of the native protocol:
//! - Little Endian primitives, varints and length-prefixed strings
//! - Revision-based feature negotiation
//! - Block info record and block framing
//! - Compression flag

pub(crate) mod block;
mod block_info;
mod buffer;
mod compression;
mod feature;
mod reader;

pub use block::{Block, MAX_COLUMNS_IN_BLOCK, MAX_ROWS_IN_BLOCK};
pub use block_info::BlockInfo;
pub use buffer::Buffer;
pub use compression::Compression;
pub use feature::{features, supports, Feature, DEFAULT_REVISION};
pub use reader::Reader;
