//! # ch-proto
//!
//! Block and column codec for the ClickHouse native protocol.
//!
//! This crate encodes query data and decodes result data exchanged with a
//! ClickHouse server over a persistent connection.
//!
//! ## Architecture
//!
//! - **Protocol**: primitive wire values, revision feature gate, block framing
//! - **Columns**: capability traits and concrete column types
//! - **Results**: strict (schema-checked) and automatic (type-inferring) decoding
//!
//! The codec is synchronous: every call runs to completion against an
//! in-memory [`protocol::Reader`] or [`protocol::Buffer`]. Transport,
//! handshake and deadlines belong to the caller.
//!
//! ## Example
//!
//! ```
//! use ch_proto::column::{ColStr, ColUInt8, InputColumn, ResultColumn};
//! use ch_proto::protocol::{Buffer, Reader};
//! use ch_proto::BlockStream;
//!
//! let stream = BlockStream::default();
//!
//! let ids = ColUInt8::from(vec![1, 2]);
//! let names: ColStr = ["a", "b"].into_iter().collect();
//! let mut buf = Buffer::new();
//! stream
//!     .write_block(
//!         &mut buf,
//!         &[InputColumn::new("id", &ids), InputColumn::new("name", &names)],
//!     )
//!     .unwrap();
//!
//! let mut target = vec![
//!     ResultColumn::new("id", ColUInt8::new()),
//!     ResultColumn::new("name", ColStr::new()),
//! ];
//! stream
//!     .read_block(&mut Reader::new(buf.freeze()), &mut target)
//!     .unwrap();
//! assert_eq!(target[1].downcast_ref::<ColStr>().unwrap(), &names);
//! ```

pub mod column;
pub mod error;
pub mod protocol;
pub mod results;

mod stream;

pub use error::{ProtoError, Result};
pub use stream::{BlockStream, CodecConfig};
