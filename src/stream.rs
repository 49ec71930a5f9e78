//! Per-connection block stream configuration and entry points.
//!
//! A [`BlockStream`] binds the negotiated protocol revision to block
//! encoding and decoding. Use one per connection; it holds no cursor
//! state, readers and buffers are passed in by the caller.
//!
//! # Example
//!
//! ```
//! use ch_proto::column::{ColUInt8, InputColumn};
//! use ch_proto::protocol::{Buffer, Reader};
//! use ch_proto::results::Results;
//! use ch_proto::{BlockStream, CodecConfig};
//!
//! let stream = BlockStream::new(CodecConfig::new().revision(54451));
//!
//! let col = ColUInt8::from(vec![1, 2, 3]);
//! let mut buf = Buffer::new();
//! stream.write_block(&mut buf, &[InputColumn::new("x", &col)]).unwrap();
//! stream.write_end(&mut buf);
//!
//! let mut r = Reader::new(buf.freeze());
//! let mut results = Results::new();
//! while let Some(block) = stream.read_result(&mut r, &mut results.auto()).unwrap() {
//!     assert_eq!(block.rows, 3);
//! }
//! assert_eq!(results.rows(), 3);
//! ```

use serde::Deserialize;
use tracing::{debug, trace};

use crate::column::{InputColumn, ResultColumn};
use crate::error::Result;
use crate::protocol::{Block, Buffer, Compression, Reader, DEFAULT_REVISION};
use crate::results::DecodeResult;

/// Codec settings negotiated for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Protocol revision agreed in the handshake.
    pub revision: u32,
    /// Compression of the data stream.
    pub compression: Compression,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            revision: DEFAULT_REVISION,
            compression: Compression::Disabled,
        }
    }
}

impl CodecConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the protocol revision.
    ///
    /// Default: `DEFAULT_REVISION`
    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    /// Set the compression flag.
    ///
    /// Default: disabled
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Parse from JSON, missing fields take defaults.
    ///
    /// ```
    /// use ch_proto::CodecConfig;
    /// use ch_proto::protocol::Compression;
    ///
    /// let config = CodecConfig::from_json(r#"{"compression": "enabled"}"#).unwrap();
    /// assert_eq!(config.compression, Compression::Enabled);
    /// ```
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Block codec bound to one connection's config.
#[derive(Debug, Clone, Default)]
pub struct BlockStream {
    config: CodecConfig,
}

impl BlockStream {
    pub fn new(config: CodecConfig) -> Self {
        debug!(
            revision = config.revision,
            compression = ?config.compression,
            "block stream configured"
        );
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    #[inline]
    pub fn revision(&self) -> u32 {
        self.config.revision
    }

    /// Write the compression flag.
    pub fn write_compression(&self, buf: &mut Buffer) {
        self.config.compression.encode(buf);
    }

    /// Write a data block built from `input`.
    ///
    /// Returns the header that was written.
    pub fn write_block(&self, buf: &mut Buffer, input: &[InputColumn<'_>]) -> Result<Block> {
        let block = Block::for_input(input);
        block.encode_block(buf, self.config.revision, input)?;
        trace!(columns = block.columns, rows = block.rows, "wrote block");
        Ok(block)
    }

    /// Write the end-of-stream marker.
    pub fn write_end(&self, buf: &mut Buffer) {
        Block::default().encode_aware(buf, self.config.revision);
    }

    /// Read one block into `target`.
    ///
    /// Returns `None` at the end-of-stream marker.
    pub fn read_block(&self, r: &mut Reader, target: &mut [ResultColumn]) -> Result<Option<Block>> {
        let mut block = Block::default();
        block.decode_block(r, self.config.revision, target)?;
        Ok((!block.end()).then_some(block))
    }

    /// Read one block through a result set.
    ///
    /// Returns `None` at the end-of-stream marker.
    pub fn read_result(
        &self,
        r: &mut Reader,
        result: &mut dyn DecodeResult,
    ) -> Result<Option<Block>> {
        let mut block = Block::default();
        block.decode_result(r, self.config.revision, result)?;
        Ok((!block.end()).then_some(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColStr, ColUInt8};
    use crate::results::Results;

    #[test]
    fn test_config_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.revision, DEFAULT_REVISION);
        assert_eq!(config.compression, Compression::Disabled);
        assert_eq!(CodecConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_config_from_json() {
        let config = CodecConfig::from_json(r#"{"revision": 54060, "compression": "enabled"}"#)
            .unwrap();
        assert_eq!(config, CodecConfig::new().revision(54060).compression(Compression::Enabled));
    }

    #[test]
    fn test_config_invalid_json() {
        let err = CodecConfig::from_json(r#"{"revision": "new"}"#).unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn test_write_compression() {
        let stream = BlockStream::new(CodecConfig::new().compression(Compression::Enabled));
        let mut buf = Buffer::new();
        stream.write_compression(&mut buf);
        assert_eq!(buf.as_slice(), &[1]);
    }

    #[test]
    fn test_read_block_stops_at_end() {
        let stream = BlockStream::default();
        let names: ColStr = ["a"].into_iter().collect();
        let mut buf = Buffer::new();
        stream
            .write_block(&mut buf, &[InputColumn::new("s", &names)])
            .unwrap();
        stream.write_end(&mut buf);

        let mut target = vec![ResultColumn::new("s", ColStr::new())];
        let mut r = Reader::new(buf.freeze());
        let block = stream.read_block(&mut r, &mut target).unwrap().unwrap();
        assert_eq!(block.rows, 1);
        assert!(stream.read_block(&mut r, &mut target).unwrap().is_none());
        assert!(r.is_empty());
    }

    #[test]
    fn test_old_revision_has_no_block_info() {
        let stream = BlockStream::new(CodecConfig::new().revision(1));
        let mut buf = Buffer::new();
        stream.write_end(&mut buf);
        assert_eq!(buf.as_slice(), &[0, 0]);

        let col = ColUInt8::from(vec![5]);
        let mut buf = Buffer::new();
        stream
            .write_block(&mut buf, &[InputColumn::new("x", &col)])
            .unwrap();

        let mut results = Results::new();
        let mut r = Reader::new(buf.freeze());
        stream.read_result(&mut r, &mut results.auto()).unwrap();
        assert_eq!(results.rows(), 1);
        assert!(r.is_empty());
    }
}
