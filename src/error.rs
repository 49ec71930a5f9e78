//! Error types for ch-proto.

use thiserror::Error;

use crate::column::ColumnType;

/// Main error type for all block and column codec operations.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Input ended before a primitive value was fully read.
    #[error("unexpected EOF reading {what}: need {needed} bytes, {available} available")]
    UnexpectedEof {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// Boolean octet other than 0 or 1.
    #[error("unexpected value {0} for boolean")]
    InvalidBool(u8),

    /// Length-prefixed string is not valid UTF-8.
    #[error("invalid UTF-8 string")]
    InvalidString,

    /// Column or row count outside the allowed range.
    #[error("invalid {what} number {value}: must be in [0, {max}]")]
    Bounds {
        what: &'static str,
        value: u64,
        max: u64,
    },

    /// Wire schema does not match the expected one.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Unknown tag in a tagged optional-field record.
    #[error("unknown field {0}")]
    UnknownField(u64),

    /// No automatic column implementation for the wire type.
    #[error("type inference: unsupported column type {0}")]
    Inference(ColumnType),

    /// Malformed payload (bad varint, bad column state, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Error with added location context.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProtoError>,
    },
}

impl ProtoError {
    /// Wrap this error with a context message.
    pub fn context(self, context: impl Into<String>) -> Self {
        ProtoError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping all context wrappers.
    pub fn root(&self) -> &ProtoError {
        match self {
            ProtoError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the root cause is a short read.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self.root(), ProtoError::UnexpectedEof { .. })
    }

    /// Check if the root cause is a schema mismatch.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self.root(), ProtoError::SchemaMismatch(_))
    }

    /// Check if the root cause is a failed type inference.
    pub fn is_inference(&self) -> bool {
        matches!(self.root(), ProtoError::Inference(_))
    }

    /// Check if the root cause is a bounds violation.
    pub fn is_bounds(&self) -> bool {
        matches!(self.root(), ProtoError::Bounds { .. })
    }
}

/// Result type alias using ProtoError.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Attach context to the error of a `Result`.
pub(crate) trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    #[inline]
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    #[inline]
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain_display() {
        let err = ProtoError::UnknownField(7).context("info");
        assert_eq!(err.to_string(), "info: unknown field 7");
    }

    #[test]
    fn test_root_skips_wrappers() {
        let err = ProtoError::SchemaMismatch("x".into())
            .context("column [0]")
            .context("block");
        assert!(err.is_schema_mismatch());
        assert!(!err.is_bounds());
        assert!(matches!(err.root(), ProtoError::SchemaMismatch(_)));
    }

    #[test]
    fn test_result_ext() {
        let res: Result<()> = Err(ProtoError::InvalidBool(3));
        let err = res.with_context(|| format!("column [{}]", 2)).unwrap_err();
        assert_eq!(err.to_string(), "column [2]: unexpected value 3 for boolean");
    }
}
