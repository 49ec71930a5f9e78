//! `LowCardinality(String)` column: dictionary plus per-row keys.
//!
//! State prefix (once per column per block, only when the block has rows):
//! ```text
//! UInt64 key serialization version (must be 1)
//! ```
//! Row payload:
//! ```text
//! ┌──────────┬───────────┬────────────┬───────────┬──────────────┐
//! │ meta     │ dict size │ dict values│ key count │ keys         │
//! │ UInt64   │ UInt64    │ String * n │ UInt64    │ UInt8..64 * r│
//! └──────────┴───────────┴────────────┴───────────┴──────────────┘
//! ```
//! The low byte of `meta` selects the key width (0 = UInt8 .. 3 = UInt64).

use std::any::Any;
use std::collections::HashMap;

use super::{ColInput, ColResult, Column, ColumnType, StateDecoder, StateEncoder};
use crate::error::{ProtoError, Result, ResultExt};
use crate::protocol::{Buffer, Reader};

/// Shared dictionaries with additional keys.
const KEY_SERIALIZATION_VERSION: u64 = 1;

const KEY_TYPE_MASK: u64 = 0xFF;
const NEED_GLOBAL_DICTIONARY: u64 = 1 << 8;
const HAS_ADDITIONAL_KEYS: u64 = 1 << 9;
const NEED_UPDATE_DICTIONARY: u64 = 1 << 10;

/// Key width selector from `meta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    UInt8 = 0,
    UInt16 = 1,
    UInt32 = 2,
    UInt64 = 3,
}

impl KeyType {
    fn from_meta(meta: u64) -> Result<Self> {
        match meta & KEY_TYPE_MASK {
            0 => Ok(KeyType::UInt8),
            1 => Ok(KeyType::UInt16),
            2 => Ok(KeyType::UInt32),
            3 => Ok(KeyType::UInt64),
            v => Err(ProtoError::Protocol(format!("invalid key type {}", v))),
        }
    }

    /// Narrowest key type able to index `n` dictionary entries.
    fn for_dictionary(n: usize) -> Self {
        let n = n as u64;
        if n <= 1 << 8 {
            KeyType::UInt8
        } else if n <= 1 << 16 {
            KeyType::UInt16
        } else if n <= 1 << 32 {
            KeyType::UInt32
        } else {
            KeyType::UInt64
        }
    }

    fn read(self, r: &mut Reader) -> Result<u64> {
        Ok(match self {
            KeyType::UInt8 => u64::from(r.u8()?),
            KeyType::UInt16 => u64::from(r.u16()?),
            KeyType::UInt32 => u64::from(r.u32()?),
            KeyType::UInt64 => r.u64()?,
        })
    }

    fn put(self, buf: &mut Buffer, key: usize) {
        match self {
            KeyType::UInt8 => buf.put_u8(key as u8),
            KeyType::UInt16 => buf.put_u16(key as u16),
            KeyType::UInt32 => buf.put_u32(key as u32),
            KeyType::UInt64 => buf.put_u64(key as u64),
        }
    }
}

/// Dictionary-encoded string column, materialized to plain values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColLowCardinality {
    values: Vec<String>,
}

impl ColLowCardinality {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, v: impl Into<String>) {
        self.values.push(v.into());
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ColLowCardinality {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Column for ColLowCardinality {
    fn column_type(&self) -> ColumnType {
        ColumnType::new(ColumnType::LOW_CARDINALITY)
            .with_elem(&ColumnType::new(ColumnType::STRING))
    }

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

impl StateEncoder for ColLowCardinality {
    fn encode_state(&self, buf: &mut Buffer) {
        buf.put_u64(KEY_SERIALIZATION_VERSION);
    }
}

impl StateDecoder for ColLowCardinality {
    fn decode_state(&mut self, r: &mut Reader) -> Result<()> {
        let version = r.u64().context("version")?;
        if version != KEY_SERIALIZATION_VERSION {
            return Err(ProtoError::Protocol(format!(
                "unsupported key serialization version {}",
                version
            )));
        }
        Ok(())
    }
}

impl ColInput for ColLowCardinality {
    fn encode_column(&self, buf: &mut Buffer) {
        if self.values.is_empty() {
            return;
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut dict: Vec<&str> = Vec::new();
        let keys: Vec<usize> = self
            .values
            .iter()
            .map(|v| {
                *index.entry(v.as_str()).or_insert_with(|| {
                    dict.push(v.as_str());
                    dict.len() - 1
                })
            })
            .collect();

        let key_type = KeyType::for_dictionary(dict.len());
        buf.put_u64(key_type as u64 | HAS_ADDITIONAL_KEYS | NEED_UPDATE_DICTIONARY);
        buf.put_u64(dict.len() as u64);
        for v in &dict {
            buf.put_str(v);
        }
        buf.put_u64(keys.len() as u64);
        for key in keys {
            key_type.put(buf, key);
        }
    }

    fn as_state_encoder(&self) -> Option<&dyn StateEncoder> {
        Some(self)
    }
}

impl ColResult for ColLowCardinality {
    fn reset(&mut self) {
        self.values.clear();
    }

    fn decode_column(&mut self, r: &mut Reader, rows: usize) -> Result<()> {
        if rows == 0 {
            return Ok(());
        }

        let meta = r.u64().context("meta")?;
        if meta & NEED_GLOBAL_DICTIONARY != 0 {
            return Err(ProtoError::Protocol(
                "global dictionary is not supported".to_string(),
            ));
        }
        let key_type = KeyType::from_meta(meta)?;

        let dict_len = r.u64().context("dictionary size")?;
        // Every entry takes at least one byte.
        if dict_len > r.remaining() as u64 {
            return Err(ProtoError::Protocol(format!(
                "dictionary size {} exceeds payload",
                dict_len
            )));
        }
        let dict = (0..dict_len)
            .map(|i| r.str().with_context(|| format!("dictionary [{}]", i)))
            .collect::<Result<Vec<_>>>()?;

        let keys = r.u64().context("key count")?;
        if keys != rows as u64 {
            return Err(ProtoError::Protocol(format!(
                "{} keys, expected {} rows",
                keys, rows
            )));
        }

        self.values.reserve(rows.min(r.remaining()));
        for i in 0..rows {
            let key = key_type.read(r).with_context(|| format!("key [{}]", i))?;
            let v = usize::try_from(key)
                .ok()
                .and_then(|k| dict.get(k))
                .ok_or_else(|| {
                    ProtoError::Protocol(format!(
                        "key {} out of dictionary of {}",
                        key,
                        dict.len()
                    ))
                })?;
            self.values.push(v.clone());
        }
        Ok(())
    }

    fn as_state_decoder(&mut self) -> Option<&mut dyn StateDecoder> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(col: &ColLowCardinality) -> Buffer {
        let mut buf = Buffer::new();
        col.encode_state(&mut buf);
        col.encode_column(&mut buf);
        buf
    }

    #[test]
    fn test_type_name() {
        assert_eq!(
            ColLowCardinality::new().column_type().as_str(),
            "LowCardinality(String)"
        );
    }

    #[test]
    fn test_round_trip_deduplicates() {
        let input: ColLowCardinality = ["a", "b", "a", "a", "c"].into_iter().collect();
        let buf = encode(&input);

        let mut r = Reader::new(buf.freeze());
        let mut output = ColLowCardinality::new();
        output.decode_state(&mut r).unwrap();

        // meta + dictionary of three single-char strings
        let mut peek = r.clone();
        assert_eq!(peek.u64().unwrap() & KEY_TYPE_MASK, KeyType::UInt8 as u64);
        assert_eq!(peek.u64().unwrap(), 3);

        output.decode_column(&mut r, 5).unwrap();
        assert_eq!(output, input);
        assert!(r.is_empty());
    }

    #[test]
    fn test_wide_dictionary_uses_u16_keys() {
        let input: ColLowCardinality = (0..300).map(|i| i.to_string()).collect();
        let buf = encode(&input);

        let mut r = Reader::new(buf.freeze());
        let mut output = ColLowCardinality::new();
        output.decode_state(&mut r).unwrap();
        assert_eq!(r.clone().u64().unwrap() & KEY_TYPE_MASK, KeyType::UInt16 as u64);
        output.decode_column(&mut r, 300).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_empty_column_writes_nothing() {
        let mut buf = Buffer::new();
        ColLowCardinality::new().encode_column(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_bad_version() {
        let mut buf = Buffer::new();
        buf.put_u64(2);
        let err = ColLowCardinality::new()
            .decode_state(&mut Reader::new(buf.freeze()))
            .unwrap_err();
        assert!(matches!(err, ProtoError::Protocol(_)));
    }

    #[test]
    fn test_key_out_of_dictionary() {
        let mut buf = Buffer::new();
        buf.put_u64(HAS_ADDITIONAL_KEYS);
        buf.put_u64(1);
        buf.put_str("only");
        buf.put_u64(1);
        buf.put_u8(4);

        let err = ColLowCardinality::new()
            .decode_column(&mut Reader::new(buf.freeze()), 1)
            .unwrap_err();
        assert!(err.to_string().contains("out of dictionary"));
    }

    #[test]
    fn test_key_count_mismatch() {
        let mut buf = Buffer::new();
        buf.put_u64(0);
        buf.put_u64(0);
        buf.put_u64(2);

        let err = ColLowCardinality::new()
            .decode_column(&mut Reader::new(buf.freeze()), 1)
            .unwrap_err();
        assert!(err.to_string().contains("2 keys, expected 1 rows"));
    }

    #[test]
    fn test_huge_key_count_on_short_input() {
        let mut buf = Buffer::new();
        buf.put_u64(HAS_ADDITIONAL_KEYS);
        buf.put_u64(1);
        buf.put_str("a");
        buf.put_u64(usize::MAX as u64);
        buf.put_u8(0);

        let err = ColLowCardinality::new()
            .decode_column(&mut Reader::new(buf.freeze()), usize::MAX)
            .unwrap_err();
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().starts_with("key [1]"));
    }
}
