//! Block info: optional tagged record ahead of block header.
//!
//! ```text
//! ┌───────┬───────────┬───────┬────────────┬───────┐
//! │ tag 1 │ overflows │ tag 2 │ bucket num │ tag 0 │
//! │ varint│ bool      │ varint│ int32 LE   │ varint│
//! └───────┴───────────┴───────┴────────────┴───────┘
//! ```
//!
//! Decoding accepts fields in any order and fails on unknown tags.

use std::fmt;

use super::{Buffer, Reader};
use crate::error::{ProtoError, Result, ResultExt};

/// Tag terminating the field list.
const END_FIELD: u64 = 0;

/// Field tags.
const FIELD_OVERFLOWS: u64 = 1;
const FIELD_BUCKET_NUM: u64 = 2;

/// GROUP BY overflow bookkeeping attached to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block holds rows that overflowed `max_rows_to_group_by`.
    pub overflows: bool,
    /// Two-level aggregation bucket, -1 when not bucketed.
    pub bucket_num: i32,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            overflows: false,
            bucket_num: -1,
        }
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overflows: {}, buckets: {}", self.overflows, self.bucket_num)
    }
}

impl BlockInfo {
    /// Encode all fields followed by the end tag.
    pub fn encode(&self, buf: &mut Buffer) {
        buf.put_uvarint(FIELD_OVERFLOWS);
        buf.put_bool(self.overflows);

        buf.put_uvarint(FIELD_BUCKET_NUM);
        buf.put_i32(self.bucket_num);

        buf.put_uvarint(END_FIELD);
    }

    /// Decode fields until the end tag.
    pub fn decode(&mut self, r: &mut Reader) -> Result<()> {
        loop {
            match r.uvarint().context("field id")? {
                FIELD_OVERFLOWS => self.overflows = r.bool().context("overflows")?,
                FIELD_BUCKET_NUM => self.bucket_num = r.i32().context("bucket number")?,
                END_FIELD => return Ok(()),
                other => return Err(ProtoError::UnknownField(other)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let info = BlockInfo {
            overflows: true,
            bucket_num: 5,
        };
        let mut buf = Buffer::new();
        info.encode(&mut buf);
        assert_eq!(buf.as_slice(), &[1, 1, 2, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_round_trip() {
        for info in [
            BlockInfo::default(),
            BlockInfo {
                overflows: true,
                bucket_num: i32::MAX,
            },
            BlockInfo {
                overflows: false,
                bucket_num: i32::MIN,
            },
        ] {
            let mut buf = Buffer::new();
            info.encode(&mut buf);

            let mut decoded = BlockInfo::default();
            let mut r = Reader::new(buf.freeze());
            decoded.decode(&mut r).unwrap();
            assert_eq!(decoded, info);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_only_end_tag_keeps_defaults() {
        let mut info = BlockInfo::default();
        info.decode(&mut Reader::new(vec![0])).unwrap();
        assert_eq!(info, BlockInfo::default());
    }

    #[test]
    fn test_fields_out_of_order() {
        let mut info = BlockInfo::default();
        info.decode(&mut Reader::new(vec![2, 3, 0, 0, 0, 1, 1, 0]))
            .unwrap();
        assert_eq!(info.bucket_num, 3);
        assert!(info.overflows);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut info = BlockInfo::default();
        let err = info.decode(&mut Reader::new(vec![3, 0])).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownField(3)));
    }

    #[test]
    fn test_truncated_field() {
        let mut info = BlockInfo::default();
        let err = info.decode(&mut Reader::new(vec![2, 1, 0])).unwrap_err();
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().starts_with("bucket number"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BlockInfo::default().to_string(),
            "overflows: false, buckets: -1"
        );
    }
}
