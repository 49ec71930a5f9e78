//! `String` column: every row is a length-prefixed byte string.

use std::any::Any;

use super::{ColInput, ColResult, Column, ColumnType};
use crate::error::{Result, ResultExt};
use crate::protocol::{Buffer, Reader};

/// Column of UTF-8 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColStr {
    values: Vec<String>,
}

impl ColStr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, v: impl Into<String>) {
        self.values.push(v.into());
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.values.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ColStr {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Column for ColStr {
    fn column_type(&self) -> ColumnType {
        ColumnType::new(ColumnType::STRING)
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

impl ColInput for ColStr {
    fn encode_column(&self, buf: &mut Buffer) {
        for v in &self.values {
            buf.put_str(v);
        }
    }
}

impl ColResult for ColStr {
    fn reset(&mut self) {
        self.values.clear();
    }

    fn decode_column(&mut self, r: &mut Reader, rows: usize) -> Result<()> {
        // Each row takes at least its length byte.
        self.values.reserve(rows.min(r.remaining()));
        for i in 0..rows {
            let v = r.str().with_context(|| format!("row {}", i))?;
            self.values.push(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let input: ColStr = ["", "foo", "ünïcode"].into_iter().collect();
        let mut buf = Buffer::new();
        input.encode_column(&mut buf);

        let mut output = ColStr::new();
        output
            .decode_column(&mut Reader::new(buf.freeze()), 3)
            .unwrap();
        assert_eq!(output, input);
        assert_eq!(output.get(1), Some("foo"));
    }

    #[test]
    fn test_truncated_row_reports_index() {
        let mut col = ColStr::new();
        let err = col
            .decode_column(&mut Reader::new(vec![1, b'a', 3, b'b']), 2)
            .unwrap_err();
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().starts_with("row 1"));
    }

    #[test]
    fn test_huge_row_count_on_short_input() {
        let mut col = ColStr::new();
        let err = col
            .decode_column(&mut Reader::new(vec![1, b'a']), usize::MAX)
            .unwrap_err();
        assert!(err.is_unexpected_eof());
        assert_eq!(col.len(), 1);
    }
}
