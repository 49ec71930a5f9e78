//! Wire-level column type descriptors.
//!
//! A [`ColumnType`] is the type string the server sends next to every column
//! name, e.g. `UInt8`, `DateTime('UTC')` or `LowCardinality(String)`.

use std::fmt;

/// Column type as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnType(String);

impl ColumnType {
    pub const UINT8: &'static str = "UInt8";
    pub const UINT16: &'static str = "UInt16";
    pub const UINT32: &'static str = "UInt32";
    pub const UINT64: &'static str = "UInt64";
    pub const INT8: &'static str = "Int8";
    pub const INT16: &'static str = "Int16";
    pub const INT32: &'static str = "Int32";
    pub const INT64: &'static str = "Int64";
    pub const FLOAT32: &'static str = "Float32";
    pub const FLOAT64: &'static str = "Float64";
    pub const STRING: &'static str = "String";
    pub const DATETIME: &'static str = "DateTime";
    pub const ENUM8: &'static str = "Enum8";
    pub const ENUM16: &'static str = "Enum16";
    pub const LOW_CARDINALITY: &'static str = "LowCardinality";
    pub const NULLABLE: &'static str = "Nullable";
    pub const ARRAY: &'static str = "Array";

    /// Create a column type from its wire string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Wire string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type name without parameters: `DateTime('UTC')` -> `DateTime`.
    pub fn base(&self) -> &str {
        match self.0.find('(') {
            Some(i) => self.0[..i].trim(),
            None => self.0.trim(),
        }
    }

    /// Parameter list without the outer parentheses, if any.
    pub fn params(&self) -> Option<&str> {
        let start = self.0.find('(')?;
        let end = self.0.rfind(')')?;
        (end > start).then(|| self.0[start + 1..end].trim())
    }

    /// Check if this type wraps a single element type.
    pub fn is_wrapper(&self) -> bool {
        matches!(
            self.base(),
            Self::LOW_CARDINALITY | Self::NULLABLE | Self::ARRAY
        )
    }

    /// Element type of a wrapper: `LowCardinality(String)` -> `String`.
    pub fn elem(&self) -> Option<ColumnType> {
        if !self.is_wrapper() {
            return None;
        }
        self.params().map(ColumnType::new)
    }

    /// Wrap `elem` in this type's base: `Array` + `UInt8` -> `Array(UInt8)`.
    pub fn with_elem(&self, elem: &ColumnType) -> ColumnType {
        ColumnType(format!("{}({})", self.base(), elem.as_str()))
    }

    /// Wire string without any whitespace.
    fn normalized(&self) -> String {
        self.0.chars().filter(|c| !c.is_ascii_whitespace()).collect()
    }

    /// Check if two types are NOT substitutable on the wire.
    ///
    /// Compatible pairs:
    /// - equal ignoring whitespace
    /// - `DateTime` with and without a time zone
    /// - `Enum8(..)` and `Int8`, `Enum16(..)` and `Int16`
    /// - two `Enum8` (or two `Enum16`) with different value lists
    /// - same wrapper whose element types are compatible
    pub fn conflicts(&self, other: &ColumnType) -> bool {
        if self.normalized() == other.normalized() {
            return false;
        }
        let (a, b) = (self.base(), other.base());
        if a == Self::DATETIME && b == Self::DATETIME {
            return false;
        }
        if same_repr(self, other) || same_repr(other, self) {
            return false;
        }
        if a != b {
            return true;
        }
        if a == Self::ENUM8 || a == Self::ENUM16 {
            return false;
        }
        match (self.elem(), other.elem()) {
            (Some(x), Some(y)) => x.conflicts(&y),
            _ => true,
        }
    }
}

/// Enums are transferred as their underlying integer.
fn same_repr(a: &ColumnType, b: &ColumnType) -> bool {
    matches!(
        (a.base(), b.as_str().trim()),
        (ColumnType::ENUM8, ColumnType::INT8) | (ColumnType::ENUM16, ColumnType::INT16)
    )
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnType {
    fn from(s: &str) -> Self {
        ColumnType::new(s)
    }
}

impl From<String> for ColumnType {
    fn from(s: String) -> Self {
        ColumnType(s)
    }
}

impl AsRef<str> for ColumnType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ColumnType {
        ColumnType::new(s)
    }

    #[test]
    fn test_base_and_params() {
        assert_eq!(t("UInt8").base(), "UInt8");
        assert_eq!(t("UInt8").params(), None);
        assert_eq!(t("DateTime('UTC')").base(), "DateTime");
        assert_eq!(t("DateTime('UTC')").params(), Some("'UTC'"));
        assert_eq!(
            t("LowCardinality(Nullable(String))").elem(),
            Some(t("Nullable(String)"))
        );
        assert_eq!(t("DateTime('UTC')").elem(), None);
    }

    #[test]
    fn test_with_elem() {
        assert_eq!(t("Array").with_elem(&t("UInt8")), t("Array(UInt8)"));
    }

    #[test]
    fn test_identical_do_not_conflict() {
        assert!(!t("UInt8").conflicts(&t("UInt8")));
        assert!(!t("Map(String, UInt8)").conflicts(&t("Map(String,UInt8)")));
    }

    #[test]
    fn test_different_primitives_conflict() {
        assert!(t("UInt8").conflicts(&t("UInt16")));
        assert!(t("String").conflicts(&t("UInt8")));
        assert!(t("Map(String,UInt8)").conflicts(&t("Map(String,UInt16)")));
    }

    #[test]
    fn test_datetime_timezone_is_compatible() {
        assert!(!t("DateTime").conflicts(&t("DateTime('Europe/Moscow')")));
        assert!(!t("DateTime('UTC')").conflicts(&t("DateTime")));
    }

    #[test]
    fn test_enum_int_compatible() {
        assert!(!t("Enum8('a' = 1, 'b' = 2)").conflicts(&t("Int8")));
        assert!(!t("Int16").conflicts(&t("Enum16('a' = 1)")));
        assert!(t("Enum8('a' = 1)").conflicts(&t("Int16")));
        assert!(!t("Enum8('a' = 1)").conflicts(&t("Enum8('b' = 2)")));
    }

    #[test]
    fn test_wrappers_recurse() {
        assert!(!t("LowCardinality(String)").conflicts(&t("LowCardinality( String )")));
        assert!(!t("Array(DateTime)").conflicts(&t("Array(DateTime('UTC'))")));
        assert!(t("Array(UInt8)").conflicts(&t("Array(String)")));
        assert!(t("Nullable(UInt8)").conflicts(&t("UInt8")));
    }
}
