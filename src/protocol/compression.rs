//! Compression flag sent ahead of the query data stream.

use super::{Buffer, Reader};
use crate::error::{ProtoError, Result};

/// Compression status for the data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Disabled,
    Enabled,
}

impl Compression {
    /// Wire value.
    pub const fn as_u8(self) -> u8 {
        match self {
            Compression::Disabled => 0,
            Compression::Enabled => 1,
        }
    }

    /// Encode as a single varint octet.
    pub fn encode(self, buf: &mut Buffer) {
        buf.put_uvarint(u64::from(self.as_u8()));
    }

    /// Decode, rejecting anything other than 0 or 1.
    pub fn decode(r: &mut Reader) -> Result<Self> {
        match r.uvarint()? {
            0 => Ok(Compression::Disabled),
            1 => Ok(Compression::Enabled),
            v => Err(ProtoError::Protocol(format!("unknown compression {}", v))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_single_octet() {
        let mut buf = Buffer::new();
        Compression::Disabled.encode(&mut buf);
        Compression::Enabled.encode(&mut buf);
        assert_eq!(buf.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_decode() {
        let mut r = Reader::new(vec![1, 0, 2]);
        assert_eq!(Compression::decode(&mut r).unwrap(), Compression::Enabled);
        assert_eq!(Compression::decode(&mut r).unwrap(), Compression::Disabled);
        assert!(Compression::decode(&mut r).is_err());
    }
}
