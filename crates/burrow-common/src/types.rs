//! Attribute types and record identifiers.

use crate::page::PageNo;
use serde::{Deserialize, Serialize};

/// Width in bytes of a fixed string key. Shorter strings are NUL-padded.
pub const STRING_SIZE: usize = 10;

/// Type of the attribute an index is built over.
///
/// The discriminants are a file-format commitment: the meta page stores
/// the attribute type as a 32-bit integer with these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AttrType {
    Integer = 0,
    Double = 1,
    String = 2,
}

impl AttrType {
    /// Returns the on-disk discriminant.
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Decodes an on-disk discriminant.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(AttrType::Integer),
            1 => Some(AttrType::Double),
            2 => Some(AttrType::String),
            _ => None,
        }
    }

    /// Width in bytes of one key of this type.
    pub fn key_width(&self) -> usize {
        match self {
            AttrType::Integer => 4,
            AttrType::Double => 8,
            AttrType::String => STRING_SIZE,
        }
    }
}

impl std::fmt::Display for AttrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttrType::Integer => "INTEGER",
            AttrType::Double => "DOUBLE",
            AttrType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// Identifier of a record in the base relation.
///
/// The tree stores RecordIds as opaque values; only `page_no` participates
/// in ordering, as the tie-breaker between equal keys.
///
/// On disk a RecordId occupies [`RecordId::WIDTH`] bytes: page number,
/// slot number, and two bytes of padding (C struct layout compatibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Page of the base relation holding the record.
    pub page_no: PageNo,
    /// Slot within that page.
    pub slot_no: u16,
}

impl RecordId {
    /// On-disk width of a RecordId in bytes.
    pub const WIDTH: usize = 8;

    /// Creates a new record ID.
    pub fn new(page_no: PageNo, slot_no: u16) -> Self {
        Self { page_no, slot_no }
    }

    /// Serializes into the first [`RecordId::WIDTH`] bytes of `buf`.
    pub fn write(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.page_no.to_ne_bytes());
        buf[4..6].copy_from_slice(&self.slot_no.to_ne_bytes());
        buf[6..8].fill(0);
    }

    /// Deserializes from the first [`RecordId::WIDTH`] bytes of `buf`.
    pub fn read(buf: &[u8]) -> Self {
        Self {
            page_no: PageNo::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]),
            slot_no: u16::from_ne_bytes([buf[4], buf[5]]),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_no, self.slot_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_type_discriminants() {
        assert_eq!(AttrType::Integer.as_i32(), 0);
        assert_eq!(AttrType::Double.as_i32(), 1);
        assert_eq!(AttrType::String.as_i32(), 2);
    }

    #[test]
    fn test_attr_type_from_i32() {
        assert_eq!(AttrType::from_i32(0), Some(AttrType::Integer));
        assert_eq!(AttrType::from_i32(1), Some(AttrType::Double));
        assert_eq!(AttrType::from_i32(2), Some(AttrType::String));
        assert_eq!(AttrType::from_i32(3), None);
        assert_eq!(AttrType::from_i32(-1), None);
    }

    #[test]
    fn test_attr_type_key_width() {
        assert_eq!(AttrType::Integer.key_width(), 4);
        assert_eq!(AttrType::Double.key_width(), 8);
        assert_eq!(AttrType::String.key_width(), STRING_SIZE);
    }

    #[test]
    fn test_attr_type_display() {
        assert_eq!(AttrType::Integer.to_string(), "INTEGER");
        assert_eq!(AttrType::Double.to_string(), "DOUBLE");
        assert_eq!(AttrType::String.to_string(), "STRING");
    }

    #[test]
    fn test_attr_type_serde_roundtrip() {
        for attr_type in [AttrType::Integer, AttrType::Double, AttrType::String] {
            let serialized = serde_json::to_string(&attr_type).unwrap();
            let deserialized: AttrType = serde_json::from_str(&serialized).unwrap();
            assert_eq!(attr_type, deserialized);
        }
    }

    #[test]
    fn test_record_id_new() {
        let rid = RecordId::new(100, 7);
        assert_eq!(rid.page_no, 100);
        assert_eq!(rid.slot_no, 7);
    }

    #[test]
    fn test_record_id_codec_roundtrip() {
        let rid = RecordId::new(123_456, 42);
        let mut buf = [0xFFu8; RecordId::WIDTH];
        rid.write(&mut buf);
        assert_eq!(RecordId::read(&buf), rid);
        // Padding bytes are zeroed
        assert_eq!(buf[6], 0);
        assert_eq!(buf[7], 0);
    }

    #[test]
    fn test_record_id_width() {
        assert_eq!(RecordId::WIDTH, 8);
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::new(5, 9).to_string(), "5:9");
    }

    #[test]
    fn test_record_id_serde_roundtrip() {
        let original = RecordId::new(77, 3);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: RecordId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
