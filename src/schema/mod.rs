//! The fixed schema every table is built around. A table's column list and
//! their widths never change after `create_table`, which is what lets the
//! record manager compute byte offsets with plain arithmetic instead of a
//! variable-length tuple format.

use crate::errors::Error;
use anyhow::{bail, Result};

pub const MAX_ATTR_NAME: usize = 15;

/// A fixed-width column type. `String(len)` is NUL-padded to exactly `len`
/// bytes; there is no variable-length representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Bool,
    String(usize),
}

impl DataType {
    pub fn width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::Bool => 1,
            DataType::String(len) => *len,
        }
    }

    fn tag(&self) -> i32 {
        match self {
            DataType::Int => 0,
            DataType::Float => 1,
            DataType::Bool => 2,
            DataType::String(_) => 3,
        }
    }

    fn from_tag(tag: i32, len: i32) -> Result<Self> {
        match tag {
            0 => Ok(DataType::Int),
            1 => Ok(DataType::Float),
            2 => Ok(DataType::Bool),
            3 => Ok(DataType::String(len as usize)),
            other => bail!(Error::Generic(format!("unknown datatype tag {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub dtype: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Result<Self> {
        let name = name.into();
        if name.len() > MAX_ATTR_NAME {
            bail!(Error::InvalidParameter(format!(
                "attribute name '{name}' exceeds {MAX_ATTR_NAME} bytes"
            )));
        }
        Ok(Self { name, dtype })
    }
}

/// A table's fixed column list. `key_indices` is advisory only — unique
/// constraints are out of scope, so nothing enforces it at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
    pub key_indices: Vec<usize>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>, key_indices: Vec<usize>) -> Result<Self> {
        if attributes.is_empty() {
            bail!(Error::InvalidParameter("schema must have at least one attribute".into()));
        }
        for &i in &key_indices {
            if i >= attributes.len() {
                bail!(Error::InvalidParameter(format!("key index {i} out of range")));
            }
        }
        Ok(Self { attributes, key_indices })
    }

    pub fn attr_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Byte offset of attribute `i` within a record, i.e. the sum of the
    /// widths of every attribute before it.
    pub fn offset_of(&self, i: usize) -> usize {
        self.attributes[..i].iter().map(|a| a.dtype.width()).sum()
    }

    /// Total record width, tombstone byte excluded (the record manager adds
    /// that separately as slot byte 0).
    pub fn record_width(&self) -> usize {
        self.attributes.iter().map(|a| a.dtype.width()).sum()
    }

    /// Encodes the page-0 schema section: tuple count, first free page,
    /// attribute count, key count, then one fixed-width descriptor per
    /// attribute (name, type tag, type length). Key attribute *indices* are
    /// advisory only and are not persisted — only their count is, per
    /// SPEC_FULL.md §4.3.2.
    pub fn encode(&self, tuple_count: i32, first_free_page: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&tuple_count.to_ne_bytes());
        buf.extend_from_slice(&first_free_page.to_ne_bytes());
        buf.extend_from_slice(&(self.attributes.len() as i32).to_ne_bytes());
        buf.extend_from_slice(&(self.key_indices.len() as i32).to_ne_bytes());
        for attr in &self.attributes {
            let mut name_bytes = [0u8; MAX_ATTR_NAME];
            let bytes = attr.name.as_bytes();
            name_bytes[..bytes.len()].copy_from_slice(bytes);
            buf.extend_from_slice(&name_bytes);
            buf.extend_from_slice(&attr.dtype.tag().to_ne_bytes());
            buf.extend_from_slice(&(attr.dtype.width() as i32).to_ne_bytes());
        }
        buf
    }

    /// Inverse of `encode`. Returns the schema plus the persisted counters.
    /// Key indices are never reconstructed (not persisted, advisory only);
    /// a re-opened table's `key_indices` is always empty.
    pub fn decode(bytes: &[u8]) -> Result<(Self, i32, i32)> {
        let read_i32 = |off: usize| -> i32 {
            i32::from_ne_bytes(bytes[off..off + 4].try_into().unwrap())
        };

        let tuple_count = read_i32(0);
        let first_free_page = read_i32(4);
        let num_attr = read_i32(8) as usize;
        // num_keys (offset 12) is persisted for format-compatibility but
        // unused on decode — see doc comment above.

        let mut offset = 16;
        let mut attributes = Vec::with_capacity(num_attr);
        for _ in 0..num_attr {
            let name_bytes = &bytes[offset..offset + MAX_ATTR_NAME];
            let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(MAX_ATTR_NAME);
            let name = String::from_utf8_lossy(&name_bytes[..end]).to_string();
            offset += MAX_ATTR_NAME;

            let tag = read_i32(offset);
            offset += 4;
            let len = read_i32(offset);
            offset += 4;

            attributes.push(Attribute { name, dtype: DataType::from_tag(tag, len)? });
        }

        Ok((Self { attributes, key_indices: Vec::new() }, tuple_count, first_free_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("id", DataType::Int).unwrap(),
                Attribute::new("name", DataType::String(10)).unwrap(),
                Attribute::new("active", DataType::Bool).unwrap(),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn record_width_sums_attribute_widths() {
        let schema = sample_schema();
        assert_eq!(schema.record_width(), 4 + 10 + 1);
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let schema = sample_schema();
        assert_eq!(schema.offset_of(0), 0);
        assert_eq!(schema.offset_of(1), 4);
        assert_eq!(schema.offset_of(2), 14);
    }

    #[test]
    fn encode_decode_round_trips_attributes_and_counters() {
        let schema = sample_schema();
        let bytes = schema.encode(42, 3);
        let (decoded, tuple_count, first_free_page) = Schema::decode(&bytes).unwrap();
        assert_eq!(decoded.attributes, schema.attributes);
        assert_eq!(tuple_count, 42);
        assert_eq!(first_free_page, 3);
    }

    #[test]
    fn key_indices_are_advisory_and_not_persisted() {
        let schema = sample_schema();
        assert_eq!(schema.key_indices, vec![0]);
        let bytes = schema.encode(0, 1);
        let (decoded, _, _) = Schema::decode(&bytes).unwrap();
        assert!(decoded.key_indices.is_empty());
    }

    #[test]
    fn rejects_name_too_long() {
        let err = Attribute::new("way_too_long_for_a_column", DataType::Int);
        assert!(err.is_err());
    }
}
