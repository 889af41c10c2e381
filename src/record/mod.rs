//! A single record's view into a slot: the tombstone byte plus one fixed
//! field per schema attribute. Records never move fields around — every
//! attribute lives at the offset `Schema::offset_of` computes.

use crate::errors::Error;
use crate::pages::PageId;
use crate::schema::Schema;
use crate::value::Value;
use anyhow::{bail, Result};

/// `(page, slot)`. `page` is always >= 1 — page 0 is metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page: PageId,
    pub slot: i64,
}

impl Rid {
    pub fn new(page: PageId, slot: i64) -> Self {
        Self { page, slot }
    }
}

/// The bytes of one slot, tombstone byte excluded. `get`/`set` operate in
/// terms of attribute index, not raw offsets, so callers never have to
/// redo the schema's offset arithmetic themselves.
#[derive(Debug, Clone)]
pub struct Record {
    data: Vec<u8>,
}

impl Record {
    pub fn from_values(values: &[Value], schema: &Schema) -> Result<Self> {
        if values.len() != schema.attributes.len() {
            bail!(Error::InvalidParameter(format!(
                "expected {} values, got {}",
                schema.attributes.len(),
                values.len()
            )));
        }
        let mut data = Vec::with_capacity(schema.record_width());
        for (value, attr) in values.iter().zip(&schema.attributes) {
            data.extend_from_slice(&value.encode(&attr.dtype)?);
        }
        Ok(Self { data })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self { data: bytes.to_vec() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decodes attribute `index`. An out-of-range index is an argument
    /// error (SPEC_FULL.md §7 groups it with `NoMoreTuples`, the contract
    /// the original record manager uses for this case).
    pub fn get_checked(&self, index: usize, schema: &Schema) -> Result<Value> {
        if index >= schema.attributes.len() {
            bail!(Error::NoMoreTuples);
        }
        Ok(self.get(index, schema))
    }

    pub fn get(&self, index: usize, schema: &Schema) -> Value {
        let offset = schema.offset_of(index);
        let width = schema.attributes[index].dtype.width();
        Value::decode(&self.data[offset..offset + width], &schema.attributes[index].dtype)
    }

    pub fn set(&mut self, index: usize, value: &Value, schema: &Schema) -> Result<()> {
        if index >= schema.attributes.len() {
            bail!(Error::NoMoreTuples);
        }
        let offset = schema.offset_of(index);
        let attr = &schema.attributes[index];
        let encoded = value.encode(&attr.dtype)?;
        self.data[offset..offset + attr.dtype.width()].copy_from_slice(&encoded);
        Ok(())
    }

    pub fn values(&self, schema: &Schema) -> Vec<Value> {
        (0..schema.attributes.len()).map(|i| self.get(i, schema)).collect()
    }
}
