//! Runtime values, one variant per `DataType`. A `Value` carries enough
//! information to be compared and encoded without the schema on hand, but
//! encoding to a record slot still needs the target `DataType` to know how
//! wide (and how padded) the field is.

use crate::errors::Error;
use crate::schema::DataType;
use anyhow::{bail, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn dtype_matches(&self, dtype: &DataType) -> bool {
        matches!(
            (self, dtype),
            (Value::Int(_), DataType::Int)
                | (Value::Float(_), DataType::Float)
                | (Value::Bool(_), DataType::Bool)
                | (Value::Str(_), DataType::String(_))
        )
    }

    /// Encodes into exactly `dtype.width()` bytes: ints/floats use host byte
    /// order, bools are a single 0/1 byte, strings are NUL-padded/truncated
    /// to the fixed width.
    pub fn encode(&self, dtype: &DataType) -> Result<Vec<u8>> {
        if !self.dtype_matches(dtype) {
            bail!(Error::CompareValueOfDifferentDatatype);
        }
        Ok(match (self, dtype) {
            (Value::Int(v), DataType::Int) => v.to_ne_bytes().to_vec(),
            (Value::Float(v), DataType::Float) => v.to_ne_bytes().to_vec(),
            (Value::Bool(v), DataType::Bool) => vec![if *v { 1 } else { 0 }],
            (Value::Str(s), DataType::String(len)) => {
                let mut buf = vec![0u8; *len];
                let bytes = s.as_bytes();
                let copy_len = bytes.len().min(*len);
                buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
                buf
            }
            _ => unreachable!(),
        })
    }

    pub fn decode(bytes: &[u8], dtype: &DataType) -> Self {
        match dtype {
            DataType::Int => Value::Int(i32::from_ne_bytes(bytes[..4].try_into().unwrap())),
            DataType::Float => Value::Float(f32::from_ne_bytes(bytes[..4].try_into().unwrap())),
            DataType::Bool => Value::Bool(bytes[0] != 0),
            DataType::String(_) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Value::Str(String::from_utf8_lossy(&bytes[..end]).to_string())
            }
        }
    }

    /// Ordered comparison; only meaningful between values of matching
    /// variants. Used by predicate evaluation for `<`, `<=`, `>`, `>=`.
    pub fn partial_cmp(&self, other: &Value) -> Result<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => {
                a.partial_cmp(b).ok_or_else(|| Error::Generic("NaN comparison".into()).into())
            }
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            _ => bail!(Error::CompareValueOfDifferentDatatype),
        }
    }
}
