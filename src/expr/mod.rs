//! The predicate contract a scan filters against. Out of this crate's
//! scope is a SQL front end to produce these — callers build `Expr` trees
//! by hand, the way an embedding application would.

use crate::errors::Error;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;
use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Attr(String),
    Literal(Value),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn eval(&self, record: &Record, schema: &Schema) -> Result<Value> {
        match self {
            Expr::Attr(name) => {
                let index = schema
                    .attr_index(name)
                    .ok_or_else(|| Error::InvalidParameter(format!("no such attribute '{name}'")))?;
                Ok(record.get(index, schema))
            }
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Compare(lhs, op, rhs) => {
                let lhs = lhs.eval(record, schema)?;
                let rhs = rhs.eval(record, schema)?;
                let ordering = lhs.partial_cmp(&rhs)?;
                use std::cmp::Ordering::*;
                let result = match op {
                    CompareOp::Eq => ordering == Equal,
                    CompareOp::NotEq => ordering != Equal,
                    CompareOp::Lt => ordering == Less,
                    CompareOp::LtEq => ordering != Greater,
                    CompareOp::Gt => ordering == Greater,
                    CompareOp::GtEq => ordering != Less,
                };
                Ok(Value::Bool(result))
            }
            Expr::And(lhs, rhs) => {
                Ok(Value::Bool(as_bool(lhs.eval(record, schema)?)? && as_bool(rhs.eval(record, schema)?)?))
            }
            Expr::Or(lhs, rhs) => {
                Ok(Value::Bool(as_bool(lhs.eval(record, schema)?)? || as_bool(rhs.eval(record, schema)?)?))
            }
            Expr::Not(inner) => Ok(Value::Bool(!as_bool(inner.eval(record, schema)?)?)),
        }
    }
}

fn as_bool(v: Value) -> Result<bool> {
    match v {
        Value::Bool(b) => Ok(b),
        _ => bail!(Error::CompareValueOfDifferentDatatype),
    }
}

/// Injected into `Table::start_scan`; a record is kept when `matches`
/// returns `Ok(true)`.
pub trait Predicate {
    fn matches(&self, record: &Record, schema: &Schema) -> Result<bool>;
}

impl Predicate for Expr {
    fn matches(&self, record: &Record, schema: &Schema) -> Result<bool> {
        as_bool(self.eval(record, schema)?)
    }
}

/// The always-true predicate, for an unfiltered scan.
pub struct AllRows;

impl Predicate for AllRows {
    fn matches(&self, _record: &Record, _schema: &Schema) -> Result<bool> {
        Ok(true)
    }
}
