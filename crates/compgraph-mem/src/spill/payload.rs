//! Row payload encoding for spill segments.
//!
//! Rows are written as JSON, but every value carries an explicit tag and
//! floats are stored as their IEEE-754 bit pattern, so NaN, infinities and
//! the sign of zero survive a round trip. Plain `Value` JSON would write
//! non-finite floats as `null`.

use serde::{Deserialize, Serialize};

use compgraph_core::row::Row;
use compgraph_core::value::Value;

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize)]
enum Cell {
    N,
    B(bool),
    I(i64),
    F(u64),
    S(String),
    L(Vec<Cell>),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::N,
            Value::Bool(b) => Cell::B(*b),
            Value::Int(i) => Cell::I(*i),
            Value::Float(f) => Cell::F(f.to_bits()),
            Value::Str(s) => Cell::S(s.clone()),
            Value::List(items) => Cell::L(items.iter().map(Cell::from).collect()),
        }
    }
}

impl From<Cell> for Value {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::N => Value::Null,
            Cell::B(b) => Value::Bool(b),
            Cell::I(i) => Value::Int(i),
            Cell::F(bits) => Value::Float(f64::from_bits(bits)),
            Cell::S(s) => Value::Str(s),
            Cell::L(items) => Value::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

pub(crate) fn encode(rows: &[Row]) -> Result<Vec<u8>> {
    let encoded: Vec<Vec<(&str, Cell)>> = rows
        .iter()
        .map(|row| row.iter().map(|(col, v)| (col, Cell::from(v))).collect())
        .collect();
    serde_json::to_vec(&encoded).map_err(|e| Error::Codec(format!("json serialize: {e}")))
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<Row>> {
    let decoded: Vec<Vec<(String, Cell)>> =
        serde_json::from_slice(bytes).map_err(|e| Error::Codec(format!("json deserialize: {e}")))?;
    Ok(decoded
        .into_iter()
        .map(|cells| cells.into_iter().map(|(col, c)| (col, Value::from(c))).collect())
        .collect())
}
