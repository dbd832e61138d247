//! Sort keys and tuple comparison.

use std::cmp::Ordering;
use std::fmt;

use compgraph_core::row::Row;
use compgraph_core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl From<String> for SortKey {
    fn from(column: String) -> Self {
        SortKey::asc(column)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            SortOrder::Asc => write!(f, "{}", self.column),
            SortOrder::Desc => write!(f, "{} desc", self.column),
        }
    }
}

/// Values of the sort columns of `row`, failing on a missing column.
pub fn sort_key_of(row: &Row, keys: &[SortKey]) -> compgraph_core::Result<Vec<Value>> {
    keys.iter().map(|k| row.get(&k.column).cloned()).collect()
}

/// Lexicographic comparison of two key tuples under `keys`' directions.
pub fn compare_keys(a: &[Value], b: &[Value], keys: &[SortKey]) -> Ordering {
    for ((x, y), key) in a.iter().zip(b.iter()).zip(keys.iter()) {
        let ord = x.total_cmp(y);
        let ord = match key.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_key_reverses_only_its_column() {
        let keys = vec![SortKey::desc("count"), SortKey::asc("text")];
        let a = vec![Value::from(3), Value::from("b")];
        let b = vec![Value::from(3), Value::from("a")];
        let c = vec![Value::from(5), Value::from("z")];
        assert_eq!(compare_keys(&a, &b, &keys), Ordering::Greater);
        assert_eq!(compare_keys(&c, &a, &keys), Ordering::Less);
    }

    #[test]
    fn int_and_float_keys_compare_numerically() {
        let keys = vec![SortKey::asc("x")];
        assert_eq!(
            compare_keys(&[Value::from(2)], &[Value::from(1.5)], &keys),
            Ordering::Greater
        );
    }
}
