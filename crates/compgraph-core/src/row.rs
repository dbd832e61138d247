//! Row model: a mapping from column name to [`Value`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// One record. Columns iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a column, failing with [`Error::MissingColumn`] when absent.
    pub fn get(&self, column: &str) -> Result<&Value> {
        self.fields
            .get(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))
    }

    /// Read a column that may legitimately be absent.
    pub fn get_opt(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn get_str(&self, column: &str) -> Result<&str> {
        let v = self.get(column)?;
        v.as_str().ok_or_else(|| Error::TypeMismatch {
            column: column.to_string(),
            expected: "string",
            found: v.kind(),
        })
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        let v = self.get(column)?;
        v.as_f64().ok_or_else(|| Error::TypeMismatch {
            column: column.to_string(),
            expected: "number",
            found: v.kind(),
        })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(column.into(), value.into())
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.fields.remove(column)
    }

    /// Values of `columns`, in the given order.
    pub fn key(&self, columns: &[String]) -> Result<Vec<Value>> {
        columns.iter().map(|c| self.get(c).cloned()).collect()
    }

    /// New row holding only `columns`; absent columns are skipped.
    pub fn project(&self, columns: &[String]) -> Row {
        let fields = columns
            .iter()
            .filter_map(|c| self.fields.get(c).map(|v| (c.clone(), v.clone())))
            .collect();
        Row { fields }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rough in-memory footprint, used for budget accounting.
    pub fn approx_bytes(&self) -> usize {
        const ENTRY_OVERHEAD: usize = 32;
        std::mem::size_of::<Row>()
            + self
                .fields
                .iter()
                .map(|(k, v)| ENTRY_OVERHEAD + k.len() + v.approx_bytes())
                .sum::<usize>()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Build a [`Row`] from `column => value` pairs.
///
/// ```
/// use compgraph_core::row;
/// let r = row! { "doc_id" => 1, "text" => "a b a" };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::row::Row::new() };
    ($($col:expr => $val:expr),+ $(,)?) => {{
        let mut r = $crate::row::Row::new();
        $( r.insert($col, $val); )+
        r
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_is_reported_by_name() {
        let r = Row::new().with("a", 1);
        match r.get("b") {
            Err(Error::MissingColumn(c)) => assert_eq!(c, "b"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn key_preserves_requested_order() {
        let r = Row::new().with("a", 1).with("b", "x");
        let key = r.key(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(key, vec![Value::from("x"), Value::from(1)]);
    }

    #[test]
    fn json_round_trip_keeps_columns() {
        let r: Row = serde_json::from_str(r#"{"k": 1, "v": "x", "w": [1, 2]}"#).unwrap();
        assert_eq!(r.get("k").unwrap(), &Value::Int(1));
        let back = serde_json::to_string(&r).unwrap();
        assert_eq!(back, r#"{"k":1,"v":"x","w":[1,2]}"#);
    }
}
