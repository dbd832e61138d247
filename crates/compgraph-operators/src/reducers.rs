//! Ready-made reducers. Each output row carries the group's key columns.

use std::collections::HashMap;

use compgraph_core::row::Row;
use compgraph_core::value::Value;

use crate::traits::{OpError, Reducer};

fn key_row(keys: &[String], group: &[Row]) -> Row {
    group.first().map(|r| r.project(keys)).unwrap_or_default()
}

/// Emits the first row of every group.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstReducer;

impl Reducer for FirstReducer {
    fn reduce(&self, _keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        Ok(group.first().cloned().into_iter().collect())
    }

    fn name(&self) -> &str {
        "first"
    }
}

/// Emits the `n` rows with the largest `column` values, largest first.
/// Rows with equal values keep their input order.
#[derive(Debug, Clone)]
pub struct TopN {
    pub column: String,
    pub n: usize,
}

impl TopN {
    pub fn new(column: impl Into<String>, n: usize) -> Self {
        Self {
            column: column.into(),
            n,
        }
    }
}

impl Reducer for TopN {
    fn reduce(&self, _keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        let mut ranked: Vec<(&Value, &Row)> = group
            .iter()
            .map(|r| r.get(&self.column).map(|v| (v, r)))
            .collect::<Result<_, _>>()?;
        ranked.sort_by(|a, b| b.0.total_cmp(a.0));
        Ok(ranked
            .into_iter()
            .take(self.n)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "top_n"
    }
}

/// Share of each distinct `words_column` value within the group, written to
/// `result_column`. Words appear in order of first occurrence.
#[derive(Debug, Clone)]
pub struct TermFrequency {
    pub words_column: String,
    pub result_column: String,
}

impl TermFrequency {
    pub fn new(words_column: impl Into<String>, result_column: impl Into<String>) -> Self {
        Self {
            words_column: words_column.into(),
            result_column: result_column.into(),
        }
    }
}

impl Reducer for TermFrequency {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for row in group {
            let word = row.get_str(&self.words_column)?;
            let count = counts.entry(word).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }

        let total = group.len() as f64;
        let base = key_row(keys, group);
        Ok(order
            .into_iter()
            .map(|word| {
                let freq = counts[word] as f64 / total;
                base.clone()
                    .with(self.words_column.clone(), word)
                    .with(self.result_column.clone(), freq)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "term_frequency"
    }
}

/// Number of rows in the group, written to `column`.
#[derive(Debug, Clone)]
pub struct Count {
    pub column: String,
}

impl Count {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Count {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        let row = key_row(keys, group).with(self.column.clone(), group.len() as i64);
        Ok(vec![row])
    }

    fn name(&self) -> &str {
        "count"
    }
}

/// Running numeric total that stays an integer until a float shows up or
/// the integer sum overflows.
#[derive(Debug, Clone, Copy)]
enum Total {
    Int(i64),
    Float(f64),
}

impl Total {
    fn add(self, row: &Row, column: &str) -> Result<Total, OpError> {
        let value = row.get(column)?;
        Ok(match (self, value) {
            (Total::Int(acc), Value::Int(i)) => match acc.checked_add(*i) {
                Some(sum) => Total::Int(sum),
                None => Total::Float(acc as f64 + *i as f64),
            },
            (acc, _) => Total::Float(acc.as_f64() + row.get_f64(column)?),
        })
    }

    fn as_f64(self) -> f64 {
        match self {
            Total::Int(i) => i as f64,
            Total::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Total::Int(i) => Value::Int(i),
            Total::Float(f) => Value::Float(f),
        }
    }
}

/// Sum of `column` over the group.
#[derive(Debug, Clone)]
pub struct Sum {
    pub column: String,
}

impl Sum {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Reducer for Sum {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        let mut total = Total::Int(0);
        for row in group {
            total = total.add(row, &self.column)?;
        }
        Ok(vec![key_row(keys, group).with(self.column.clone(), total.into_value())])
    }

    fn name(&self) -> &str {
        "sum"
    }
}

/// Sums of several columns over the group, in one row.
#[derive(Debug, Clone)]
pub struct MultiSum {
    pub columns: Vec<String>,
}

impl MultiSum {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Reducer for MultiSum {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        let mut totals = vec![Total::Int(0); self.columns.len()];
        for row in group {
            for (total, column) in totals.iter_mut().zip(&self.columns) {
                *total = total.add(row, column)?;
            }
        }
        let mut out = key_row(keys, group);
        for (total, column) in totals.into_iter().zip(&self.columns) {
            out.insert(column.clone(), total.into_value());
        }
        Ok(vec![out])
    }

    fn name(&self) -> &str {
        "multi_sum"
    }
}
