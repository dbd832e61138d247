//! Ready-made mappers for text and numeric pipelines.

use std::sync::Arc;

use compgraph_core::row::Row;
use compgraph_core::value::Value;

use crate::traits::{Mapper, OpError};

/// Yields every row unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Mapper for Identity {
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError> {
        Ok(vec![row])
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Keeps only alphabetic characters and spaces in a string column.
#[derive(Debug, Clone)]
pub struct FilterPunctuation {
    pub column: String,
}

impl FilterPunctuation {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for FilterPunctuation {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, OpError> {
        let cleaned: String = row
            .get_str(&self.column)?
            .chars()
            .filter(|c| c.is_alphabetic() || *c == ' ')
            .collect();
        row.insert(self.column.clone(), cleaned);
        Ok(vec![row])
    }

    fn name(&self) -> &str {
        "filter_punctuation"
    }
}

/// Lowercases a string column.
#[derive(Debug, Clone)]
pub struct LowerCase {
    pub column: String,
}

impl LowerCase {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Mapper for LowerCase {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, OpError> {
        let lowered = row.get_str(&self.column)?.to_lowercase();
        row.insert(self.column.clone(), lowered);
        Ok(vec![row])
    }

    fn name(&self) -> &str {
        "lower_case"
    }
}

/// Splits a string column into one row per token.
///
/// Without a separator the column is split on runs of whitespace and empty
/// tokens are dropped.
#[derive(Debug, Clone)]
pub struct Split {
    pub column: String,
    pub separator: Option<String>,
}

impl Split {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            separator: None,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

impl Mapper for Split {
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError> {
        let text = row.get_str(&self.column)?;
        let tokens: Vec<String> = match self.separator.as_deref() {
            None => text.split_whitespace().map(str::to_string).collect(),
            Some(sep) => text.split(sep).map(str::to_string).collect(),
        };
        Ok(tokens
            .into_iter()
            .map(|token| row.clone().with(self.column.clone(), token))
            .collect())
    }

    fn name(&self) -> &str {
        "split"
    }
}

/// Writes the product of numeric columns into `result`.
///
/// The product stays an integer while every factor is one and nothing
/// overflows; otherwise it is a float.
#[derive(Debug, Clone)]
pub struct Product {
    pub columns: Vec<String>,
    pub result: String,
}

impl Product {
    pub fn new<I, S>(columns: I, result: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            result: result.into(),
        }
    }
}

impl Mapper for Product {
    fn map(&self, mut row: Row) -> Result<Vec<Row>, OpError> {
        let mut int_product: Option<i64> = Some(1);
        let mut float_product = 1.0_f64;
        for column in &self.columns {
            let value = row.get(column)?;
            float_product *= row.get_f64(column)?;
            int_product = match (int_product, value) {
                (Some(acc), Value::Int(i)) => acc.checked_mul(*i),
                _ => None,
            };
        }
        let product = match int_product {
            Some(i) => Value::Int(i),
            None => Value::Float(float_product),
        };
        row.insert(self.result.clone(), product);
        Ok(vec![row])
    }

    fn name(&self) -> &str {
        "product"
    }
}

type Predicate = Arc<dyn Fn(&Row) -> Result<bool, OpError> + Send + Sync>;

/// Keeps the rows for which the predicate holds.
#[derive(Clone)]
pub struct Filter {
    predicate: Predicate,
}

impl Filter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Row) -> Result<bool, OpError> + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

impl Mapper for Filter {
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError> {
        if (self.predicate)(&row)? {
            Ok(vec![row])
        } else {
            Ok(Vec::new())
        }
    }

    fn name(&self) -> &str {
        "filter"
    }
}

/// Keeps only the listed columns, failing if one is absent.
#[derive(Debug, Clone)]
pub struct Project {
    pub columns: Vec<String>,
}

impl Project {
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

impl Mapper for Project {
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError> {
        for column in &self.columns {
            row.get(column)?;
        }
        Ok(vec![row.project(&self.columns)])
    }

    fn name(&self) -> &str {
        "project"
    }
}
