//! CSV files with a header row.
//!
//! Cells are typed by shape: integers, then floats, then strings; empty
//! cells become `null`.

use std::fs::File;
use std::path::{Path, PathBuf};

use compgraph_core::error::{Error as CoreError, Result as CoreResult};
use compgraph_core::row::Row;
use compgraph_core::source::{RowSource, TableSource};
use compgraph_core::value::Value;

#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
    delimiter: u8,
}

impl CsvFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl TableSource for CsvFile {
    fn open(&self) -> CoreResult<Box<dyn RowSource>> {
        let source_err = |e: csv::Error| CoreError::Source(format!("{}: {e}", self.path.display()));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(&self.path)
            .map_err(source_err)?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(source_err)?
            .iter()
            .map(str::to_string)
            .collect();
        Ok(Box::new(CsvReader {
            records: reader.into_records(),
            headers,
            path: self.path.display().to_string(),
        }))
    }

    fn describe(&self) -> String {
        format!("csv({})", self.path.display())
    }
}

struct CsvReader {
    records: csv::StringRecordsIntoIter<File>,
    headers: Vec<String>,
    path: String,
}

impl RowSource for CsvReader {
    fn next_row(&mut self) -> CoreResult<Option<Row>> {
        let Some(record) = self.records.next() else {
            return Ok(None);
        };
        let record = record.map_err(|e| CoreError::Source(format!("{}: {e}", self.path)))?;
        let row = self
            .headers
            .iter()
            .zip(record.iter())
            .map(|(h, cell)| (h.clone(), infer_value(cell)))
            .collect();
        Ok(Some(row))
    }
}

fn infer_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int(i);
    }
    // `f64` also parses words like "nan" and "Infinity"; those stay text.
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::Str(cell.to_string())
}
