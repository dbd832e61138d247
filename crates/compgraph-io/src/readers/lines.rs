//! Line-oriented files: one row per line, JSON-lines by default.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compgraph_core::error::{Error as CoreError, Result as CoreResult};
use compgraph_core::row::Row;
use compgraph_core::source::{RowSource, TableSource};

type Parser = Arc<dyn Fn(&str) -> CoreResult<Row> + Send + Sync>;

/// A text file whose non-blank lines each parse into one row.
#[derive(Clone)]
pub struct LineFile {
    path: PathBuf,
    parser: Parser,
}

impl LineFile {
    /// JSON-lines: each line is a JSON object of column → value.
    pub fn jsonl(path: impl AsRef<Path>) -> Self {
        Self::with_parser(path, parse_json_row)
    }

    /// Custom line parser, e.g. for tab-separated logs.
    pub fn with_parser<P>(path: impl AsRef<Path>, parser: P) -> Self
    where
        P: Fn(&str) -> CoreResult<Row> + Send + Sync + 'static,
    {
        Self {
            path: path.as_ref().to_path_buf(),
            parser: Arc::new(parser),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse one JSON object into a row.
pub fn parse_json_row(line: &str) -> CoreResult<Row> {
    serde_json::from_str(line).map_err(|e| CoreError::Source(format!("json: {e}")))
}

impl TableSource for LineFile {
    fn open(&self) -> CoreResult<Box<dyn RowSource>> {
        let file = File::open(&self.path)
            .map_err(|e| CoreError::Source(format!("{}: {e}", self.path.display())))?;
        Ok(Box::new(LineReader {
            lines: BufReader::new(file).lines(),
            parser: Arc::clone(&self.parser),
            path: self.path.display().to_string(),
            line_no: 0,
        }))
    }

    fn describe(&self) -> String {
        format!("file({})", self.path.display())
    }
}

struct LineReader {
    lines: Lines<BufReader<File>>,
    parser: Parser,
    path: String,
    line_no: u64,
}

impl RowSource for LineReader {
    fn next_row(&mut self) -> CoreResult<Option<Row>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_no += 1;
            let line = line.map_err(|e| {
                CoreError::Source(format!("{}:{}: {e}", self.path, self.line_no))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            return (self.parser)(&line).map(Some).map_err(|e| {
                CoreError::Source(format!("{}:{}: {e}", self.path, self.line_no))
            });
        }
    }
}
