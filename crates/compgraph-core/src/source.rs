//! Input binding interface.
//!
//! A [`TableSource`] is a re-openable producer: the engine calls `open` once
//! per Input node per execution and pulls the returned [`RowSource`] until it
//! signals the end. Running a graph twice therefore re-reads the source
//! instead of replaying cached rows.

use std::sync::Arc;

use crate::error::Result;
use crate::row::Row;

/// Anything that can produce the next row or signal the end (`Ok(None)`).
pub trait RowSource: Send {
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// A producer of fresh [`RowSource`]s.
pub trait TableSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn RowSource>>;

    /// Short label used in logs.
    fn describe(&self) -> String {
        "table".to_string()
    }
}

/// Rows held in memory, shared between every stream opened from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Arc<Vec<Row>>,
}

impl MemoryTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Row>> for MemoryTable {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

struct MemoryCursor {
    rows: Arc<Vec<Row>>,
    pos: usize,
}

impl RowSource for MemoryCursor {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let row = self.rows.get(self.pos).cloned();
        if row.is_some() {
            self.pos += 1;
        }
        Ok(row)
    }
}

impl TableSource for MemoryTable {
    fn open(&self) -> Result<Box<dyn RowSource>> {
        Ok(Box::new(MemoryCursor {
            rows: Arc::clone(&self.rows),
            pos: 0,
        }))
    }

    fn describe(&self) -> String {
        format!("memory({} rows)", self.rows.len())
    }
}

/// Adapts any row iterator into a [`RowSource`].
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> RowSource for IterSource<I>
where
    I: Iterator<Item = Row> + Send,
{
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.inner.next())
    }
}

/// A table backed by a closure that builds a fresh iterator on every open.
pub struct FnTable<F> {
    make: F,
}

/// Bind an input to a closure producing rows, e.g. a generator over a file
/// or a synthetic data set.
pub fn from_fn<F, I>(make: F) -> FnTable<F>
where
    F: Fn() -> I + Send + Sync,
    I: IntoIterator<Item = Row>,
    I::IntoIter: Send + 'static,
{
    FnTable { make }
}

impl<F, I> TableSource for FnTable<F>
where
    F: Fn() -> I + Send + Sync,
    I: IntoIterator<Item = Row>,
    I::IntoIter: Send + 'static,
{
    fn open(&self) -> Result<Box<dyn RowSource>> {
        Ok(Box::new(IterSource::new((self.make)().into_iter())))
    }

    fn describe(&self) -> String {
        "fn".to_string()
    }
}
