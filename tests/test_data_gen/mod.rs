//! Shared helpers for integration tests: tables, engines and row generators.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use compgraph_core::prelude::*;
use compgraph_core::source::IterSource;
use compgraph_exec::{Bindings, Engine};
use compgraph_io::MemoryStorage;

/// Parse a JSON array of objects into rows.
pub fn rows(json: &str) -> Vec<Row> {
    serde_json::from_str(json).expect("test rows must be a JSON array of objects")
}

pub fn table(json: &str) -> MemoryTable {
    MemoryTable::new(rows(json))
}

pub fn bind(name: &str, json: &str) -> Bindings {
    Bindings::new().bind(name, table(json))
}

/// Engine with default settings whose spills stay in memory.
pub fn engine() -> Engine {
    engine_with(EngineConfig::default()).0
}

/// Engine using `cfg`, plus the in-memory storage its sorts spill into.
pub fn engine_with(cfg: EngineConfig) -> (Engine, MemoryStorage) {
    let storage = MemoryStorage::new();
    let engine = Engine::with_memory_spill(cfg, storage.clone()).expect("valid config");
    (engine, storage)
}

/// Fresh directory for filesystem spills; removed when dropped.
pub fn create_temp_spill_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("compgraph-spill-test")
        .tempdir()
        .expect("create temp dir")
}

/// Values of `column` across `rows`, in order.
pub fn column(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|r| r.get(column).expect("column present").clone())
        .collect()
}

pub fn ints(rows: &[Row], col: &str) -> Vec<i64> {
    column(rows, col)
        .into_iter()
        .map(|v| v.as_i64().expect("integer column"))
        .collect()
}

/// `n` rows `{seq, key, payload}` whose keys follow a fixed pseudo-random
/// sequence (seeded LCG) so failures reproduce.
pub fn generate_random_rows(n: usize, key_range: i64, seed: u64) -> Vec<Row> {
    let mut state = seed;
    (0..n)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let key = ((state >> 33) as i64).rem_euclid(key_range);
            Row::new()
                .with("seq", i as i64)
                .with("key", key)
                .with("payload", format!("payload-{i:06}"))
        })
        .collect()
}

/// A table that counts how often it was opened and how many rows were read
/// from it.
#[derive(Clone)]
pub struct CountingTable {
    rows: Arc<Vec<Row>>,
    pub opens: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
}

impl CountingTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
            opens: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

struct CountingSource {
    inner: IterSource<std::vec::IntoIter<Row>>,
    reads: Arc<AtomicUsize>,
}

impl RowSource for CountingSource {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let row = self.inner.next_row()?;
        if row.is_some() {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(row)
    }
}

impl TableSource for CountingTable {
    fn open(&self) -> Result<Box<dyn RowSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingSource {
            inner: IterSource::new(self.rows.as_ref().clone().into_iter()),
            reads: Arc::clone(&self.reads),
        }))
    }
}
