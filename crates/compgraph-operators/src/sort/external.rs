//! External sort operator with run generation and k-way merge.
//!
//! The first pull drains the upstream. Rows are buffered with their sort keys
//! under a budget guard. When a spill manager is attached and the buffer
//! reaches `run_rows` rows or the budget refuses the next row, the buffer is
//! sorted and written out as a run. If nothing was spilled the buffer is
//! emitted directly; otherwise the runs are merged with a min-heap that breaks
//! ties by run index, which keeps the sort stable.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};

use compgraph_core::budget::BudgetGuard;
use compgraph_core::id::SpillId;
use compgraph_core::row::Row;
use compgraph_core::value::Value;
use compgraph_mem::{BudgetGuardImpl, MemoryBudgetImpl, SpillManager};

use super::key::{compare_keys, sort_key_of, SortKey};
use super::run::{RunCursor, RunGenerator, RunMeta};
use crate::traits::{OpError, RowStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOptions {
    /// Rows per in-memory run before spilling.
    pub run_rows: usize,
    /// Rows per spill segment.
    pub chunk_rows: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            run_rows: 1_000_000,
            chunk_rows: 4096,
        }
    }
}

enum State {
    Pending,
    Buffered {
        rows: std::vec::IntoIter<Row>,
        _guard: BudgetGuardImpl,
    },
    Merging(Merger),
    Done,
}

pub struct SortStream {
    upstream: Option<RowStream>,
    keys: Arc<[SortKey]>,
    budget: MemoryBudgetImpl,
    spill: Option<Arc<Mutex<SpillManager>>>,
    spill_id: SpillId,
    opts: SortOptions,
    state: State,
}

impl SortStream {
    pub fn new(
        upstream: RowStream,
        keys: Vec<SortKey>,
        budget: MemoryBudgetImpl,
        spill: Option<Arc<Mutex<SpillManager>>>,
        spill_id: SpillId,
        opts: SortOptions,
    ) -> Self {
        Self {
            upstream: Some(upstream),
            keys: keys.into(),
            budget,
            spill,
            spill_id,
            opts,
            state: State::Pending,
        }
    }

    fn materialize(&mut self) -> Result<State, OpError> {
        let Some(upstream) = self.upstream.take() else {
            return Ok(State::Done);
        };
        let spill = self.spill.clone();
        let run_rows = self.opts.run_rows.max(1);
        let mut runs = RunGenerator::new(self.spill_id, self.opts.chunk_rows);
        let mut buf: Vec<(Vec<Value>, Row)> = Vec::new();
        let mut guard = self.budget.empty_guard("sort_buffer");

        for item in upstream {
            let row = item?;
            let key = sort_key_of(&row, &self.keys)?;
            let bytes = row.approx_bytes() + key.iter().map(Value::approx_bytes).sum::<usize>();

            let full = spill.is_some() && buf.len() >= run_rows;
            if full || !guard.try_resize(guard.bytes() + bytes) {
                if let Some(spill) = spill.as_deref() {
                    if !buf.is_empty() {
                        flush_run(&mut buf, &self.keys, &mut runs, spill)?;
                        guard.reset();
                    }
                }
                guard.grow(bytes)?;
            }
            buf.push((key, row));
        }

        if runs.is_empty() {
            buf.sort_by(|a, b| compare_keys(&a.0, &b.0, &self.keys));
            let rows: Vec<Row> = buf.into_iter().map(|(_, row)| row).collect();
            tracing::trace!(rows = rows.len(), "sorted in memory");
            return Ok(State::Buffered {
                rows: rows.into_iter(),
                _guard: guard,
            });
        }

        let Some(spill) = spill else {
            return Err(compgraph_mem::Error::Storage("sort runs without spill manager".into()).into());
        };
        flush_run(&mut buf, &self.keys, &mut runs, &spill)?;
        drop(guard);

        let runs = runs.finish();
        tracing::debug!(runs = runs.len(), "merging sorted runs");
        Ok(State::Merging(Merger::new(
            runs,
            Arc::clone(&self.keys),
            spill,
            self.budget.clone(),
        )?))
    }
}

fn flush_run(
    buf: &mut Vec<(Vec<Value>, Row)>,
    keys: &[SortKey],
    runs: &mut RunGenerator,
    spill: &Mutex<SpillManager>,
) -> Result<(), OpError> {
    buf.sort_by(|a, b| compare_keys(&a.0, &b.0, keys));
    let rows: Vec<Row> = buf.drain(..).map(|(_, row)| row).collect();
    runs.write_run(&rows, spill)
}

impl Iterator for SortStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, State::Pending) {
            match self.materialize() {
                Ok(state) => self.state = state,
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(e));
                }
            }
        }
        let item = match &mut self.state {
            State::Pending | State::Done => None,
            State::Buffered { rows, .. } => rows.next().map(Ok),
            State::Merging(merger) => merger.next_row().transpose(),
        };
        if !matches!(item, Some(Ok(_))) {
            self.state = State::Done;
        }
        item
    }
}

/// Entry in the merge heap, ordered as a min-heap on (key, run).
struct HeapEntry {
    key: Vec<Value>,
    run: usize,
    row: Row,
    keys: Arc<[SortKey]>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        compare_keys(&other.key, &self.key, &self.keys).then_with(|| other.run.cmp(&self.run))
    }
}

struct Merger {
    cursors: Vec<RunCursor>,
    heap: BinaryHeap<HeapEntry>,
    keys: Arc<[SortKey]>,
    spill: Arc<Mutex<SpillManager>>,
    budget: MemoryBudgetImpl,
}

impl Merger {
    fn new(
        runs: Vec<RunMeta>,
        keys: Arc<[SortKey]>,
        spill: Arc<Mutex<SpillManager>>,
        budget: MemoryBudgetImpl,
    ) -> Result<Self, OpError> {
        let cursors = runs
            .into_iter()
            .map(|run| RunCursor::new(run, &budget))
            .collect::<Vec<_>>();
        let mut merger = Self {
            heap: BinaryHeap::with_capacity(cursors.len()),
            cursors,
            keys,
            spill,
            budget,
        };
        for run in 0..merger.cursors.len() {
            merger.refill(run)?;
        }
        Ok(merger)
    }

    fn refill(&mut self, run: usize) -> Result<(), OpError> {
        if let Some(row) = self.cursors[run].next_row(&self.spill, &self.budget)? {
            let key = sort_key_of(&row, &self.keys)?;
            self.heap.push(HeapEntry {
                key,
                run,
                row,
                keys: Arc::clone(&self.keys),
            });
        }
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, OpError> {
        let Some(entry) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(entry.run)?;
        Ok(Some(entry.row))
    }
}
