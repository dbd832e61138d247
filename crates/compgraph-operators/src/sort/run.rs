//! Sorted runs on spill storage.
//!
//! A run is written as consecutive chunks of at most `chunk_rows` rows, each
//! its own segment, and read back one chunk at a time during the merge.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use compgraph_core::id::SpillId;
use compgraph_core::row::Row;
use compgraph_mem::spill::SegmentMeta;
use compgraph_mem::{BudgetGuardImpl, MemoryBudgetImpl, SpillManager};

use crate::traits::OpError;

/// Metadata for a sorted run on storage.
#[derive(Clone, Debug)]
pub struct RunMeta {
    pub index: u32,
    pub rows: u64,
    pub segments: Vec<SegmentMeta>,
}

pub(crate) fn lock(spill: &Mutex<SpillManager>) -> Result<MutexGuard<'_, SpillManager>, OpError> {
    spill
        .lock()
        .map_err(|_| compgraph_mem::Error::Storage("spill manager lock poisoned".into()).into())
}

/// Writes already-sorted row buffers out as runs.
pub struct RunGenerator {
    spill_id: SpillId,
    chunk_rows: usize,
    runs: Vec<RunMeta>,
}

impl RunGenerator {
    pub fn new(spill_id: SpillId, chunk_rows: usize) -> Self {
        Self {
            spill_id,
            chunk_rows: chunk_rows.max(1),
            runs: Vec::new(),
        }
    }

    pub fn write_run(&mut self, rows: &[Row], spill: &Mutex<SpillManager>) -> Result<(), OpError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut mgr = lock(spill)?;
        let index = mgr.next_run_index();
        let mut segments = Vec::new();
        for (chunk, part) in rows.chunks(self.chunk_rows).enumerate() {
            segments.push(mgr.write_rows(part, self.spill_id, index, chunk as u32)?);
        }
        tracing::debug!(
            spill = %self.spill_id,
            run = index,
            rows = rows.len(),
            segments = segments.len(),
            "sort run spilled"
        );
        self.runs.push(RunMeta {
            index,
            rows: rows.len() as u64,
            segments,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn finish(self) -> Vec<RunMeta> {
        self.runs
    }
}

/// Reads one run back chunk by chunk, deleting each segment once loaded.
pub struct RunCursor {
    segments: VecDeque<SegmentMeta>,
    current: std::vec::IntoIter<Row>,
    guard: BudgetGuardImpl,
}

impl RunCursor {
    pub fn new(run: RunMeta, budget: &MemoryBudgetImpl) -> Self {
        Self {
            segments: run.segments.into(),
            current: Vec::new().into_iter(),
            guard: budget.empty_guard("sort_merge_chunk"),
        }
    }

    pub fn next_row(
        &mut self,
        spill: &Mutex<SpillManager>,
        budget: &MemoryBudgetImpl,
    ) -> Result<Option<Row>, OpError> {
        loop {
            if let Some(row) = self.current.next() {
                return Ok(Some(row));
            }
            self.guard.reset();
            let Some(segment) = self.segments.pop_front() else {
                return Ok(None);
            };
            let rows = {
                let mut mgr = lock(spill)?;
                let rows = mgr.read_rows(&segment, budget)?;
                mgr.delete_segment(&segment.name)?;
                rows
            };
            self.guard.grow(rows.iter().map(Row::approx_bytes).sum())?;
            self.current = rows.into_iter();
        }
    }
}
