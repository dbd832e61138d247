//! Reduce operator: hands each contiguous key group to a [`Reducer`].
//!
//! Upstream must already be grouped by the key columns. With empty keys the
//! whole stream is one group, and an empty stream produces nothing.

use std::collections::HashSet;
use std::sync::Arc;

use compgraph_core::hash::{hash_key, Hash256};
use compgraph_core::row::Row;
use compgraph_mem::MemoryBudgetImpl;

use crate::group::{GroupReader, KeySide};
use crate::traits::{OpError, Reducer, RowStream};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceOptions {
    /// Fail with `GroupOrderViolation` when a key group shows up again after
    /// a different key. Costs one hash per group.
    pub check_group_order: bool,
}

pub struct ReduceStream {
    groups: GroupReader,
    reducer: Arc<dyn Reducer>,
    keys: Vec<String>,
    seen: Option<HashSet<Hash256>>,
    pending: std::vec::IntoIter<Row>,
    done: bool,
}

impl ReduceStream {
    pub fn new(
        upstream: RowStream,
        reducer: Arc<dyn Reducer>,
        keys: Vec<String>,
        budget: MemoryBudgetImpl,
        opts: ReduceOptions,
    ) -> Self {
        Self {
            groups: GroupReader::new(upstream, keys.clone(), KeySide::Reduce, budget),
            reducer,
            keys,
            seen: opts.check_group_order.then(HashSet::new),
            pending: Vec::new().into_iter(),
            done: false,
        }
    }

    fn next_batch(&mut self) -> Result<bool, OpError> {
        let Some(group) = self.groups.next_group()? else {
            return Ok(false);
        };
        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(hash_key(&group.key)) {
                let shown: Vec<String> = group.key.iter().map(ToString::to_string).collect();
                return Err(OpError::GroupOrderViolation(format!(
                    "key ({}) on {:?} reappeared after a different key",
                    shown.join(", "),
                    self.keys
                )));
            }
        }
        self.pending = self.reducer.reduce(&self.keys, &group.rows)?.into_iter();
        Ok(true)
    }
}

impl Iterator for ReduceStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.next_batch() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    self.groups.close();
                    return Some(Err(e));
                }
            }
        }
    }
}
