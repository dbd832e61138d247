//! Contiguous key groups over a row stream.
//!
//! A group is a maximal run of consecutive rows with equal key values. The
//! reader holds at most one group plus a single lookahead row; the group's
//! rows are accounted against the memory budget until the caller drops it.

use compgraph_core::row::Row;
use compgraph_core::value::Value;
use compgraph_mem::{BudgetGuardImpl, MemoryBudgetImpl};

use crate::traits::{OpError, RowStream};

/// Which operator reads the groups; decides how a missing key is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySide {
    Reduce,
    JoinLeft,
    JoinRight,
}

impl KeySide {
    pub fn label(self) -> &'static str {
        match self {
            KeySide::Reduce => "reduce",
            KeySide::JoinLeft => "left",
            KeySide::JoinRight => "right",
        }
    }

    fn budget_tag(self) -> &'static str {
        match self {
            KeySide::Reduce => "reduce_group",
            KeySide::JoinLeft => "join_left_group",
            KeySide::JoinRight => "join_right_group",
        }
    }
}

pub struct Group {
    pub key: Vec<Value>,
    pub rows: Vec<Row>,
    _guard: BudgetGuardImpl,
}

pub struct GroupReader {
    upstream: Option<RowStream>,
    keys: Vec<String>,
    side: KeySide,
    budget: MemoryBudgetImpl,
    lookahead: Option<(Vec<Value>, Row)>,
}

impl GroupReader {
    pub fn new(
        upstream: RowStream,
        keys: Vec<String>,
        side: KeySide,
        budget: MemoryBudgetImpl,
    ) -> Self {
        Self {
            upstream: Some(upstream),
            keys,
            side,
            budget,
            lookahead: None,
        }
    }

    /// Next contiguous group, or `None` once the upstream is exhausted.
    pub fn next_group(&mut self) -> Result<Option<Group>, OpError> {
        let (key, first) = match self.lookahead.take() {
            Some(head) => head,
            None => match self.pull()? {
                Some(head) => head,
                None => return Ok(None),
            },
        };

        let mut guard = self.budget.empty_guard(self.side.budget_tag());
        guard.grow(first.approx_bytes())?;
        let mut rows = vec![first];

        while let Some((next_key, row)) = self.pull()? {
            if next_key == key {
                guard.grow(row.approx_bytes())?;
                rows.push(row);
            } else {
                self.lookahead = Some((next_key, row));
                break;
            }
        }

        Ok(Some(Group {
            key,
            rows,
            _guard: guard,
        }))
    }

    /// Drop the upstream without reading further.
    pub fn close(&mut self) {
        self.upstream = None;
        self.lookahead = None;
    }

    fn pull(&mut self) -> Result<Option<(Vec<Value>, Row)>, OpError> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Ok(None);
        };
        match upstream.next() {
            None => {
                self.upstream = None;
                Ok(None)
            }
            Some(Err(e)) => {
                self.upstream = None;
                Err(e)
            }
            Some(Ok(row)) => {
                let key = self.key_of(&row)?;
                Ok(Some((key, row)))
            }
        }
    }

    fn key_of(&mut self, row: &Row) -> Result<Vec<Value>, OpError> {
        match row.key(&self.keys) {
            Ok(key) => Ok(key),
            Err(compgraph_core::Error::MissingColumn(column)) if self.side != KeySide::Reduce => {
                self.upstream = None;
                Err(OpError::JoinKeyError(format!(
                    "{} row has no join key column '{column}'",
                    self.side.label()
                )))
            }
            Err(e) => {
                self.upstream = None;
                Err(e.into())
            }
        }
    }
}
