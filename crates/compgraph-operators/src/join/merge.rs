//! Merge join over two key-sorted streams.
//!
//! Both sides are read one contiguous key group at a time and advanced in
//! lockstep. Matching groups produce their cross product in left-major
//! order; unmatched groups are emitted unchanged when the join kind keeps
//! that side. A side whose keys go backwards fails with
//! `GroupOrderViolation`; keys of incompatible kinds fail with
//! `JoinKeyError`.

use std::cmp::Ordering;

use compgraph_core::row::Row;
use compgraph_core::value::Value;
use compgraph_mem::MemoryBudgetImpl;

use super::combine::combine_rows;
use super::JoinSpec;
use crate::group::{Group, GroupReader, KeySide};
use crate::traits::{OpError, RowStream};

pub struct MergeJoinStream {
    spec: JoinSpec,
    left: GroupReader,
    right: GroupReader,
    left_head: Option<Group>,
    right_head: Option<Group>,
    last_left: Option<Vec<Value>>,
    last_right: Option<Vec<Value>>,
    started: bool,
    done: bool,
    pending: std::vec::IntoIter<Row>,
    deferred: Option<OpError>,
}

impl MergeJoinStream {
    pub fn new(left: RowStream, right: RowStream, spec: JoinSpec, budget: MemoryBudgetImpl) -> Self {
        Self {
            left: GroupReader::new(left, spec.keys.clone(), KeySide::JoinLeft, budget.clone()),
            right: GroupReader::new(right, spec.keys.clone(), KeySide::JoinRight, budget),
            spec,
            left_head: None,
            right_head: None,
            last_left: None,
            last_right: None,
            started: false,
            done: false,
            pending: Vec::new().into_iter(),
            deferred: None,
        }
    }

    fn fetch(&mut self, side: KeySide) -> Result<Option<Group>, OpError> {
        let (reader, last) = match side {
            KeySide::JoinRight => (&mut self.right, &mut self.last_right),
            _ => (&mut self.left, &mut self.last_left),
        };
        let Some(group) = reader.next_group()? else {
            return Ok(None);
        };
        if let Some(prev) = last.as_ref() {
            if compare_join_keys(prev, &group.key, &self.spec.keys)? == Ordering::Greater {
                return Err(OpError::GroupOrderViolation(format!(
                    "{} side of join is not sorted by {:?}: key {} came after {}",
                    side.label(),
                    self.spec.keys,
                    show(&group.key),
                    show(prev)
                )));
            }
        }
        *last = Some(group.key.clone());
        Ok(Some(group))
    }

    /// Advance by one group on at least one side. Returns false when no more
    /// output can be produced.
    fn step(&mut self) -> Result<bool, OpError> {
        if !self.started {
            self.started = true;
            self.left_head = self.fetch(KeySide::JoinLeft)?;
            self.right_head = self.fetch(KeySide::JoinRight)?;
        }

        let join_type = self.spec.join_type;
        match (self.left_head.take(), self.right_head.take()) {
            (None, None) => Ok(false),
            (Some(left), None) => {
                if !join_type.keeps_left() {
                    return Ok(false);
                }
                self.pending = left.rows.into_iter();
                self.left_head = self.fetch(KeySide::JoinLeft)?;
                Ok(true)
            }
            (None, Some(right)) => {
                if !join_type.keeps_right() {
                    return Ok(false);
                }
                self.pending = right.rows.into_iter();
                self.right_head = self.fetch(KeySide::JoinRight)?;
                Ok(true)
            }
            (Some(left), Some(right)) => {
                match compare_join_keys(&left.key, &right.key, &self.spec.keys)? {
                    Ordering::Less => {
                        if join_type.keeps_left() {
                            self.pending = left.rows.into_iter();
                        }
                        self.right_head = Some(right);
                        self.left_head = self.fetch(KeySide::JoinLeft)?;
                    }
                    Ordering::Greater => {
                        if join_type.keeps_right() {
                            self.pending = right.rows.into_iter();
                        }
                        self.left_head = Some(left);
                        self.right_head = self.fetch(KeySide::JoinRight)?;
                    }
                    Ordering::Equal => {
                        tracing::trace!(
                            left = left.rows.len(),
                            right = right.rows.len(),
                            "join group matched"
                        );
                        let mut out = Vec::with_capacity(left.rows.len() * right.rows.len());
                        for l in &left.rows {
                            for r in &right.rows {
                                out.push(combine_rows(l, r, &self.spec)?);
                            }
                        }
                        drop(left);
                        drop(right);
                        self.pending = out.into_iter();
                        self.left_head = self.fetch(KeySide::JoinLeft)?;
                        self.right_head = self.fetch(KeySide::JoinRight)?;
                    }
                }
                Ok(true)
            }
        }
    }

    fn release(&mut self) {
        self.left.close();
        self.right.close();
        self.left_head = None;
        self.right_head = None;
    }
}

impl Iterator for MergeJoinStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            if let Some(e) = self.deferred.take() {
                return Some(Err(e));
            }
            if self.done {
                return None;
            }
            match self.step() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    self.release();
                    return None;
                }
                Err(e) => {
                    // Rows produced before the failing read still go out first.
                    self.done = true;
                    self.release();
                    self.deferred = Some(e);
                }
            }
        }
    }
}

fn compare_join_keys(a: &[Value], b: &[Value], columns: &[String]) -> Result<Ordering, OpError> {
    for ((x, y), column) in a.iter().zip(b.iter()).zip(columns.iter()) {
        match x.try_cmp(y) {
            Some(Ordering::Equal) => continue,
            Some(ord) => return Ok(ord),
            None => {
                return Err(OpError::JoinKeyError(format!(
                    "cannot compare {} value {x} with {} value {y} on key column '{column}'",
                    x.kind(),
                    y.kind()
                )))
            }
        }
    }
    Ok(Ordering::Equal)
}

fn show(key: &[Value]) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}
