//! Row streams handed out by the engine.
//!
//! Every node's stream and the stream returned by `Engine::execute` follow
//! the same life cycle:
//!
//! ```text
//! NotStarted -> Pulling -> (Yielding* | Exhausted) -> Closed
//! ```
//!
//! A stream releases its upstream and buffers as soon as it is exhausted,
//! fails, is closed or is dropped. Pulling a stream that is exhausted or
//! closed fails with `StreamReused` and leaves it closed.

use std::sync::{Arc, Mutex};

use compgraph_core::id::NodeId;
use compgraph_core::row::Row;
use compgraph_core::source::{RowSource, TableSource};
use compgraph_mem::{MemoryBudgetImpl, SpillManager};
use compgraph_operators::{OpError, RowStream};

use crate::error::ExecError;
use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    Pulling,
    Yielding,
    Exhausted,
    Closed,
}

/// Per-execution resources, kept for the stream's statistics.
pub(crate) struct ExecResources {
    pub exec: String,
    pub budget: MemoryBudgetImpl,
    pub spill: Arc<Mutex<SpillManager>>,
}

impl ExecResources {
    fn spilled_segments(&self) -> u64 {
        self.spill
            .lock()
            .map(|mgr| mgr.segments_written())
            .unwrap_or(0)
    }
}

/// The output of one execution.
pub struct TableStream {
    inner: Option<RowStream>,
    state: StreamState,
    rows: u64,
    resources: ExecResources,
}

impl TableStream {
    pub(crate) fn new(inner: RowStream, resources: ExecResources) -> Self {
        Self {
            inner: Some(inner),
            state: StreamState::NotStarted,
            rows: 0,
            resources,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Next row, `Ok(None)` at the end. Pulling again after the end or after
    /// `close` fails with [`ExecError::StreamReused`].
    pub fn pull(&mut self) -> Result<Option<Row>, ExecError> {
        if matches!(self.state, StreamState::Exhausted | StreamState::Closed) {
            self.close();
            return Err(ExecError::StreamReused);
        }
        let Some(inner) = self.inner.as_mut() else {
            self.state = StreamState::Closed;
            return Err(ExecError::StreamReused);
        };
        self.state = StreamState::Pulling;
        match inner.next() {
            Some(Ok(row)) => {
                self.rows += 1;
                self.state = StreamState::Yielding;
                Ok(Some(row))
            }
            None => {
                self.inner = None;
                self.state = StreamState::Exhausted;
                metrics::execution_finished(
                    &self.resources.exec,
                    self.rows,
                    self.resources.budget.peak_bytes(),
                    self.resources.spilled_segments(),
                );
                Ok(None)
            }
            Some(Err(e)) => {
                self.inner = None;
                self.state = StreamState::Closed;
                metrics::execution_failed(&self.resources.exec, self.rows, &e);
                Err(e.into())
            }
        }
    }

    /// Release the upstream chain and every buffer now.
    pub fn close(&mut self) {
        self.inner = None;
        self.state = StreamState::Closed;
    }

    /// Rows yielded so far.
    pub fn rows_yielded(&self) -> u64 {
        self.rows
    }

    /// Highest number of bytes held by sort and group buffers so far.
    pub fn peak_buffered_bytes(&self) -> usize {
        self.resources.budget.peak_bytes()
    }

    /// Spill segments written by sorts of this execution so far.
    pub fn spilled_segments(&self) -> u64 {
        self.resources.spilled_segments()
    }

    /// Drain the remaining rows.
    pub fn collect_rows(mut self) -> Result<Vec<Row>, ExecError> {
        let mut rows = Vec::new();
        while let Some(row) = self.pull()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Iteration ends at exhaustion instead of reporting `StreamReused`; use
/// [`TableStream::pull`] for the strict protocol.
impl Iterator for TableStream {
    type Item = Result<Row, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, StreamState::Exhausted | StreamState::Closed) {
            return None;
        }
        self.pull().transpose()
    }
}

impl std::fmt::Debug for TableStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStream")
            .field("exec", &self.resources.exec)
            .field("state", &self.state)
            .field("rows", &self.rows)
            .finish()
    }
}

/// Wraps a node's operator stream with the life cycle above.
pub(crate) struct NodeStream {
    node: NodeId,
    kind: &'static str,
    inner: Option<RowStream>,
    state: StreamState,
    rows: u64,
}

impl NodeStream {
    pub(crate) fn wrap(node: NodeId, kind: &'static str, inner: RowStream) -> RowStream {
        Box::new(Self {
            node,
            kind,
            inner: Some(inner),
            state: StreamState::NotStarted,
            rows: 0,
        })
    }
}

impl Iterator for NodeStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, StreamState::Exhausted | StreamState::Closed) {
            self.state = StreamState::Closed;
            return Some(Err(OpError::StreamReused));
        }
        let inner = self.inner.as_mut()?;
        self.state = StreamState::Pulling;
        match inner.next() {
            Some(Ok(row)) => {
                self.rows += 1;
                self.state = StreamState::Yielding;
                Some(Ok(row))
            }
            None => {
                self.inner = None;
                self.state = StreamState::Exhausted;
                metrics::node_exhausted(self.node, self.kind, self.rows);
                None
            }
            Some(Err(e)) => {
                self.inner = None;
                self.state = StreamState::Closed;
                Some(Err(e))
            }
        }
    }
}

/// Input node stream; the table is opened on the first pull.
pub(crate) struct SourceStream {
    name: String,
    table: Option<Arc<dyn TableSource>>,
    source: Option<Box<dyn RowSource>>,
}

impl SourceStream {
    pub(crate) fn new(name: String, table: Arc<dyn TableSource>) -> Self {
        Self {
            name,
            table: Some(table),
            source: None,
        }
    }

    fn next_row(&mut self) -> Result<Option<Row>, OpError> {
        if self.source.is_none() {
            let Some(table) = self.table.take() else {
                return Ok(None);
            };
            metrics::input_opened(&self.name, &table.describe());
            self.source = Some(table.open()?);
        }
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        match source.next_row() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.source = None;
                Ok(None)
            }
            Err(e) => {
                self.source = None;
                Err(e.into())
            }
        }
    }
}

impl Iterator for SourceStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
