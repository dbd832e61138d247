//! Fold operator: reduces the whole stream to exactly one row.
//!
//! The upstream is drained on the first pull; an empty upstream yields the
//! initial state unchanged.

use std::sync::Arc;

use compgraph_core::row::Row;

use crate::traits::{Folder, OpError, RowStream};

pub struct FoldStream {
    upstream: Option<RowStream>,
    folder: Arc<dyn Folder>,
    initial: Option<Row>,
}

impl FoldStream {
    pub fn new(upstream: RowStream, folder: Arc<dyn Folder>, initial: Row) -> Self {
        Self {
            upstream: Some(upstream),
            folder,
            initial: Some(initial),
        }
    }

    fn run(&mut self, mut state: Row) -> Result<Row, OpError> {
        let Some(mut upstream) = self.upstream.take() else {
            return Ok(state);
        };
        for item in upstream.by_ref() {
            state = self.folder.fold(state, &item?)?;
        }
        Ok(state)
    }
}

impl Iterator for FoldStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.initial.take()?;
        Some(self.run(state))
    }
}
