//! Map operator: applies a [`Mapper`] to each upstream row and yields the
//! produced rows in order.

use std::sync::Arc;

use compgraph_core::row::Row;

use crate::traits::{Mapper, OpError, RowStream};

pub struct MapStream {
    upstream: Option<RowStream>,
    mapper: Arc<dyn Mapper>,
    pending: std::vec::IntoIter<Row>,
}

impl MapStream {
    pub fn new(upstream: RowStream, mapper: Arc<dyn Mapper>) -> Self {
        Self {
            upstream: Some(upstream),
            mapper,
            pending: Vec::new().into_iter(),
        }
    }
}

impl Iterator for MapStream {
    type Item = Result<Row, OpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(Ok(row));
            }
            let upstream = self.upstream.as_mut()?;
            match upstream.next() {
                None => {
                    self.upstream = None;
                    return None;
                }
                Some(Err(e)) => {
                    self.upstream = None;
                    return Some(Err(e));
                }
                Some(Ok(row)) => match self.mapper.map(row) {
                    Ok(rows) => self.pending = rows.into_iter(),
                    Err(e) => {
                        self.upstream = None;
                        return Some(Err(e));
                    }
                },
            }
        }
    }
}
