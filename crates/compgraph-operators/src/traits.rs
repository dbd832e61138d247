//! Operator error type and the user-facing function traits.
//!
//! Mappers, reducers and folders are plain trait objects so a graph can hold
//! any mix of library operations and closures. Closures with the matching
//! signature implement the traits directly.

use compgraph_core::row::Row;
use thiserror::Error;

/// Error type user code can hand back through [`OpError::User`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The row stream every operator consumes and produces.
pub type RowStream = Box<dyn Iterator<Item = Result<Row, OpError>> + Send>;

#[derive(Debug, Error)]
pub enum OpError {
    /// Row access failures: missing columns, type mismatches, source errors.
    #[error(transparent)]
    Row(#[from] compgraph_core::Error),

    #[error("join key error: {0}")]
    JoinKeyError(String),

    #[error("group order violation: {0}")]
    GroupOrderViolation(String),

    /// Two columns of a joined row would end up with the same name.
    #[error("join column conflict: '{0}' produced twice")]
    ColumnConflict(String),

    #[error("stream pulled after it was exhausted or closed")]
    StreamReused,

    /// Budget or spill failures.
    #[error(transparent)]
    Mem(#[from] compgraph_mem::Error),

    /// An error raised by a user mapper, reducer or folder, passed through
    /// untouched.
    #[error(transparent)]
    User(BoxError),
}

impl OpError {
    pub fn user(err: impl Into<BoxError>) -> Self {
        OpError::User(err.into())
    }

    /// Column name when this is a missing-column error.
    pub fn missing_column(&self) -> Option<&str> {
        match self {
            OpError::Row(compgraph_core::Error::MissingColumn(c)) => Some(c),
            _ => None,
        }
    }

    /// Borrow the user error as its concrete type.
    pub fn downcast_user<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            OpError::User(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Row -> zero or more rows.
pub trait Mapper: Send + Sync {
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError>;

    /// Stable label used by `explain` and graph fingerprints.
    fn name(&self) -> &str {
        "fn"
    }
}

impl<F> Mapper for F
where
    F: Fn(Row) -> Result<Vec<Row>, OpError> + Send + Sync,
{
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError> {
        self(row)
    }
}

/// One contiguous key group -> zero or more rows.
///
/// `keys` are the grouping columns; every row of `group` agrees on them.
pub trait Reducer: Send + Sync {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError>;

    fn name(&self) -> &str {
        "fn"
    }
}

impl<F> Reducer for F
where
    F: Fn(&[String], &[Row]) -> Result<Vec<Row>, OpError> + Send + Sync,
{
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        self(keys, group)
    }
}

/// (state, row) -> new state.
pub trait Folder: Send + Sync {
    fn fold(&self, state: Row, row: &Row) -> Result<Row, OpError>;

    fn name(&self) -> &str {
        "fn"
    }
}

impl<F> Folder for F
where
    F: Fn(Row, &Row) -> Result<Row, OpError> + Send + Sync,
{
    fn fold(&self, state: Row, row: &Row) -> Result<Row, OpError> {
        self(state, row)
    }
}

/// An operation with an explicit label.
///
/// Closures all report the label `"fn"`, so two graphs that differ only in
/// which closure they run share a fingerprint. Wrapping each closure with
/// [`named`] keeps them apart.
pub struct Named<T> {
    name: String,
    inner: T,
}

pub fn named<T>(name: impl Into<String>, inner: T) -> Named<T> {
    Named {
        name: name.into(),
        inner,
    }
}

impl<T: Mapper> Mapper for Named<T> {
    fn map(&self, row: Row) -> Result<Vec<Row>, OpError> {
        self.inner.map(row)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Reducer> Reducer for Named<T> {
    fn reduce(&self, keys: &[String], group: &[Row]) -> Result<Vec<Row>, OpError> {
        self.inner.reduce(keys, group)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Folder> Folder for Named<T> {
    fn fold(&self, state: Row, row: &Row) -> Result<Row, OpError> {
        self.inner.fold(state, row)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
