//! Execution errors.

use thiserror::Error;

use compgraph_operators::OpError;

pub use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("input '{0}' is not bound")]
    UnboundInput(String),

    #[error("stream pulled after it was exhausted or closed")]
    StreamReused,

    #[error(transparent)]
    Operator(#[from] OpError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("invalid engine config: {0}")]
    Config(compgraph_core::Error),

    #[error(transparent)]
    Spill(#[from] compgraph_mem::Error),
}

impl ExecError {
    /// Column name when a row lacked a required column.
    pub fn missing_column(&self) -> Option<&str> {
        match self {
            ExecError::Operator(e) => e.missing_column(),
            _ => None,
        }
    }

    pub fn is_join_key_error(&self) -> bool {
        matches!(self, ExecError::Operator(OpError::JoinKeyError(_)))
    }

    pub fn is_group_order_violation(&self) -> bool {
        matches!(self, ExecError::Operator(OpError::GroupOrderViolation(_)))
    }

    /// Borrow an error raised by a user mapper, reducer or folder.
    pub fn downcast_user<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            ExecError::Operator(e) => e.downcast_user::<E>(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;
