#![forbid(unsafe_code)]
//! compgraph-exec: graph builder, lazy execution engine and run manifests.
//!
//! Build a [`Graph`] once, then execute it any number of times against
//! different [`Bindings`]. Execution is pull-based: rows move only when the
//! returned [`TableStream`] is pulled.

pub mod bindings;
pub mod error;
pub mod explain;
pub mod graph;
pub mod metrics;
pub mod runtime;
pub mod stream;

pub use bindings::Bindings;
pub use error::{ExecError, GraphError, Result};
pub use graph::{Graph, OperationKind};
pub use runtime::Engine;
pub use stream::{StreamState, TableStream};
