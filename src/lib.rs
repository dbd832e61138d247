#![forbid(unsafe_code)]
//! compgraph: build computational graphs over rows and run them lazily.
//!
//! Facade over the workspace crates:
//! - `compgraph_core`: rows, values, sources, config.
//! - `compgraph_operators`: map/reduce/sort/fold/join plus ready-made mappers
//!   and reducers.
//! - `compgraph_exec`: the graph builder and the engine.
//! - `compgraph_io`: file sources, JSON-lines writer, spill storage.
//! - `compgraph_mem`: memory budget and spill manager.

pub use compgraph_core;
pub use compgraph_exec;
pub use compgraph_io;
pub use compgraph_mem;
pub use compgraph_operators;

pub use compgraph_core::{row, Row, Value};
pub use compgraph_exec::{Bindings, Engine, ExecError, Graph, StreamState, TableStream};
pub use compgraph_operators::{JoinSpec, JoinType, OpError, SortKey};
