#![forbid(unsafe_code)]
//! compgraph-operators: pull-based row operators.
//!
//! Every operator is an iterator over `Result<Row, OpError>` that pulls its
//! upstream only when asked for a row.
//! - `map`, `fold`: streaming; nothing is buffered beyond the current row.
//! - `reduce`: buffers one contiguous key group at a time.
//! - `sort`: buffers its whole input, spilling sorted runs through
//!   `compgraph-mem` when a run outgrows its row limit or the memory budget.
//! - `join`: sort-merge join, buffering one key group per side.
//!
//! Buffers are accounted against a `MemoryBudgetImpl` and released when the
//! operator drops them. Once an operator has yielded an error or reached its
//! end it drops its upstream.

pub mod fold;
pub mod group;
pub mod join;
pub mod map;
pub mod mappers;
pub mod reduce;
pub mod reducers;
pub mod sort;
pub mod traits;

pub use fold::FoldStream;
pub use group::{Group, GroupReader, KeySide};
pub use join::{JoinSpec, JoinType, MergeJoinStream};
pub use map::MapStream;
pub use reduce::{ReduceOptions, ReduceStream};
pub use sort::{SortKey, SortOptions, SortOrder, SortStream};
pub use traits::{named, BoxError, Folder, Mapper, Named, OpError, Reducer, RowStream};
