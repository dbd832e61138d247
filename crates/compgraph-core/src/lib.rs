#![forbid(unsafe_code)]
//! compgraph-core: the row model shared by every other crate.
//!
//! - `value`/`row`: cell values and rows, plus the orderings that sort,
//!   reduce and join rely on.
//! - `source`: the narrow "next row or end" interface that input bindings
//!   implement.
//! - `config`, `id`, `hash`, `manifest`: engine-wide plumbing.
//!
//! No IO, threads, or async live here.

pub mod budget;
pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod row;
pub mod source;
pub mod value;

pub use error::{Error, Result};
pub use row::Row;
pub use value::{Value, ValueKind};

/// Engine version recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
