#![forbid(unsafe_code)]
//! compgraph-io: the engine's outside edges.
//!
//! - `readers`: JSON-lines and CSV files as re-openable `TableSource`s.
//! - `writers`: JSON-lines output for result rows.
//! - `storage`/`memory_storage`: backends for `compgraph_mem::Storage`.
//!
//! Nothing here knows about graphs; the engine only sees `TableSource`.

pub mod error;
pub mod memory_storage;
pub mod readers;
pub mod storage;
pub mod writers;

pub use error::{Error, Result};
pub use memory_storage::MemoryStorage;
pub use readers::{CsvFile, LineFile};
pub use storage::FsStorage;
pub use writers::JsonlWriter;
