//! Storage adapters implementing `compgraph_mem::spill::Storage`.
//!
//! - `fs`: Local filesystem (default spill target).
//!
//! The in-memory backend lives in `memory_storage`.

mod fs;
pub use fs::FsStorage;
