//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::id::{NodeId, SpillId};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::row::Row;
pub use crate::source::{MemoryTable, RowSource, TableSource};
pub use crate::value::{Value, ValueKind};
