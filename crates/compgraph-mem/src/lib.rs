#![forbid(unsafe_code)]
//! compgraph-mem: memory budget, peak tracking, and spill manager.
//!
//! Concrete implementations for the *interfaces* in `compgraph-core::budget`.
//! Sort runs and reduce/join group buffers account their rows here so one
//! execution never holds more than its configured cap.
//!
//! No object-store IO lives here. A generic `Storage` trait is exposed
//! (in `spill::`) and implemented by `compgraph-io`.

pub mod error;
pub mod guard;
pub mod spill;
pub mod tracking;

pub use error::{Error, Result};
pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};
pub use spill::{Codec, SegmentMeta, SpillManager, Storage};
pub use tracking::PeakTracker;
