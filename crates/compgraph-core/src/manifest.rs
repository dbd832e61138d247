//! Per-execution run manifest for audit.
//!
//! The engine emits a manifest after a graph has been fully drained; two runs
//! of the same graph share a `graph_hash` regardless of their bindings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the graph's structure (kinds, names, keys, join specs).
    pub graph_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Names of the inputs the graph was bound to.
    pub inputs: Vec<String>,

    pub rows_out: u64,

    /// Highest number of bytes held by sort/group buffers at once.
    pub peak_buffered_bytes: u64,

    /// Spill segments written by external sorts.
    pub spilled_segments: u64,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(graph_hash: Hash256, inputs: Vec<String>, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            graph_hash,
            engine_version: crate::VERSION.to_string(),
            inputs,
            rows_out: 0,
            peak_buffered_bytes: 0,
            spilled_segments: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(
        mut self,
        finished_ms: u64,
        rows_out: u64,
        peak_buffered_bytes: u64,
        spilled_segments: u64,
    ) -> Self {
        self.finished_ms = finished_ms;
        self.rows_out = rows_out;
        self.peak_buffered_bytes = peak_buffered_bytes;
        self.spilled_segments = spilled_segments;
        self
    }
}

/// Milliseconds since Unix epoch, saturating to 0 on a skewed clock.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
