//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-execution memory cap (in bytes) for sort runs and group buffers.
    pub mem_cap_bytes: usize,

    /// Upper bound on rows held by one in-memory sort run before it spills.
    pub sort_run_rows: usize,

    /// Rows per spill segment. A k-way merge keeps one segment per run live.
    pub spill_chunk_rows: usize,

    /// Directory for spill files. Each execution gets its own subdirectory.
    pub spill_dir: String,

    /// Spill compression: "none", "zstd" or "lz4".
    pub spill_codec: String,

    /// Fail a reduce when a group key reappears after its group closed.
    /// Costs one 32-byte digest per distinct key.
    pub check_group_order: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mem_cap_bytes: 512 * 1024 * 1024, // 512 MiB default
            sort_run_rows: 1_000_000,
            spill_chunk_rows: 4096,
            spill_dir: std::env::temp_dir()
                .join("compgraph-spill")
                .to_string_lossy()
                .into_owned(),
            spill_codec: "none".to_string(),
            check_group_order: false,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `COMPGRAPH_MEM_CAP_BYTES`: memory cap in bytes
    /// - `COMPGRAPH_SORT_RUN_ROWS`: max rows per in-memory sort run
    /// - `COMPGRAPH_SPILL_CHUNK_ROWS`: rows per spill segment
    /// - `COMPGRAPH_SPILL_DIR`: spill directory
    /// - `COMPGRAPH_SPILL_CODEC`: none | zstd | lz4
    /// - `COMPGRAPH_CHECK_GROUP_ORDER`: true/false (also 1/0)
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_parse::<usize>("COMPGRAPH_MEM_CAP_BYTES") {
            cfg.mem_cap_bytes = v;
        }
        if let Some(v) = env_parse::<usize>("COMPGRAPH_SORT_RUN_ROWS") {
            cfg.sort_run_rows = v;
        }
        if let Some(v) = env_parse::<usize>("COMPGRAPH_SPILL_CHUNK_ROWS") {
            cfg.spill_chunk_rows = v;
        }
        if let Ok(s) = std::env::var("COMPGRAPH_SPILL_DIR") {
            cfg.spill_dir = s;
        }
        if let Ok(s) = std::env::var("COMPGRAPH_SPILL_CODEC") {
            cfg.spill_codec = s.trim().to_ascii_lowercase();
        }
        if let Ok(s) = std::env::var("COMPGRAPH_CHECK_GROUP_ORDER") {
            cfg.check_group_order = matches!(s.trim(), "1" | "true" | "TRUE" | "yes");
        }

        cfg
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sort_run_rows == 0 {
            return Err(Error::Config("sort_run_rows must be > 0".into()));
        }
        if self.spill_chunk_rows == 0 {
            return Err(Error::Config("spill_chunk_rows must be > 0".into()));
        }
        if !matches!(self.spill_codec.as_str(), "none" | "zstd" | "lz4") {
            return Err(Error::Config(format!(
                "unknown spill codec '{}'",
                self.spill_codec
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
