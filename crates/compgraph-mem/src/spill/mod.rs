//! Spill manager for external sort runs.
//!
//! Writes chunks of rows to storage as checksummed segments and reads them
//! back one chunk at a time, so a k-way merge only keeps one chunk per run
//! in memory.

pub mod codec;
mod payload;
pub mod segment;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use compgraph_core::budget::MemoryBudget;
use compgraph_core::id::SpillId;
use compgraph_core::row::Row;

use crate::error::{Error, Result};
use crate::guard::{BudgetGuardImpl, MemoryBudgetImpl};

pub use codec::Codec;
pub use segment::{SegmentHeader, SegmentMeta, SegmentName, HEADER_LEN};

/// Abstract storage interface for spill segments.
///
/// Implemented by `compgraph-io::FsStorage` for the local filesystem and by
/// `compgraph-io::MemoryStorage` for tests.
pub trait Storage: Send + Sync {
    /// Write bytes to a path. Creates parent directories if needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Read a byte range from a path. Returns at most `len` bytes.
    fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Delete a path. Idempotent (no error if path doesn't exist).
    fn delete(&self, path: &str) -> Result<()>;

    /// List all paths under a prefix.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Central manager for spilling row chunks to storage.
///
/// Segments it wrote are deleted when the manager is dropped.
pub struct SpillManager {
    storage: Box<dyn Storage>,
    codec: Codec,
    root_dir: String,
    next_run: AtomicU32,
    segments: HashMap<SegmentName, SegmentMeta>,
    written: u64,
}

impl SpillManager {
    pub fn new(storage: Box<dyn Storage>, codec: Codec, root_dir: String) -> Self {
        Self {
            storage,
            codec,
            root_dir,
            next_run: AtomicU32::new(0),
            segments: HashMap::new(),
            written: 0,
        }
    }

    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Write a chunk of rows and return its metadata.
    ///
    /// Steps: serialize (tagged JSON) → compress → header → blake3 over
    /// header + payload → store.
    pub fn write_rows(
        &mut self,
        rows: &[Row],
        spill_id: SpillId,
        run_index: u32,
        chunk: u32,
    ) -> Result<SegmentMeta> {
        let uncompressed = payload::encode(rows)?;
        let compressed = codec::compress(self.codec, &uncompressed)?;

        let header = SegmentHeader {
            codec: self.codec,
            row_count: rows.len() as u32,
            uncompressed_len: uncompressed.len() as u64,
            compressed_len: compressed.len() as u64,
        };
        let header_bytes = header.to_bytes();

        let mut full_segment = Vec::with_capacity(header_bytes.len() + compressed.len());
        full_segment.extend_from_slice(&header_bytes);
        full_segment.extend_from_slice(&compressed);
        let checksum: [u8; 32] = blake3::hash(&full_segment).into();

        let name = SegmentName::new(spill_id, run_index, chunk);
        let path = format!("{}/{}.seg", self.root_dir, name.0);
        self.storage.write(&path, &full_segment)?;

        let meta = SegmentMeta {
            name: name.clone(),
            path,
            codec: self.codec,
            row_count: header.row_count,
            uncompressed_len: header.uncompressed_len,
            compressed_len: header.compressed_len,
            checksum,
        };
        self.segments.insert(name, meta.clone());
        self.written += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(segment = %meta.name.0, rows = meta.row_count, bytes = meta.compressed_len, "spilled segment");

        Ok(meta)
    }

    /// Read a chunk back, verifying its checksum.
    ///
    /// The decompression buffer is accounted against `budget` while it lives.
    pub fn read_rows(&self, meta: &SegmentMeta, budget: &MemoryBudgetImpl) -> Result<Vec<Row>> {
        let total_len = HEADER_LEN + meta.compressed_len as usize;
        let full_segment = self.storage.read_range(&meta.path, 0, total_len)?;
        if full_segment.len() < total_len {
            return Err(Error::Storage(format!("segment '{}' truncated", meta.name.0)));
        }

        let computed: [u8; 32] = blake3::hash(&full_segment).into();
        if computed != meta.checksum {
            return Err(Error::ChecksumMismatch(meta.name.0.clone()));
        }

        let header = SegmentHeader::from_bytes(&full_segment[..HEADER_LEN])?;
        let compressed = &full_segment[HEADER_LEN..];

        let _guard: BudgetGuardImpl = budget
            .try_acquire(header.uncompressed_len as usize, "spill_decompress")
            .ok_or_else(|| Error::BudgetExceeded {
                tag: "spill_decompress",
                requested: header.uncompressed_len as usize,
                capacity: budget.capacity_bytes(),
                used: budget.used_bytes(),
            })?;

        let uncompressed = codec::decompress(header.codec, compressed)?;
        let rows = payload::decode(&uncompressed)?;
        if rows.len() != header.row_count as usize {
            return Err(Error::Storage(format!(
                "segment '{}' holds {} rows, header says {}",
                meta.name.0,
                rows.len(),
                header.row_count
            )));
        }
        Ok(rows)
    }

    /// Generate a unique run index for this spill session.
    pub fn next_run_index(&self) -> u32 {
        self.next_run.fetch_add(1, Ordering::Relaxed)
    }

    /// Delete a segment from storage and forget its metadata.
    pub fn delete_segment(&mut self, name: &SegmentName) -> Result<()> {
        if let Some(meta) = self.segments.remove(name) {
            self.storage.delete(&meta.path)?;
        }
        Ok(())
    }

    /// Segments currently stored.
    pub fn live_segments(&self) -> usize {
        self.segments.len()
    }

    /// Segments written over the manager's lifetime.
    pub fn segments_written(&self) -> u64 {
        self.written
    }
}

impl Drop for SpillManager {
    fn drop(&mut self) {
        let names: Vec<SegmentName> = self.segments.keys().cloned().collect();
        for name in names {
            // Best effort.
            let _ = self.delete_segment(&name);
        }
    }
}
