//! Segment header and metadata for spilled row chunks.
//!
//! Layout in storage:
//! [ magic: u32 ][ version: u16 ][ codec: u8 ][ reserved: u8 ]
//! [ row_count: u32 ][ uncompressed_len: u64 ][ compressed_len: u64 ]
//! [ payload bytes … ]
//!
//! The payload is a JSON array of rows. An end-to-end blake3 checksum over
//! (header || payload) is kept in memory, not on disk.

use serde::{Deserialize, Serialize};

use compgraph_core::id::SpillId;

use super::Codec;
use crate::error::{Error, Result};

pub const MAGIC: u32 = 0x43475350; // "CGSP"
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 4 + 8 + 8;

/// Refuse to decode segments claiming more than this many bytes.
pub const MAX_SEGMENT_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentHeader {
    pub codec: Codec,
    pub row_count: u32,
    pub uncompressed_len: u64,
    pub compressed_len: u64,
}

impl SegmentHeader {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.push(self.codec as u8);
        out.push(0u8); // reserved
        out.extend_from_slice(&self.row_count.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_len.to_le_bytes());
        out.extend_from_slice(&self.compressed_len.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Storage("short header".into()));
        }
        let magic = u32::from_le_bytes(le4(&bytes[0..4]));
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if magic != MAGIC || version != VERSION {
            return Err(Error::Storage("bad magic/version".into()));
        }
        let codec = Codec::from_u8(bytes[6])?;
        // bytes[7] reserved
        let row_count = u32::from_le_bytes(le4(&bytes[8..12]));
        let uncompressed_len = u64::from_le_bytes(le8(&bytes[12..20]));
        let compressed_len = u64::from_le_bytes(le8(&bytes[20..28]));

        let header = Self {
            codec,
            row_count,
            uncompressed_len,
            compressed_len,
        };
        header.validate_sizes()?;
        Ok(header)
    }

    /// Reject sizes that would cause excessive allocations on corrupt data.
    fn validate_sizes(&self) -> Result<()> {
        if self.uncompressed_len > MAX_SEGMENT_BYTES || self.compressed_len > MAX_SEGMENT_BYTES {
            return Err(Error::Storage(format!(
                "segment sizes {}/{} exceed max {}",
                self.compressed_len, self.uncompressed_len, MAX_SEGMENT_BYTES
            )));
        }
        Ok(())
    }
}

fn le4(b: &[u8]) -> [u8; 4] {
    [b[0], b[1], b[2], b[3]]
}

fn le8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Name of a segment: spill session, run, and chunk within the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentName(pub String);

impl SegmentName {
    pub fn new(id: SpillId, run_index: u32, chunk: u32) -> Self {
        SegmentName(format!("spill{}_run{}_chunk{}", id.get(), run_index, chunk))
    }
}

/// Metadata the engine keeps for a spilled segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub name: SegmentName,
    pub path: String,
    pub codec: Codec,
    pub row_count: u32,
    pub uncompressed_len: u64,
    pub compressed_len: u64,
    pub checksum: [u8; 32],
}
