//! In-memory storage backend for tests.
//!
//! Lets sort tests exercise the spill path without touching the filesystem.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use compgraph_mem::error::{Error as MemError, Result as MemResult};
use compgraph_mem::Storage;

/// Thread-safe in-memory storage. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MemResult<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.data
            .lock()
            .map_err(|_| MemError::Storage("memory storage lock poisoned".into()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().map(|d| d.contains_key(path)).unwrap_or(false)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flip one byte of a stored object (corruption tests).
    pub fn corrupt(&self, path: &str, offset: usize) -> bool {
        match self.lock() {
            Ok(mut d) => match d.get_mut(path).and_then(|b| b.get_mut(offset)) {
                Some(byte) => {
                    *byte ^= 0xff;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

impl Storage for MemoryStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> MemResult<()> {
        self.lock()?.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> MemResult<Vec<u8>> {
        let data = self.lock()?;
        let bytes = data
            .get(path)
            .ok_or_else(|| MemError::Storage(format!("path not found: {}", path)))?;

        let start = offset as usize;
        if start > bytes.len() {
            return Err(MemError::Storage(format!(
                "offset {} exceeds size {}",
                offset,
                bytes.len()
            )));
        }
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn delete(&self, path: &str) -> MemResult<()> {
        self.lock()?.remove(path);
        Ok(())
    }

    fn list(&self, prefix: &str) -> MemResult<Vec<String>> {
        let mut result: Vec<String> = self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }
}
