use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use compgraph_mem::error::{Error as MemError, Result as MemResult};
use compgraph_mem::Storage;

/// Local filesystem storage (rooted at the host filesystem).
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> MemResult<()> {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).map_err(|e| MemError::Storage(format!("mkparent: {e}")))?;
        }
        let mut f = File::create(p).map_err(|e| MemError::Storage(format!("create: {e}")))?;
        f.write_all(bytes)
            .map_err(|e| MemError::Storage(format!("write: {e}")))?;
        f.flush()
            .map_err(|e| MemError::Storage(format!("flush: {e}")))?;
        Ok(())
    }

    fn read_range(&self, path: &str, offset: u64, len: usize) -> MemResult<Vec<u8>> {
        let mut f =
            File::open(Path::new(path)).map_err(|e| MemError::Storage(format!("open: {e}")))?;
        f.seek(SeekFrom::Start(offset))
            .map_err(|e| MemError::Storage(format!("seek: {e}")))?;
        let mut buf = Vec::with_capacity(len);
        f.take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| MemError::Storage(format!("read: {e}")))?;
        Ok(buf)
    }

    fn delete(&self, path: &str) -> MemResult<()> {
        let p = Path::new(path);
        if p.exists() {
            fs::remove_file(p).map_err(|e| MemError::Storage(format!("delete: {e}")))?;
        }
        // Drop the per-execution directory once its last segment is gone.
        if let Some(parent) = p.parent() {
            let _ = fs::remove_dir(parent);
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> MemResult<Vec<String>> {
        let prefix_path = Path::new(prefix);
        let mut results = Vec::new();

        if !prefix_path.exists() {
            return Ok(results);
        }

        if prefix_path.is_file() {
            if let Some(s) = prefix_path.to_str() {
                results.push(s.to_string());
            }
            return Ok(results);
        }

        fn visit_dirs(dir: &Path, results: &mut Vec<String>) -> std::io::Result<()> {
            if dir.is_dir() {
                for entry in fs::read_dir(dir)? {
                    let path = entry?.path();
                    if path.is_dir() {
                        visit_dirs(&path, results)?;
                    } else if let Some(s) = path.to_str() {
                        results.push(s.to_string());
                    }
                }
            }
            Ok(())
        }

        visit_dirs(prefix_path, &mut results)
            .map_err(|e| MemError::Storage(format!("list: {e}")))?;
        results.sort();
        Ok(results)
    }
}
