//! MemoryBudget + RAII guard implementations.
//!
//! Buffering operators hold one guard per buffer and grow it row by row.
//! Dropping the guard returns the bytes to the budget (panic-safe), so a
//! dropped stream releases its accounting together with its rows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use compgraph_core::budget::{BudgetGuard, MemoryBudget};

use crate::error::{Error, Result};
use crate::tracking::PeakTracker;

/// Shared inner state for the budget.
struct BudgetInner {
    capacity: usize,
    used: AtomicUsize,
    peak: PeakTracker,
}

impl BudgetInner {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: AtomicUsize::new(0),
            peak: PeakTracker::new(),
        }
    }

    fn try_acquire(&self, bytes: usize) -> bool {
        loop {
            let cur = self.used.load(Ordering::Relaxed);
            let next = cur.saturating_add(bytes);
            if next > self.capacity {
                return false;
            }
            if self
                .used
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                self.peak.record_used(next);
                return true;
            }
        }
    }

    fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }

    fn exceeded(&self, tag: &'static str, requested: usize) -> Error {
        Error::BudgetExceeded {
            tag,
            requested,
            capacity: self.capacity,
            used: self.used.load(Ordering::Relaxed),
        }
    }
}

/// Concrete MemoryBudget implementation used by the engine.
///
/// Cloning shares the same accounting; each execution builds its own.
#[derive(Clone)]
pub struct MemoryBudgetImpl {
    inner: Arc<BudgetInner>,
}

impl MemoryBudgetImpl {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            inner: Arc::new(BudgetInner::new(capacity_bytes)),
        }
    }

    /// Highest usage observed so far.
    pub fn peak_bytes(&self) -> usize {
        self.inner.peak.peak()
    }

    /// Like [`MemoryBudget::try_acquire`] but reports why it failed.
    pub fn acquire(&self, bytes: usize, tag: &'static str) -> Result<BudgetGuardImpl> {
        self.try_acquire(bytes, tag)
            .ok_or_else(|| self.inner.exceeded(tag, bytes))
    }

    /// An empty guard to grow later.
    pub fn empty_guard(&self, tag: &'static str) -> BudgetGuardImpl {
        BudgetGuardImpl {
            inner: Arc::clone(&self.inner),
            bytes: 0,
            tag,
        }
    }
}

impl std::fmt::Debug for MemoryBudgetImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBudgetImpl")
            .field("capacity", &self.inner.capacity)
            .field("used", &self.inner.used.load(Ordering::Relaxed))
            .finish()
    }
}

/// RAII guard that accounts for a number of bytes.
/// Dropping it returns bytes to the budget.
pub struct BudgetGuardImpl {
    inner: Arc<BudgetInner>,
    bytes: usize,
    tag: &'static str,
}

impl Drop for BudgetGuardImpl {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.inner.release(self.bytes);
            // NOTE: do not log here to keep drop path fast.
            self.bytes = 0;
        }
    }
}

impl BudgetGuard for BudgetGuardImpl {
    fn bytes(&self) -> usize {
        self.bytes
    }
    fn tag(&self) -> &'static str {
        self.tag
    }
}

impl BudgetGuardImpl {
    /// Try to resize this guard to a new byte count.
    /// Returns true if successful, false if the new size would exceed capacity.
    /// If new_bytes < current bytes, the guard is always shrunk successfully.
    pub fn try_resize(&mut self, new_bytes: usize) -> bool {
        if new_bytes == self.bytes {
            return true;
        }

        if new_bytes < self.bytes {
            let delta = self.bytes - new_bytes;
            self.inner.release(delta);
            self.bytes = new_bytes;
            true
        } else {
            let delta = new_bytes - self.bytes;
            if self.inner.try_acquire(delta) {
                self.bytes = new_bytes;
                true
            } else {
                false
            }
        }
    }

    /// Account `extra` more bytes, failing with [`Error::BudgetExceeded`].
    pub fn grow(&mut self, extra: usize) -> Result<()> {
        if self.try_resize(self.bytes.saturating_add(extra)) {
            Ok(())
        } else {
            Err(self.inner.exceeded(self.tag, extra))
        }
    }

    /// Return every accounted byte to the budget, keeping the guard usable.
    pub fn reset(&mut self) {
        self.try_resize(0);
    }
}

impl MemoryBudget for MemoryBudgetImpl {
    type Guard = BudgetGuardImpl;

    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard> {
        if bytes == 0 {
            return Some(self.empty_guard(tag));
        }
        if self.inner.try_acquire(bytes) {
            Some(BudgetGuardImpl {
                inner: Arc::clone(&self.inner),
                bytes,
                tag,
            })
        } else {
            None
        }
    }

    fn capacity_bytes(&self) -> usize {
        self.inner.capacity
    }

    fn used_bytes(&self) -> usize {
        self.inner.used.load(Ordering::Relaxed)
    }
}
