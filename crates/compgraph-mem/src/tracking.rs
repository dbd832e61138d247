//! Lightweight peak tracking for budget usage.
//!
//! Feeds the `peak_buffered_bytes` field of run manifests.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct PeakTracker {
    peak_bytes: AtomicUsize,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self {
            peak_bytes: AtomicUsize::new(0),
        }
    }

    /// Record a new "used bytes" value; updates peak if higher.
    pub fn record_used(&self, used_bytes: usize) {
        let mut cur = self.peak_bytes.load(Ordering::Relaxed);
        while used_bytes > cur {
            match self.peak_bytes.compare_exchange(
                cur,
                used_bytes,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(used_bytes, "new buffered-bytes peak");
                    break;
                }
                Err(observed) => cur = observed,
            }
        }
    }

    pub fn peak(&self) -> usize {
        self.peak_bytes.load(Ordering::Relaxed)
    }
}
