//! Tracing hooks for executions and node streams.
//!
//! Only `tracing` events are emitted; the binary decides where they go.

use compgraph_core::hash::Hash256;
use compgraph_core::id::NodeId;

pub fn execution_started(exec: &str, fingerprint: &Hash256, inputs: &[String]) {
    tracing::info!(exec, fingerprint = %fingerprint, ?inputs, "execution started");
}

pub fn execution_finished(exec: &str, rows: u64, peak_bytes: usize, spilled_segments: u64) {
    tracing::info!(exec, rows, peak_bytes, spilled_segments, "execution finished");
}

pub fn execution_failed(exec: &str, rows: u64, error: &dyn std::error::Error) {
    tracing::warn!(exec, rows, error = %error, "execution failed");
}

pub fn input_opened(name: &str, source: &str) {
    tracing::debug!(input = name, source, "input opened");
}

pub fn node_exhausted(node: NodeId, kind: &str, rows: u64) {
    tracing::debug!(node = node.get(), kind, rows, "node exhausted");
}
