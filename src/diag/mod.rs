//! Diagnostics sink for raw wire captures.
//!
//! # Responsibilities
//! - Receive labeled byte buffers observed on the transport read path
//! - Keep capture records strictly ordered per connection
//!
//! Textual trace events go straight through the `tracing` macros; only the
//! binary capture channel needs an abstraction, so different deployments
//! (log output, in-memory inspection in tests) can swap the destination.

use std::sync::Mutex;

/// Destination for raw byte captures.
///
/// Fire-and-forget: implementations must not fail and must not block the
/// read path beyond recording the bytes.
pub trait DiagnosticsSink: Send + Sync {
    /// Record `bytes` under `label`. A zero-length capture marks
    /// end-of-stream on the labeled channel.
    fn emit_binary(&self, label: &str, bytes: &[u8]);
}

/// Production sink: hex-encodes each capture into a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit_binary(&self, label: &str, bytes: &[u8]) {
        tracing::trace!(
            label,
            len = bytes.len(),
            data = %hex::encode(bytes),
            "wire capture"
        );
    }
}

/// In-memory sink recording every capture in arrival order.
///
/// Used by the integration tests and by deployments that post-process the
/// capture stream instead of logging it.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records captured so far, in order.
    pub fn records(&self) -> Vec<(String, Vec<u8>)> {
        self.records.lock().expect("sink lock poisoned").clone()
    }

    /// Concatenation of all bytes captured under `label`, in order.
    pub fn bytes_for(&self, label: &str) -> Vec<u8> {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .filter(|(l, _)| l == label)
            .flat_map(|(_, b)| b.iter().copied())
            .collect()
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit_binary(&self, label: &str, bytes: &[u8]) {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push((label.to_string(), bytes.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_preserves_order() {
        let sink = MemorySink::new();
        sink.emit_binary("rx", b"ab");
        sink.emit_binary("rx", b"cd");
        sink.emit_binary("other", b"zz");
        sink.emit_binary("rx", b"");

        assert_eq!(sink.bytes_for("rx"), b"abcd");
        assert_eq!(sink.records().len(), 4);
        assert_eq!(sink.records()[3], ("rx".to_string(), Vec::new()));
    }
}
