//! # Anchoring Sinks
//!
//! An [`AnchorSink`] receives only a manifest's Merkle root and returns an
//! opaque receipt. Timestamping services, ledgers, and transparency logs
//! live behind this trait; the workspace knows nothing about their
//! protocols.
//!
//! [`MockAnchorSink`] issues deterministic sequential receipts for tests.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pop_core::ContentDigest;

/// Errors from an anchoring sink.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// The sink refused the root.
    #[error("anchor rejected by {sink_id}: {reason}")]
    Rejected {
        /// Sink identifier.
        sink_id: String,
        /// Reason given by the sink.
        reason: String,
    },

    /// The sink could not be reached.
    #[error("anchor sink unavailable: {0}")]
    Unavailable(String),
}

/// Proof that a sink accepted a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Identifier of the sink that issued the receipt.
    pub sink_id: String,
    /// The anchored Merkle root.
    pub root: ContentDigest,
    /// Sink-specific receipt data.
    pub receipt: String,
}

/// A destination for Merkle roots.
///
/// `anchor` returns `Ok` only once the sink has durably recorded the root.
pub trait AnchorSink {
    /// Anchor `root` and return the sink's receipt.
    fn anchor(&self, root: &ContentDigest) -> Result<AnchorReceipt, AnchorError>;

    /// Identifier of this sink.
    fn sink_id(&self) -> &str;
}

/// In-memory sink with deterministic receipts `mock-<seq>-<root prefix>`.
#[derive(Debug)]
pub struct MockAnchorSink {
    sink_id: String,
    next_sequence: AtomicU64,
}

impl MockAnchorSink {
    /// Create a mock sink.
    pub fn new(sink_id: impl Into<String>) -> Self {
        Self {
            sink_id: sink_id.into(),
            next_sequence: AtomicU64::new(1),
        }
    }
}

impl AnchorSink for MockAnchorSink {
    fn anchor(&self, root: &ContentDigest) -> Result<AnchorReceipt, AnchorError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let hex = root.to_hex();
        Ok(AnchorReceipt {
            sink_id: self.sink_id.clone(),
            root: *root,
            receipt: format!("mock-{sequence}-{}", hex.get(..16).unwrap_or(&hex)),
        })
    }

    fn sink_id(&self) -> &str {
        &self.sink_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_core::sha256_raw;

    fn root() -> ContentDigest {
        ContentDigest::sha256(sha256_raw(b"root"))
    }

    #[test]
    fn mock_receipts_are_sequential() {
        let sink = MockAnchorSink::new("mock-ledger");
        let first = sink.anchor(&root()).unwrap();
        let second = sink.anchor(&root()).unwrap();
        assert_eq!(first.sink_id, "mock-ledger");
        assert_eq!(first.root, root());
        assert!(first.receipt.starts_with("mock-1-"));
        assert!(second.receipt.starts_with("mock-2-"));
        assert!(first.receipt.ends_with(&root().to_hex()[..16]));
    }

    #[test]
    fn receipt_serialization() {
        let receipt = MockAnchorSink::new("m").anchor(&root()).unwrap();
        let json = serde_json::to_string(&receipt).unwrap();
        let back: AnchorReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, receipt);
    }

    struct Refusing;

    impl AnchorSink for Refusing {
        fn anchor(&self, _root: &ContentDigest) -> Result<AnchorReceipt, AnchorError> {
            Err(AnchorError::Rejected {
                sink_id: self.sink_id().to_string(),
                reason: "closed".into(),
            })
        }

        fn sink_id(&self) -> &str {
            "refusing"
        }
    }

    #[test]
    fn sink_errors_propagate() {
        let err = Refusing.anchor(&root()).unwrap_err();
        assert_eq!(err.to_string(), "anchor rejected by refusing: closed");
    }
}
