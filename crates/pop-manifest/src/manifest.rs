//! # Manifest
//!
//! The immutable result of a proof-of-parse run (format `pop-manifest/1`).
//! It binds the schema fingerprint, the decode options needed to reproduce
//! canonical bytes, the Merkle parameters and root, record counts,
//! aggregate metrics, and the optional selective-disclosure commitments.
//!
//! ## Wire Format
//!
//! The manifest is published as its JCS serialization through
//! [`CanonicalBytes`]. [`Manifest::digest`] is SHA-256 of those bytes and
//! is what an external anchor or signature should cover along with the
//! root.

use serde::{Deserialize, Serialize};

use pop_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest};
use pop_crypto::Commitment;
use pop_decode::DecodeOptions;

use crate::anchor::{AnchorError, AnchorReceipt, AnchorSink};
use crate::metrics::Metrics;

/// Manifest format identifier.
pub const MANIFEST_VERSION: &str = "pop-manifest/1";
/// Hash algorithm of leaves, nodes, and fingerprints.
pub const HASH_ALGORITHM: &str = "sha256";

/// A built manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Always [`MANIFEST_VERSION`].
    pub version: String,
    /// Fingerprint of the compiled layout.
    pub schema_fingerprint: ContentDigest,
    /// Fixed record length in bytes.
    pub record_length: usize,
    /// Always [`HASH_ALGORITHM`].
    pub hash_algorithm: String,
    /// Leaf construction, [`pop_crypto::LEAF_ALGORITHM`].
    pub leaf_algorithm: String,
    /// Merkle fanout.
    pub fanout: u32,
    /// Merkle root over the decoded records.
    pub merkle_root: ContentDigest,
    /// Records decoded and hashed into the tree.
    pub record_count: u64,
    /// Stream indices of records rejected in lenient mode.
    pub rejected_records: Vec<u64>,
    /// Decode options used to produce the canonical records.
    pub decode: DecodeOptions,
    /// Aggregates per numeric field.
    pub metrics: Metrics,
    /// Selective-disclosure commitments, in record then declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commitments: Vec<Commitment>,
}

impl Manifest {
    /// Canonical JCS bytes of the manifest.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// SHA-256 of the canonical bytes.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&self.canonical_bytes()?))
    }

    /// Parse a manifest from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Records the manifest covers, rejected ones included.
    pub fn total_records(&self) -> u64 {
        self.record_count + self.rejected_records.len() as u64
    }

    /// Whether the record at `index` was rejected.
    pub fn is_rejected(&self, index: u64) -> bool {
        self.rejected_records.binary_search(&index).is_ok()
    }

    /// Position of a record's leaf in the tree. Rejected records have no
    /// leaf, so later records shift down by the rejections before them.
    pub fn leaf_position(&self, record_index: u64) -> Option<u64> {
        if record_index >= self.total_records() || self.is_rejected(record_index) {
            return None;
        }
        let before = self.rejected_records.partition_point(|&r| r < record_index) as u64;
        Some(record_index - before)
    }

    /// The published commitment for one field of one record.
    pub fn commitment(&self, record_index: u64, field_path: &str) -> Option<&Commitment> {
        let start = self.commitments.partition_point(|c| c.record_index < record_index);
        self.commitments[start..]
            .iter()
            .take_while(|c| c.record_index == record_index)
            .find(|c| c.field_path == field_path)
    }

    /// Submit the Merkle root to an anchoring sink.
    pub fn anchor(&self, sink: &dyn AnchorSink) -> Result<AnchorReceipt, AnchorError> {
        let receipt = sink.anchor(&self.merkle_root)?;
        tracing::info!(sink = sink.sink_id(), root = %self.merkle_root, "manifest root anchored");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_core::sha256_raw;

    fn sample() -> Manifest {
        Manifest {
            version: MANIFEST_VERSION.to_string(),
            schema_fingerprint: ContentDigest::sha256(sha256_raw(b"layout")),
            record_length: 47,
            hash_algorithm: HASH_ALGORITHM.to_string(),
            leaf_algorithm: pop_crypto::LEAF_ALGORITHM.to_string(),
            fanout: 2,
            merkle_root: ContentDigest::sha256(sha256_raw(b"root")),
            record_count: 3,
            rejected_records: vec![1],
            decode: DecodeOptions::default(),
            metrics: Metrics::new(),
            commitments: vec![
                Commitment {
                    record_index: 0,
                    field_path: "A".into(),
                    digest: ContentDigest::sha256([1; 32]),
                },
                Commitment {
                    record_index: 2,
                    field_path: "A".into(),
                    digest: ContentDigest::sha256([2; 32]),
                },
                Commitment {
                    record_index: 2,
                    field_path: "B".into(),
                    digest: ContentDigest::sha256([3; 32]),
                },
            ],
        }
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let m = sample();
        assert_eq!(m.digest().unwrap(), m.clone().digest().unwrap());
        let mut changed = m.clone();
        changed.record_count = 4;
        assert_ne!(m.digest().unwrap(), changed.digest().unwrap());
    }

    #[test]
    fn json_round_trip_through_canonical_bytes() {
        let m = sample();
        let bytes = m.canonical_bytes().unwrap();
        let text = std::str::from_utf8(bytes.as_bytes()).unwrap();
        assert!(text.starts_with(r#"{"commitments":["#));
        assert_eq!(Manifest::from_json(text).unwrap(), m);
    }

    #[test]
    fn unknown_manifest_fields_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["extra"] = serde_json::json!(1);
        assert!(serde_json::from_value::<Manifest>(value).is_err());
    }

    #[test]
    fn commitment_lookup() {
        let m = sample();
        assert_eq!(m.commitment(2, "B").unwrap().digest.bytes, [3; 32]);
        assert!(m.commitment(1, "A").is_none());
        assert!(m.commitment(2, "C").is_none());
        assert_eq!(m.total_records(), 4);
        assert!(m.is_rejected(1));
        assert!(!m.is_rejected(2));
    }

    #[test]
    fn leaf_positions_skip_rejected_records() {
        let mut m = sample();
        let positions: Vec<_> = (0..5).map(|i| m.leaf_position(i)).collect();
        assert_eq!(positions, vec![Some(0), None, Some(1), Some(2), None]);

        m.record_count = 2;
        m.rejected_records = vec![0, 2];
        assert_eq!(m.leaf_position(1), Some(0));
        assert_eq!(m.leaf_position(3), Some(1));
    }
}
