//! # Record Inclusion Proofs
//!
//! A manifest publishes only the Merkle root. [`RecordProofs`] keeps the
//! materialized tree next to it so a record index can be turned into an
//! inclusion proof. Leaves exist only for accepted records, so every lookup
//! goes through [`Manifest::leaf_position`].
//!
//! The tree comes either from [`ManifestBuilder::finish_with_proofs`] at
//! build time or from [`RecordProofs::rebuild`], which re-decodes the data
//! source and checks that it reproduces the published root.
//!
//! [`ManifestBuilder::finish_with_proofs`]: crate::builder::ManifestBuilder::finish_with_proofs

use std::io::Read;

use pop_core::ContentDigest;
use pop_crypto::{leaf_hash, InclusionProof, MerkleOptions, MerkleTree};
use pop_decode::{decode, DecodeErrorKind, Mode};
use pop_schema::RecordLayout;

use crate::error::DisclosureError;
use crate::manifest::Manifest;

/// The tree behind a manifest root.
#[derive(Debug, Clone)]
pub struct RecordProofs {
    tree: MerkleTree,
    rejected: Vec<u64>,
}

impl RecordProofs {
    pub(crate) fn new(tree: MerkleTree, rejected: Vec<u64>) -> Self {
        Self { tree, rejected }
    }

    /// Re-decode `reader` with the manifest's options and rebuild its tree.
    ///
    /// Fails unless the rejected records and the root both match the
    /// manifest.
    pub fn rebuild<R: Read>(layout: &RecordLayout, manifest: &Manifest, reader: R) -> Result<Self, DisclosureError> {
        if layout.fingerprint() != manifest.schema_fingerprint {
            return Err(DisclosureError::SchemaMismatch {
                expected: manifest.schema_fingerprint,
                actual: layout.fingerprint(),
            });
        }
        let mut leaves = Vec::new();
        let mut rejected = Vec::new();
        for item in decode(layout, reader, manifest.decode.clone()) {
            match item {
                Ok(record) => leaves.push(leaf_hash(record.index, &record.canonical_bytes()?)),
                Err(err) if manifest.decode.mode == Mode::Strict || matches!(err.kind, DecodeErrorKind::Io(_)) => {
                    return Err(err.into())
                }
                Err(err) => rejected.push(err.record_index),
            }
        }

        let options = MerkleOptions {
            fanout: manifest.fanout as usize,
            ..MerkleOptions::default()
        };
        let proofs = Self::new(MerkleTree::build(leaves, &options)?, rejected);
        proofs.check(manifest)?;
        tracing::debug!(leaves = proofs.tree.leaf_count(), "record proofs rebuilt");
        Ok(proofs)
    }

    /// Check that this tree is the one behind `manifest`.
    pub fn check(&self, manifest: &Manifest) -> Result<(), DisclosureError> {
        let root = self.root();
        if root != manifest.merkle_root
            || self.rejected != manifest.rejected_records
            || self.tree.fanout() != manifest.fanout as usize
        {
            return Err(DisclosureError::RootMismatch {
                expected: manifest.merkle_root,
                actual: root,
            });
        }
        Ok(())
    }

    /// The tree root.
    pub fn root(&self) -> ContentDigest {
        self.tree.root()
    }

    /// Leaf position of a record, `None` for rejected or unknown records.
    pub fn leaf_position(&self, record_index: u64) -> Option<u64> {
        if self.rejected.binary_search(&record_index).is_ok() {
            return None;
        }
        let position = record_index - self.rejected.partition_point(|&r| r < record_index) as u64;
        (position < self.tree.leaf_count()).then_some(position)
    }

    /// The leaf hash of a record.
    pub fn leaf(&self, record_index: u64) -> Option<ContentDigest> {
        let position = self.leaf_position(record_index)?;
        self.tree.leaf(position).map(ContentDigest::sha256)
    }

    /// Inclusion proof of a record's leaf under the root.
    pub fn proof(&self, record_index: u64) -> Result<InclusionProof, DisclosureError> {
        if self.rejected.binary_search(&record_index).is_ok() {
            return Err(DisclosureError::RejectedRecord(record_index));
        }
        let position = self.leaf_position(record_index).ok_or(DisclosureError::RecordOutOfRange {
            index: record_index,
            records: self.tree.leaf_count() + self.rejected.len() as u64,
        })?;
        Ok(self.tree.proof(position)?)
    }
}
