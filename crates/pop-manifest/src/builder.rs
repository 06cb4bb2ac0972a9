//! # Manifest Builder
//!
//! [`ManifestBuilder`] is the accumulator a run threads through its decode
//! loop. For each decoded record it hashes the leaf, folds the metrics, and
//! computes the selected commitments; the record itself is dropped
//! afterwards. Only 32-byte leaf hashes are retained until
//! [`finish`](ManifestBuilder::finish) builds the tree;
//! [`finish_with_proofs`](ManifestBuilder::finish_with_proofs) also hands
//! the tree back for inclusion proofs.
//!
//! Rejected records are recorded by index in lenient mode. In strict mode
//! the first rejection fails the build.

use serde::{Deserialize, Serialize};

use pop_crypto::{leaf_hash, Commitment, CommitmentKey, MerkleOptions, MerkleTree, LEAF_ALGORITHM};
use pop_decode::{CanonicalRecord, DecodeError, DecodeErrorKind, DecodeOptions, Mode, RedefinesPolicy};
use pop_schema::{base_path, DataKind, FieldSpec, RecordLayout};

use crate::error::ManifestError;
use crate::manifest::{Manifest, HASH_ALGORITHM, MANIFEST_VERSION};
use crate::metrics::MetricsAccumulator;
use crate::proofs::RecordProofs;

/// Tree and commitment options of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CryptoOptions {
    /// Merkle fanout and worker count.
    pub merkle: MerkleOptions,
    /// Field paths to commit to. A path without subscripts selects every
    /// occurrence.
    pub commit_fields: Vec<String>,
}

/// Accumulates one manifest.
pub struct ManifestBuilder<'a> {
    layout: &'a RecordLayout,
    decode: DecodeOptions,
    merkle: MerkleOptions,
    commit_fields: Vec<String>,
    key: Option<&'a CommitmentKey>,
    leaves: Vec<[u8; 32]>,
    rejected: Vec<u64>,
    metrics: MetricsAccumulator,
    commitments: Vec<Commitment>,
}

impl std::fmt::Debug for ManifestBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestBuilder")
            .field("record_name", &self.layout.record_name)
            .field("records", &self.leaves.len())
            .field("rejected", &self.rejected.len())
            .field("commitments", &self.commitments.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ManifestBuilder<'a> {
    /// Start a manifest for records decoded from `layout` with `decode`.
    pub fn new(
        layout: &'a RecordLayout,
        decode: DecodeOptions,
        crypto: &CryptoOptions,
        key: Option<&'a CommitmentKey>,
    ) -> Result<Self, ManifestError> {
        crypto.merkle.validate()?;
        for field in &crypto.commit_fields {
            let specs: Vec<&FieldSpec> = match layout.field(field) {
                Some(spec) => vec![spec],
                None => layout.fields_with_base_path(field).collect(),
            };
            if specs.is_empty() {
                return Err(ManifestError::UnknownCommitField(field.clone()));
            }
            if !specs.iter().any(|spec| is_emitted(spec, &decode)) {
                return Err(ManifestError::UnemittedCommitField(field.clone()));
            }
        }
        if !crypto.commit_fields.is_empty() && key.is_none() {
            return Err(ManifestError::MissingCommitmentKey);
        }
        Ok(Self {
            layout,
            decode,
            merkle: crypto.merkle,
            commit_fields: crypto.commit_fields.clone(),
            key,
            leaves: Vec::new(),
            rejected: Vec::new(),
            metrics: MetricsAccumulator::new(),
            commitments: Vec::new(),
        })
    }

    /// Add one item of a decode stream.
    pub fn push(&mut self, item: Result<CanonicalRecord, DecodeError>) -> Result<(), ManifestError> {
        match item {
            Ok(record) => self.add_record(&record),
            Err(err) => self.reject(err),
        }
    }

    /// Hash, measure, and commit to one decoded record.
    pub fn add_record(&mut self, record: &CanonicalRecord) -> Result<(), ManifestError> {
        let bytes = record.canonical_bytes()?;
        self.metrics.observe(record)?;
        if let Some(key) = self.key {
            let mut outcome = Ok(());
            let commit_fields = &self.commit_fields;
            let commitments = &mut self.commitments;
            record.for_each_leaf(|path, value| {
                if outcome.is_err() || !is_selected(commit_fields, path) {
                    return;
                }
                outcome = Commitment::create(key, record.index, path, value).map(|c| commitments.push(c));
            });
            outcome?;
        }
        self.leaves.push(leaf_hash(record.index, &bytes));
        Ok(())
    }

    /// Record a decode failure. Read errors always fail the build.
    pub fn reject(&mut self, err: DecodeError) -> Result<(), ManifestError> {
        if self.decode.mode == Mode::Strict || matches!(err.kind, DecodeErrorKind::Io(_)) {
            return Err(ManifestError::Decode(err));
        }
        self.rejected.push(err.record_index);
        Ok(())
    }

    /// Build the tree and seal the manifest.
    pub fn finish(self) -> Result<Manifest, ManifestError> {
        self.finish_with_proofs().map(|(manifest, _)| manifest)
    }

    /// Seal the manifest and keep the tree for inclusion proofs.
    pub fn finish_with_proofs(self) -> Result<(Manifest, RecordProofs), ManifestError> {
        let record_count = self.leaves.len() as u64;
        let tree = MerkleTree::build(self.leaves, &self.merkle)?;
        let manifest = Manifest {
            version: MANIFEST_VERSION.to_string(),
            schema_fingerprint: self.layout.fingerprint(),
            record_length: self.layout.length,
            hash_algorithm: HASH_ALGORITHM.to_string(),
            leaf_algorithm: LEAF_ALGORITHM.to_string(),
            fanout: self.merkle.fanout as u32,
            merkle_root: tree.root(),
            record_count,
            rejected_records: self.rejected.clone(),
            decode: self.decode,
            metrics: self.metrics.finish(),
            commitments: self.commitments,
        };
        tracing::info!(
            records = manifest.record_count,
            rejected = manifest.rejected_records.len(),
            commitments = manifest.commitments.len(),
            root = %manifest.merkle_root,
            "manifest built"
        );
        Ok((manifest, RecordProofs::new(tree, self.rejected)))
    }
}

fn is_emitted(spec: &FieldSpec, decode: &DecodeOptions) -> bool {
    if spec.redefines.is_some() && decode.redefines == RedefinesPolicy::First {
        return false;
    }
    spec.field.kind != DataKind::Filler || decode.include_filler
}

fn is_selected(commit_fields: &[String], path: &str) -> bool {
    let base = base_path(path);
    commit_fields.iter().any(|f| f == path || *f == base)
}
