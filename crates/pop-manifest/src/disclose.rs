//! # Selective Disclosure
//!
//! A [`DisclosureContext`] holds what the data owner needs to open
//! commitments: the layout, the master key, the manifest, the record tree,
//! and a seekable source of the original bytes. A requested record is
//! located at `index * record_length`, decoded with the manifest's decode
//! options, matched against its leaf, and each requested field is revealed
//! with its field key and the record's inclusion proof.
//!
//! [`verify_disclosure`] is the recipient's side: it checks the inclusion
//! proof against the manifest root, then recomputes the HMAC and checks it
//! against the published commitment.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use serde::{Deserialize, Serialize};

use pop_core::{ContentDigest, FieldValue};
use pop_crypto::{leaf_hash, verify_commitment, verify_inclusion, CommitmentKey, FieldKey, InclusionProof};
use pop_decode::decode_record;
use pop_schema::RecordLayout;

use crate::error::DisclosureError;
use crate::manifest::Manifest;
use crate::proofs::RecordProofs;

/// One revealed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Disclosure {
    /// Index of the record.
    pub record_index: u64,
    /// Subscripted field path.
    pub field_path: String,
    /// The decoded value.
    pub value: FieldValue,
    /// The key that opens this field's commitment.
    pub field_key: FieldKey,
    /// Leaf hash of the whole record.
    pub record_leaf: ContentDigest,
    /// Path from the record's leaf to the manifest root.
    pub inclusion: InclusionProof,
}

/// Everything needed to disclose fields of a manifest's records.
pub struct DisclosureContext<R> {
    layout: RecordLayout,
    manifest: Manifest,
    proofs: RecordProofs,
    key: CommitmentKey,
    source: R,
    buffer: Vec<u8>,
}

impl<R> std::fmt::Debug for DisclosureContext<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisclosureContext")
            .field("record_name", &self.layout.record_name)
            .field("merkle_root", &self.manifest.merkle_root)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<R: Read + Seek> DisclosureContext<R> {
    /// Create a context. The layout must be the one the manifest was built
    /// from.
    ///
    /// The whole source is decoded once to rebuild the record tree, which
    /// must reproduce the manifest root.
    pub fn new(layout: RecordLayout, manifest: Manifest, key: CommitmentKey, mut source: R) -> Result<Self, DisclosureError> {
        source.seek(SeekFrom::Start(0))?;
        let proofs = RecordProofs::rebuild(&layout, &manifest, &mut source)?;
        Self::with_proofs(layout, manifest, proofs, key, source)
    }

    /// Create a context from the tree kept at build time.
    pub fn with_proofs(
        layout: RecordLayout,
        manifest: Manifest,
        proofs: RecordProofs,
        key: CommitmentKey,
        source: R,
    ) -> Result<Self, DisclosureError> {
        if layout.fingerprint() != manifest.schema_fingerprint {
            return Err(DisclosureError::SchemaMismatch {
                expected: manifest.schema_fingerprint,
                actual: layout.fingerprint(),
            });
        }
        proofs.check(&manifest)?;
        let buffer = vec![0u8; layout.length];
        Ok(Self {
            layout,
            manifest,
            proofs,
            key,
            source,
            buffer,
        })
    }

    /// The manifest disclosures are made against.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Reveal `field_paths` of every record in `record_indices`.
    ///
    /// Disclosures are returned record by record, in request order. Any
    /// invalid target fails the whole request.
    pub fn disclose(&mut self, record_indices: &[u64], field_paths: &[&str]) -> Result<Vec<Disclosure>, DisclosureError> {
        let mut out = Vec::with_capacity(record_indices.len() * field_paths.len());
        for &index in record_indices {
            self.check_record(index)?;
            for path in field_paths {
                if self.layout.field(path).is_none() {
                    return Err(DisclosureError::UnknownField {
                        record_index: index,
                        field_path: path.to_string(),
                    });
                }
            }

            self.read_record(index)?;
            let record = decode_record(&self.layout, &self.buffer, index, &self.manifest.decode)?;
            let record_leaf = ContentDigest::sha256(leaf_hash(index, &record.canonical_bytes()?));
            if self.proofs.leaf(index) != Some(record_leaf) {
                return Err(DisclosureError::LeafMismatch(index));
            }
            let inclusion = self.proofs.proof(index)?;
            for path in field_paths {
                let value = record.get(path).ok_or_else(|| DisclosureError::FieldNotPresent {
                    record_index: index,
                    field_path: path.to_string(),
                })?;
                let commitment = self
                    .manifest
                    .commitment(index, path)
                    .ok_or_else(|| DisclosureError::NotCommitted {
                        record_index: index,
                        field_path: path.to_string(),
                    })?;
                let field_key = self.key.field_key(index, path)?;
                if !verify_commitment(&field_key, value, commitment) {
                    return Err(DisclosureError::CommitmentMismatch {
                        record_index: index,
                        field_path: path.to_string(),
                    });
                }
                out.push(Disclosure {
                    record_index: index,
                    field_path: path.to_string(),
                    value: value.clone(),
                    field_key,
                    record_leaf,
                    inclusion: inclusion.clone(),
                });
            }
        }
        tracing::debug!(records = record_indices.len(), disclosures = out.len(), "fields disclosed");
        Ok(out)
    }

    fn check_record(&self, index: u64) -> Result<(), DisclosureError> {
        let records = self.manifest.total_records();
        if index >= records {
            return Err(DisclosureError::RecordOutOfRange { index, records });
        }
        if self.manifest.is_rejected(index) {
            return Err(DisclosureError::RejectedRecord(index));
        }
        Ok(())
    }

    fn read_record(&mut self, index: u64) -> Result<(), DisclosureError> {
        let offset = index
            .checked_mul(self.layout.length as u64)
            .ok_or_else(|| DisclosureError::RecordOutOfRange {
                index,
                records: self.manifest.total_records(),
            })?;
        self.source.seek(SeekFrom::Start(offset))?;
        match self.source.read_exact(&mut self.buffer) {
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(DisclosureError::RecordOutOfRange {
                index,
                records: self.manifest.total_records(),
            }),
            other => Ok(other?),
        }
    }
}

/// Reveal `field_paths` of `record_indices` through `context`.
pub fn disclose<R: Read + Seek>(
    context: &mut DisclosureContext<R>,
    record_indices: &[u64],
    field_paths: &[&str],
) -> Result<Vec<Disclosure>, DisclosureError> {
    context.disclose(record_indices, field_paths)
}

/// Check a disclosure against the manifest's root and published commitment.
pub fn verify_disclosure(disclosure: &Disclosure, manifest: &Manifest) -> Result<(), DisclosureError> {
    let index = disclosure.record_index;
    let position = manifest.leaf_position(index).ok_or_else(|| {
        if manifest.is_rejected(index) {
            DisclosureError::RejectedRecord(index)
        } else {
            DisclosureError::RecordOutOfRange {
                index,
                records: manifest.total_records(),
            }
        }
    })?;
    let proof = &disclosure.inclusion;
    let placed =
        proof.leaf_index == position && proof.leaf_count == manifest.record_count && proof.fanout == manifest.fanout;
    if !placed || !verify_inclusion(&disclosure.record_leaf.bytes, proof, &manifest.merkle_root) {
        return Err(DisclosureError::InclusionProof(index));
    }
    let commitment = manifest
        .commitment(disclosure.record_index, &disclosure.field_path)
        .ok_or_else(|| DisclosureError::NotCommitted {
            record_index: disclosure.record_index,
            field_path: disclosure.field_path.clone(),
        })?;
    if verify_commitment(&disclosure.field_key, &disclosure.value, commitment) {
        Ok(())
    } else {
        Err(DisclosureError::CommitmentMismatch {
            record_index: disclosure.record_index,
            field_path: disclosure.field_path.clone(),
        })
    }
}
