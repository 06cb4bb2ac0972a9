//! # Manifest Verification
//!
//! [`verify`] re-runs the pipeline over a supplied copybook and byte stream
//! and checks the manifest claim by claim, in this order:
//!
//! 1. manifest version, hash algorithm, leaf algorithm, fanout
//! 2. schema fingerprint
//! 3. record length
//! 4. decode (any failure under a strict-mode manifest)
//! 5. rejected record set
//! 6. record count
//! 7. metrics
//! 8. Merkle root
//!
//! The first failing check is returned. The root is recomputed with the
//! streaming accumulator, so no leaf is retained. Commitments cannot be
//! checked without the master key and are verified per disclosure instead.

use std::io::Read;

use serde::Serialize;

use pop_core::ContentDigest;
use pop_crypto::{leaf_hash, MerkleAccumulator, LEAF_ALGORITHM};
use pop_decode::{decode, DecodeErrorKind, Mode};
use pop_schema::{compile_schema, SchemaOptions};

use crate::error::{ManifestError, VerificationFailure};
use crate::manifest::{Manifest, HASH_ALGORITHM, MANIFEST_VERSION};
use crate::metrics::MetricsAccumulator;

/// Summary of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Records decoded and hashed.
    pub record_count: u64,
    /// Records rejected in lenient mode.
    pub rejected_records: usize,
    /// The confirmed root.
    pub merkle_root: ContentDigest,
    /// SHA-256 of the manifest's canonical bytes.
    pub manifest_digest: Option<ContentDigest>,
}

/// Verify `manifest` against a copybook and the data it claims to cover.
pub fn verify<R: Read>(
    manifest: &Manifest,
    copybook: &str,
    reader: R,
    schema_options: &SchemaOptions,
) -> Result<VerificationReport, VerificationFailure> {
    let result = run_checks(manifest, copybook, reader, schema_options);
    match &result {
        Ok(report) => tracing::info!(records = report.record_count, root = %report.merkle_root, "manifest verified"),
        Err(failure) => tracing::warn!(check = failure.check(), error = %failure, "manifest verification failed"),
    }
    result
}

fn run_checks<R: Read>(
    manifest: &Manifest,
    copybook: &str,
    reader: R,
    schema_options: &SchemaOptions,
) -> Result<VerificationReport, VerificationFailure> {
    if manifest.version != MANIFEST_VERSION {
        return Err(VerificationFailure::Version {
            found: manifest.version.clone(),
        });
    }
    if manifest.hash_algorithm != HASH_ALGORITHM {
        return Err(VerificationFailure::Algorithm {
            parameter: "hash_algorithm",
            found: manifest.hash_algorithm.clone(),
        });
    }
    if manifest.leaf_algorithm != LEAF_ALGORITHM {
        return Err(VerificationFailure::Algorithm {
            parameter: "leaf_algorithm",
            found: manifest.leaf_algorithm.clone(),
        });
    }
    let mut accumulator =
        MerkleAccumulator::new(manifest.fanout as usize).map_err(|_| VerificationFailure::Algorithm {
            parameter: "fanout",
            found: manifest.fanout.to_string(),
        })?;

    let layout = compile_schema(copybook, schema_options)?;
    if layout.fingerprint() != manifest.schema_fingerprint {
        return Err(VerificationFailure::SchemaFingerprint {
            expected: manifest.schema_fingerprint,
            actual: layout.fingerprint(),
        });
    }
    if layout.length != manifest.record_length {
        return Err(VerificationFailure::RecordLength {
            expected: manifest.record_length,
            actual: layout.length,
        });
    }

    let mut metrics = MetricsAccumulator::new();
    let mut rejected = Vec::new();
    let mut record_count = 0u64;
    for item in decode(&layout, reader, manifest.decode.clone()) {
        match item {
            Ok(record) => {
                let bytes = record.canonical_bytes()?;
                metrics.observe(&record).map_err(|e| VerificationFailure::Metrics {
                    path: match e {
                        ManifestError::Metric { path, .. } => path,
                        other => other.to_string(),
                    },
                })?;
                accumulator.push(leaf_hash(record.index, &bytes));
                record_count += 1;
            }
            Err(err) if manifest.decode.mode == Mode::Strict || matches!(err.kind, DecodeErrorKind::Io(_)) => {
                return Err(VerificationFailure::Decode(err))
            }
            Err(err) => rejected.push(err.record_index),
        }
    }

    if rejected != manifest.rejected_records {
        return Err(VerificationFailure::RejectedRecords {
            expected: manifest.rejected_records.clone(),
            actual: rejected,
        });
    }
    if record_count != manifest.record_count {
        return Err(VerificationFailure::RecordCount {
            expected: manifest.record_count,
            actual: record_count,
        });
    }
    let metrics = metrics.finish();
    if metrics != manifest.metrics {
        let path = metrics
            .keys()
            .chain(manifest.metrics.keys())
            .find(|k| metrics.get(*k) != manifest.metrics.get(*k))
            .cloned()
            .unwrap_or_default();
        return Err(VerificationFailure::Metrics { path });
    }
    let root = accumulator.finalize();
    if root != manifest.merkle_root {
        return Err(VerificationFailure::MerkleRoot {
            expected: manifest.merkle_root,
            actual: root,
        });
    }

    Ok(VerificationReport {
        record_count,
        rejected_records: rejected.len(),
        merkle_root: root,
        manifest_digest: manifest.digest().ok(),
    })
}
