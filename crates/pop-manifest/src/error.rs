//! # Manifest Error Types
//!
//! - [`ManifestError`]: building a manifest failed.
//! - [`VerificationFailure`]: one named verification check did not hold.
//! - [`DisclosureError`]: a disclosure target is invalid.
//!
//! None of these carry key material or field key bytes.

use thiserror::Error;

use pop_core::{CanonicalizationError, ContentDigest};
use pop_crypto::CryptoError;
use pop_decode::DecodeError;
use pop_schema::SchemaError;

use crate::config::ConfigError;

/// Errors while assembling a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The copybook failed to compile.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A record failed to decode in strict mode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Merkle or commitment failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The manifest or a record could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A field selected for commitment does not exist in the layout.
    #[error("commit field {0:?} does not name an elementary field")]
    UnknownCommitField(String),

    /// A field selected for commitment is never emitted under the decode
    /// options (a REDEFINES alternate under `redefines: first`, or FILLER
    /// with `include_filler: false`).
    #[error("commit field {0:?} is never decoded under the configured options")]
    UnemittedCommitField(String),

    /// A commitment was requested without a master key.
    #[error("commit fields are configured but no commitment key was supplied")]
    MissingCommitmentKey,

    /// A running metric could not be updated.
    #[error("metric {path}: {reason}")]
    Metric {
        /// Subscript-free field path.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A verification check that did not hold.
///
/// Variants are listed in the order the checks run.
#[derive(Error, Debug)]
pub enum VerificationFailure {
    /// Manifest format version is not supported.
    #[error("unsupported manifest version {found:?}")]
    Version {
        /// Version string in the manifest.
        found: String,
    },

    /// A hash or tree parameter is not supported.
    #[error("unsupported {parameter}: {found}")]
    Algorithm {
        /// Manifest field name.
        parameter: &'static str,
        /// Value in the manifest.
        found: String,
    },

    /// The supplied copybook does not compile.
    #[error("copybook does not compile: {0}")]
    Schema(#[from] SchemaError),

    /// The copybook compiles to a different layout.
    #[error("schema fingerprint mismatch: manifest {expected}, copybook {actual}")]
    SchemaFingerprint {
        /// Fingerprint in the manifest.
        expected: ContentDigest,
        /// Fingerprint of the supplied copybook.
        actual: ContentDigest,
    },

    /// Record length differs from the manifest.
    #[error("record length mismatch: manifest {expected}, layout {actual}")]
    RecordLength {
        /// Length in the manifest.
        expected: usize,
        /// Length of the compiled layout.
        actual: usize,
    },

    /// A record failed to decode under a strict-mode manifest.
    #[error("decode failed: {0}")]
    Decode(DecodeError),

    /// A decoded record could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The set of rejected records differs.
    #[error("rejected records mismatch: manifest {expected:?}, data {actual:?}")]
    RejectedRecords {
        /// Indices in the manifest.
        expected: Vec<u64>,
        /// Indices observed while decoding.
        actual: Vec<u64>,
    },

    /// The number of decoded records differs.
    #[error("record count mismatch: manifest {expected}, data {actual}")]
    RecordCount {
        /// Count in the manifest.
        expected: u64,
        /// Count observed while decoding.
        actual: u64,
    },

    /// An aggregate metric differs.
    #[error("metrics mismatch at {path}")]
    Metrics {
        /// First differing subscript-free field path.
        path: String,
    },

    /// The recomputed Merkle root differs.
    #[error("merkle root mismatch: manifest {expected}, data {actual}")]
    MerkleRoot {
        /// Root in the manifest.
        expected: ContentDigest,
        /// Recomputed root.
        actual: ContentDigest,
    },
}

impl VerificationFailure {
    /// Short name of the failed check.
    pub fn check(&self) -> &'static str {
        match self {
            Self::Version { .. } => "version",
            Self::Algorithm { .. } => "algorithm",
            Self::Schema(_) | Self::SchemaFingerprint { .. } => "schema_fingerprint",
            Self::RecordLength { .. } => "record_length",
            Self::Decode(_) | Self::Canonicalization(_) => "decode",
            Self::RejectedRecords { .. } => "rejected_records",
            Self::RecordCount { .. } => "record_count",
            Self::Metrics { .. } => "metrics",
            Self::MerkleRoot { .. } => "merkle_root",
        }
    }
}

/// Errors while disclosing or checking a disclosure.
#[derive(Error, Debug)]
pub enum DisclosureError {
    /// The layout does not match the manifest.
    #[error("layout fingerprint {actual} does not match manifest {expected}")]
    SchemaMismatch {
        /// Fingerprint in the manifest.
        expected: ContentDigest,
        /// Fingerprint of the supplied layout.
        actual: ContentDigest,
    },

    /// No record with this index was covered by the manifest.
    #[error("record {index} out of range ({records} records)")]
    RecordOutOfRange {
        /// Requested index.
        index: u64,
        /// Records covered by the manifest, rejected included.
        records: u64,
    },

    /// The record was rejected when the manifest was built.
    #[error("record {0} was rejected and has no commitments")]
    RejectedRecord(u64),

    /// The path does not name an elementary field of the layout.
    #[error("record {record_index}: unknown field {field_path:?}")]
    UnknownField {
        /// Requested record.
        record_index: u64,
        /// Requested path.
        field_path: String,
    },

    /// The field exists in the layout but not in this record (an inactive
    /// OCCURS DEPENDING ON occurrence, or an unselected REDEFINES alternate).
    #[error("record {record_index}: field {field_path:?} not present")]
    FieldNotPresent {
        /// Requested record.
        record_index: u64,
        /// Requested path.
        field_path: String,
    },

    /// The manifest holds no commitment for this field.
    #[error("record {record_index}: field {field_path:?} was not committed")]
    NotCommitted {
        /// Requested record.
        record_index: u64,
        /// Requested path.
        field_path: String,
    },

    /// The value and field key do not open the published commitment.
    #[error("record {record_index}: commitment for {field_path:?} does not match")]
    CommitmentMismatch {
        /// Record of the disclosure.
        record_index: u64,
        /// Path of the disclosure.
        field_path: String,
    },

    /// The data source does not reproduce the manifest's tree.
    #[error("data source root {actual} does not match manifest {expected}")]
    RootMismatch {
        /// Root in the manifest.
        expected: ContentDigest,
        /// Root rebuilt from the data source.
        actual: ContentDigest,
    },

    /// The record read for disclosure hashes to a different leaf.
    #[error("record {0} does not match its leaf in the tree")]
    LeafMismatch(u64),

    /// The inclusion proof does not place the record under the manifest root.
    #[error("record {0}: inclusion proof does not verify against the manifest root")]
    InclusionProof(u64),

    /// The record could not be decoded from the data source.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A decoded record could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The data source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Field key derivation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
