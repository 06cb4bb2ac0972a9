//! # pop-manifest — Proof-of-Parse Manifest Engine
//!
//! Ties the schema compiler, decoder, and Merkle engine together into a
//! verifiable claim about a set of COBOL records:
//!
//! - **Builder** (`builder.rs`): the per-run accumulator that hashes
//!   leaves, folds metrics, and computes commitments while records stream
//!   past.
//!
//! - **Manifest** (`manifest.rs`): the immutable, canonically serialized
//!   claim. Its digest is what an anchoring sink records.
//!
//! - **Metrics** (`metrics.rs`): count, sum, min, and max per numeric field
//!   path, in exact scaled decimals.
//!
//! - **Verify** (`verify.rs`): re-runs the pipeline and checks every claim
//!   in a fixed order.
//!
//! - **Proofs** (`proofs.rs`): the tree behind a manifest root, mapping
//!   record indices to leaf positions and inclusion proofs.
//!
//! - **Disclose** (`disclose.rs`): opens commitments of chosen fields from
//!   a seekable data source with an inclusion proof for each record, and
//!   checks disclosures against a manifest.
//!
//! - **Anchor** (`anchor.rs`): the sink trait for publishing roots, and a
//!   deterministic mock.
//!
//! - **Config** (`config.rs`, `pipeline.rs`): YAML pipeline configuration and
//!   the compile, decode, build entry points.
//!
//! ## Crate Policy
//!
//! - No global state. Every run owns its builder, stream, and thread pool.
//! - The master key is passed by reference and never configured, logged, or
//!   serialized.

pub mod anchor;
pub mod builder;
pub mod config;
pub mod disclose;
pub mod error;
pub mod manifest;
pub mod metrics;
pub mod pipeline;
pub mod proofs;
pub mod verify;

pub use anchor::{AnchorError, AnchorReceipt, AnchorSink, MockAnchorSink};
pub use builder::{CryptoOptions, ManifestBuilder};
pub use config::{ConfigError, PipelineConfig};
pub use disclose::{disclose, verify_disclosure, Disclosure, DisclosureContext};
pub use error::{DisclosureError, ManifestError, VerificationFailure};
pub use manifest::{Manifest, HASH_ALGORITHM, MANIFEST_VERSION};
pub use metrics::{FieldMetrics, Metrics, MetricsAccumulator};
pub use pipeline::{build_manifest, run};
pub use proofs::RecordProofs;
pub use verify::{verify, VerificationReport};

pub use pop_decode::decode;
pub use pop_schema::compile_schema;
