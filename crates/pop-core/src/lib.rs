#![deny(missing_docs)]

//! # pop-core — Foundational Types for COBOL Proof-of-Parse
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies and uses `serde`, `serde_json`,
//! `serde_jcs`, `thiserror`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **[`CanonicalBytes`] is the sole path to hashing.** Canonical record
//!    bytes, commitment pre-images, schema fingerprints, and manifest digests
//!    all flow through `CanonicalBytes::new()`, which applies RFC 8785 (JCS)
//!    serialization after rejecting floats.
//!
//! 2. **No floating point in decoded values.** [`FieldValue`] carries
//!    integers and [`ScaledDecimal`] pairs `(scaled, scale)`; the true value
//!    of a decimal is `scaled / 10^scale`.
//!
//! 3. **Self-describing digests.** [`ContentDigest`] carries its algorithm
//!    tag and serializes as `sha256:<hex>`.
//!
//! 4. **Structured errors with `thiserror`.** No `Box<dyn Error>` and no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod value;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{from_hex, sha256_digest, sha256_raw, to_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValueError};
pub use value::{FieldValue, ScaledDecimal};
