//! Error type for the Merkle and commitment engines.

use thiserror::Error;

use pop_core::CanonicalizationError;

/// Errors from tree construction, proof generation, and commitments.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Fanout outside `2..=256`.
    #[error("invalid fanout {0}: must be between 2 and 256")]
    InvalidFanout(usize),

    /// The worker thread pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// A proof was requested for a leaf the tree does not contain.
    #[error("leaf {index} out of range for tree of {leaf_count} leaves")]
    LeafOutOfRange {
        /// Requested leaf position.
        index: u64,
        /// Leaves in the tree.
        leaf_count: u64,
    },

    /// Key material of the wrong length.
    #[error("invalid key length {0}: expected 32 bytes")]
    InvalidKeyLength(usize),

    /// A field path longer than a `u32` length prefix allows.
    #[error("field path of {0} bytes is too long")]
    PathTooLong(usize),

    /// A value could not be canonicalized for hashing.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
