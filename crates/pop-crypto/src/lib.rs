//! # pop-crypto — Merkle and Commitment Engine
//!
//! - **Leaf** (`leaf.rs`): domain-separated SHA-256 leaf and node hashes.
//! - **Merkle** (`merkle.rs`): fixed-fanout arena tree built level by level
//!   on a rayon pool, with inclusion proofs and their verification.
//! - **Accumulator** (`accumulator.rs`): streaming root computation that
//!   keeps only the open frontier.
//! - **Commitment** (`commitment.rs`): HMAC-SHA256 per-field keys and
//!   commitments for selective disclosure.
//!
//! ## Crate Policy
//!
//! - Depends only on `pop-core` internally.
//! - Tree shape depends only on leaf count and fanout; the root is the same
//!   for every worker count.
//! - Key material is zeroized on drop and never printed.

pub mod accumulator;
pub mod commitment;
pub mod error;
pub mod leaf;
pub mod merkle;

pub use accumulator::MerkleAccumulator;
pub use commitment::{verify_commitment, Commitment, CommitmentKey, FieldKey, COMMIT_DOMAIN};
pub use error::CryptoError;
pub use leaf::{empty_root, leaf_hash, node_hash, LEAF_ALGORITHM};
pub use merkle::{verify_inclusion, InclusionProof, MerkleOptions, MerkleTree, ProofStep, DEFAULT_FANOUT, MAX_FANOUT};
