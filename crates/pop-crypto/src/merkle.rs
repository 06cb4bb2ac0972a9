//! # Fixed-Fanout Merkle Tree
//!
//! The tree is an arena `levels[level][position]` of 32-byte hashes. Level 0
//! holds the leaves; each higher level groups the one below into runs of
//! `fanout` children, the final group holding whatever members remain. A
//! level with a single node is the root.
//!
//! Each level's groups are hashed in parallel on a rayon pool of `workers`
//! threads. The join at the end of a level is the only coordination point,
//! and the shape of the tree depends only on leaf count and fanout, so the
//! root is identical for every worker count.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use pop_core::ContentDigest;

use crate::error::CryptoError;
use crate::leaf::{empty_root, node_hash};

/// Default children per node.
pub const DEFAULT_FANOUT: usize = 2;
/// Largest supported fanout.
pub const MAX_FANOUT: usize = 256;

/// Tree shape and parallelism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MerkleOptions {
    /// Children per internal node, `2..=256`.
    pub fanout: usize,
    /// Hashing threads; 0 uses one per available core.
    pub workers: usize,
}

impl Default for MerkleOptions {
    fn default() -> Self {
        Self {
            fanout: DEFAULT_FANOUT,
            workers: 0,
        }
    }
}

impl MerkleOptions {
    /// Check the fanout bound.
    pub fn validate(&self) -> Result<(), CryptoError> {
        check_fanout(self.fanout)
    }
}

pub(crate) fn check_fanout(fanout: usize) -> Result<(), CryptoError> {
    if (2..=MAX_FANOUT).contains(&fanout) {
        Ok(())
    } else {
        Err(CryptoError::InvalidFanout(fanout))
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A fully materialized tree.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    fanout: usize,
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build the tree over `leaves` with the given options.
    pub fn build(leaves: Vec<[u8; 32]>, options: &MerkleOptions) -> Result<Self, CryptoError> {
        options.validate()?;
        let fanout = options.fanout;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()
            .map_err(|e| CryptoError::ThreadPool(e.to_string()))?;

        let leaf_count = leaves.len();
        let mut levels = vec![leaves];
        pool.install(|| {
            while let Some(level) = levels.last().filter(|level| level.len() > 1) {
                let next: Vec<[u8; 32]> = level.par_chunks(fanout).map(node_hash).collect();
                levels.push(next);
            }
        });

        tracing::debug!(
            leaves = leaf_count,
            levels = levels.len(),
            fanout,
            workers = pool.current_num_threads(),
            "merkle tree built"
        );
        Ok(Self { fanout, levels })
    }

    /// Children per internal node.
    pub fn fanout(&self) -> usize {
        self.fanout
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.levels.first().map_or(0, |level| level.len() as u64)
    }

    /// The tree root.
    pub fn root(&self) -> ContentDigest {
        let root = match self.levels.last() {
            Some(level) if level.len() == 1 => level[0],
            _ => empty_root(),
        };
        ContentDigest::sha256(root)
    }

    /// The leaf hash at `index`.
    pub fn leaf(&self, index: u64) -> Option<[u8; 32]> {
        let index = usize::try_from(index).ok()?;
        self.levels.first()?.get(index).copied()
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: u64) -> Result<InclusionProof, CryptoError> {
        let leaf_count = self.leaf_count();
        let out_of_range = || CryptoError::LeafOutOfRange { index, leaf_count };
        let mut pos = usize::try_from(index).map_err(|_| out_of_range())?;
        if index >= leaf_count {
            return Err(out_of_range());
        }

        let mut steps = Vec::with_capacity(self.levels.len().saturating_sub(1));
        for level in &self.levels[..self.levels.len() - 1] {
            let start = pos - pos % self.fanout;
            let end = (start + self.fanout).min(level.len());
            let siblings = (start..end)
                .filter(|&i| i != pos)
                .map(|i| ContentDigest::sha256(level[i]))
                .collect();
            steps.push(ProofStep {
                position: (pos - start) as u32,
                siblings,
            });
            pos /= self.fanout;
        }

        Ok(InclusionProof {
            leaf_index: index,
            leaf_count,
            fanout: self.fanout as u32,
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Inclusion proofs
// ---------------------------------------------------------------------------

/// One level of an inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Position of the proven node within its group.
    pub position: u32,
    /// The other members of the group, in order.
    pub siblings: Vec<ContentDigest>,
}

/// Path from a leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Position of the proven leaf.
    pub leaf_index: u64,
    /// Leaves in the tree.
    pub leaf_count: u64,
    /// Children per internal node.
    pub fanout: u32,
    /// One step per level below the root.
    pub steps: Vec<ProofStep>,
}

/// Check that `leaf` is included under `root`.
///
/// Group sizes and positions are checked against the leaf count and fanout
/// before any hashing, so a proof cannot claim a shape the tree does not
/// have.
pub fn verify_inclusion(leaf: &[u8; 32], proof: &InclusionProof, root: &ContentDigest) -> bool {
    let fanout = proof.fanout as u64;
    if check_fanout(proof.fanout as usize).is_err() || proof.leaf_index >= proof.leaf_count {
        return false;
    }

    let mut current = *leaf;
    let mut pos = proof.leaf_index;
    let mut width = proof.leaf_count;
    for step in &proof.steps {
        if width <= 1 {
            return false;
        }
        let start = pos - pos % fanout;
        let group = fanout.min(width - start);
        if u64::from(step.position) != pos % fanout || step.siblings.len() as u64 != group - 1 {
            return false;
        }
        let position = step.position as usize;
        let mut children: Vec<[u8; 32]> = Vec::with_capacity(group as usize);
        children.extend(step.siblings[..position].iter().map(|d| d.bytes));
        children.push(current);
        children.extend(step.siblings[position..].iter().map(|d| d.bytes));
        current = node_hash(&children);
        pos /= fanout;
        width = width.div_ceil(fanout);
    }
    width == 1 && current == root.bytes
}
