//! # Streaming Merkle Accumulator
//!
//! Computes the same root as [`MerkleTree`](crate::merkle::MerkleTree)
//! without keeping the leaves. The frontier holds, per level, the members of
//! the group still being filled; a full group is hashed immediately and
//! pushed one level up, so memory is `O(fanout * log n)`.
//!
//! At [`finalize`](MerkleAccumulator::finalize) each partial group, lowest
//! level first, is hashed exactly as the tree hashes its final group. The
//! first level that ever received a single node holds the root.

use pop_core::ContentDigest;

use crate::error::CryptoError;
use crate::leaf::{empty_root, node_hash};
use crate::merkle::check_fanout;

#[derive(Debug, Clone, Default)]
struct Frontier {
    count: u64,
    pending: Vec<[u8; 32]>,
}

/// Incremental root computation over a stream of leaf hashes.
#[derive(Debug, Clone)]
pub struct MerkleAccumulator {
    fanout: usize,
    levels: Vec<Frontier>,
}

impl MerkleAccumulator {
    /// An empty accumulator for the given fanout.
    pub fn new(fanout: usize) -> Result<Self, CryptoError> {
        check_fanout(fanout)?;
        Ok(Self {
            fanout,
            levels: Vec::new(),
        })
    }

    /// Leaves pushed so far.
    pub fn leaf_count(&self) -> u64 {
        self.levels.first().map_or(0, |level| level.count)
    }

    /// Append the next leaf hash.
    pub fn push(&mut self, leaf: [u8; 32]) {
        self.push_at(0, leaf);
    }

    fn push_at(&mut self, mut level: usize, mut hash: [u8; 32]) {
        loop {
            if self.levels.len() == level {
                self.levels.push(Frontier {
                    count: 0,
                    pending: Vec::with_capacity(self.fanout),
                });
            }
            let frontier = &mut self.levels[level];
            frontier.count += 1;
            frontier.pending.push(hash);
            if frontier.pending.len() < self.fanout {
                return;
            }
            hash = node_hash(&frontier.pending);
            frontier.pending.clear();
            level += 1;
        }
    }

    /// The root over every leaf pushed.
    pub fn finalize(mut self) -> ContentDigest {
        let mut level = 0;
        while level < self.levels.len() {
            let frontier = &mut self.levels[level];
            if frontier.count == 1 {
                if let Some(root) = frontier.pending.first() {
                    return ContentDigest::sha256(*root);
                }
            }
            if !frontier.pending.is_empty() {
                let node = node_hash(&frontier.pending);
                frontier.pending.clear();
                self.push_at(level + 1, node);
            }
            level += 1;
        }
        ContentDigest::sha256(empty_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::{MerkleOptions, MerkleTree};

    fn leaves(n: usize) -> Vec<[u8; 32]> {
        (0..n).map(|i| [(i % 251) as u8; 32]).collect()
    }

    fn tree_root(leaves: &[[u8; 32]], fanout: usize) -> ContentDigest {
        MerkleTree::build(leaves.to_vec(), &MerkleOptions { fanout, workers: 1 })
            .unwrap()
            .root()
    }

    #[test]
    fn matches_tree_for_small_counts() {
        for fanout in [2, 3, 4, 7] {
            for n in 0..40 {
                let l = leaves(n);
                let mut acc = MerkleAccumulator::new(fanout).unwrap();
                l.iter().for_each(|leaf| acc.push(*leaf));
                assert_eq!(acc.leaf_count(), n as u64);
                assert_eq!(acc.finalize(), tree_root(&l, fanout), "fanout {fanout} n {n}");
            }
        }
    }

    #[test]
    fn empty_is_empty_root() {
        let acc = MerkleAccumulator::new(2).unwrap();
        assert_eq!(acc.finalize().bytes, empty_root());
    }

    #[test]
    fn rejects_bad_fanout() {
        assert!(MerkleAccumulator::new(0).is_err());
        assert!(MerkleAccumulator::new(300).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::merkle::{MerkleOptions, MerkleTree};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accumulator_root_equals_tree_root(
            seeds in prop::collection::vec(any::<u8>(), 0..300),
            fanout in 2usize..20,
            workers in 1usize..5,
        ) {
            let leaves: Vec<[u8; 32]> = seeds.iter().map(|s| [*s; 32]).collect();
            let mut acc = MerkleAccumulator::new(fanout).unwrap();
            leaves.iter().for_each(|leaf| acc.push(*leaf));
            let tree = MerkleTree::build(leaves, &MerkleOptions { fanout, workers }).unwrap();
            prop_assert_eq!(acc.finalize(), tree.root());
        }
    }
}
