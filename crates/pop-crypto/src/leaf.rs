//! # Domain-Separated Hashing
//!
//! - Leaf: `SHA256(0x00 || u64_be(record_index) || canonical_record_bytes)`.
//! - Node: `SHA256(0x01 || u32_be(k) || child_1 || ... || child_k)`.
//! - Empty tree root: `SHA256(0x01 || u32_be(0))`.
//!
//! The prefix byte keeps a leaf pre-image from ever parsing as a node
//! pre-image. Binding the index into the leaf makes reordered records
//! produce a different root even when their bytes are identical.

use sha2::{Digest, Sha256};

use pop_core::CanonicalBytes;

/// Identifier of the leaf construction recorded in manifests.
pub const LEAF_ALGORITHM: &str = "pop-leaf/sha256-index-jcs/1";

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Hash one canonical record into a Merkle leaf.
pub fn leaf_hash(record_index: u64, record: &CanonicalBytes) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(record_index.to_be_bytes());
    hasher.update(record.as_bytes());
    hasher.finalize().into()
}

/// Hash an ordered group of child hashes into their parent.
///
/// Groups hold at most 256 children, so the count always fits a `u32`.
pub fn node_hash(children: &[[u8; 32]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update((children.len() as u32).to_be_bytes());
    for child in children {
        hasher.update(child);
    }
    hasher.finalize().into()
}

/// Root of a tree with no leaves.
pub fn empty_root() -> [u8; 32] {
    node_hash(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_core::sha256_raw;

    #[test]
    fn leaf_layout() {
        let cb = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        let mut preimage = vec![0x00];
        preimage.extend_from_slice(&5u64.to_be_bytes());
        preimage.extend_from_slice(br#"{"a":1}"#);
        assert_eq!(leaf_hash(5, &cb), sha256_raw(&preimage));
    }

    #[test]
    fn index_is_bound_into_leaf() {
        let cb = CanonicalBytes::new(&serde_json::json!([])).unwrap();
        assert_ne!(leaf_hash(0, &cb), leaf_hash(1, &cb));
    }

    #[test]
    fn node_layout() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let mut preimage = vec![0x01, 0, 0, 0, 2];
        preimage.extend_from_slice(&a);
        preimage.extend_from_slice(&b);
        assert_eq!(node_hash(&[a, b]), sha256_raw(&preimage));
        assert_ne!(node_hash(&[a, b]), node_hash(&[b, a]));
    }

    #[test]
    fn empty_root_is_zero_count_node() {
        assert_eq!(empty_root(), sha256_raw(&[0x01, 0, 0, 0, 0]));
    }
}
