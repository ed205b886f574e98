//! Sparse Merkle tree (SMT) for state commitments.
//!
//! A fixed-depth (256-level) tree mapping 32-byte keys to byte-string
//! values. Key features:
//! - Fixed depth: direct key → path mapping
//! - O(depth) updates along the key's path, no full recomputation
//! - Compact inclusion proofs that elide default siblings
//! - Deep partial subtrees for verifier-side reconstruction

mod hasher;
mod path;
mod proof;
mod subtree;
mod tree;

pub use hasher::Keccak256Hasher;
pub use proof::{CompactSmtProof, SmtProof};
pub use subtree::DeepSubtree;
pub use tree::SparseMerkleTree;

use thiserror::Error;

/// Default empty node hash (keccak256 of empty bytes).
pub const EMPTY_HASH: [u8; 32] = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c,
    0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b,
    0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Tree depth (256 bits for a key).
pub const TREE_DEPTH: usize = 256;

/// Key width in bytes.
pub const KEY_SIZE: usize = 32;

/// Errors surfaced by the tree, proofs, and deep subtrees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmtError {
    /// Keys must be exactly [`KEY_SIZE`] bytes.
    #[error("key must be {KEY_SIZE} bytes, got {len}")]
    InvalidKeyLength { len: usize },

    /// A branch did not verify against the subtree root.
    #[error("branch does not verify against the subtree root")]
    BranchMismatch,

    /// An update was attempted on a key with no admitted branch.
    #[error("key {0} has no admitted branch")]
    UnknownKey(String),

    /// A compact proof's sibling count disagrees with its bitmap.
    #[error("compact proof carries {got} siblings, bitmap requires {expected}")]
    MalformedCompactProof { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_root_is_default_chain() {
        let tree = SparseMerkleTree::new();
        let mut node = EMPTY_HASH;
        for _ in 0..TREE_DEPTH {
            node = Keccak256Hasher::hash_node(&node, &node);
        }
        assert_eq!(tree.root(), node);
    }

    #[test]
    fn insert_and_verify() {
        let mut tree = SparseMerkleTree::new();

        let key = [1u8; 32];
        let value = vec![2u8; 10];

        let root = tree.update(&key, &value).unwrap();
        assert_eq!(root, tree.root());

        let proof = tree.prove(&key).unwrap();
        assert!(proof.verify(&root, &key, &value));
        assert!(!proof.verify(&root, &key, b"wrong"));
    }

    #[test]
    fn key_width_is_enforced() {
        let mut tree = SparseMerkleTree::new();
        let err = tree.update(&[1u8; 16], b"v").unwrap_err();
        assert_eq!(err, SmtError::InvalidKeyLength { len: 16 });
    }
}
