//! Ordered Merkle tree over data chunks.
//!
//! Leaves are pushed in order; the tree commits to the full sequence and
//! hands out audit paths for single leaves. Subtrees split at the largest
//! power of two below the subtree size, so trees of any width are defined
//! without padding.

mod proof;
mod tree;

pub use proof::verify_inclusion;
pub use tree::DataTree;

use thiserror::Error;

/// Root of an empty tree (keccak256 of empty bytes).
pub const EMPTY_ROOT: [u8; 32] = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c,
    0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b,
    0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Errors surfaced by the tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A proof was requested for a leaf the tree does not hold.
    #[error("leaf index {index} out of range for {num_leaves} leaves")]
    IndexOutOfRange { index: usize, num_leaves: usize },
}
