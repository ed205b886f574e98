//! Keccak256 hashing for tree nodes.

use tiny_keccak::{Hasher, Keccak};

use crate::{EMPTY_HASH, TREE_DEPTH};

/// Domain prefix for leaf hashes.
const LEAF_PREFIX: u8 = 0x00;
/// Domain prefix for internal node hashes.
const NODE_PREFIX: u8 = 0x01;

/// Keccak256 hasher
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash arbitrary bytes.
    pub fn hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Keccak::v256();
        hasher.update(data);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash a key-value pair for a leaf node.
    pub fn hash_leaf(key: &[u8; 32], value: &[u8]) -> [u8; 32] {
        let mut hasher = Keccak::v256();
        hasher.update(&[LEAF_PREFIX]);
        hasher.update(key);
        hasher.update(value);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash two child hashes into their parent.
    pub fn hash_node(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Keccak::v256();
        hasher.update(&[NODE_PREFIX]);
        hasher.update(left);
        hasher.update(right);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }
}

/// Hashes of empty subtrees, indexed by height (0 = leaf level).
pub(crate) fn default_hashes() -> Vec<[u8; 32]> {
    let mut defaults = Vec::with_capacity(TREE_DEPTH + 1);
    defaults.push(EMPTY_HASH);
    for h in 0..TREE_DEPTH {
        let prev = defaults[h];
        defaults.push(Keccak256Hasher::hash_node(&prev, &prev));
    }
    defaults
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_pair_not_zero() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        let hash = Keccak256Hasher::hash_node(&left, &right);
        assert_ne!(hash, [0u8; 32]);
        assert_ne!(hash, Keccak256Hasher::hash_node(&right, &left));
    }

    #[test]
    fn default_chain_starts_empty() {
        let defaults = default_hashes();
        assert_eq!(defaults.len(), TREE_DEPTH + 1);
        assert_eq!(defaults[0], EMPTY_HASH);
        assert_eq!(
            defaults[1],
            Keccak256Hasher::hash_node(&EMPTY_HASH, &EMPTY_HASH)
        );
    }
}
