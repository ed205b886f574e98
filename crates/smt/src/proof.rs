//! SMT proof generation and verification

use serde::{Deserialize, Serialize};

use crate::hasher::{default_hashes, Keccak256Hasher};
use crate::path::direction_bit;
use crate::{SmtError, TREE_DEPTH};

/// SMT inclusion proof: the proven key plus one sibling hash per level,
/// leaf to root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtProof {
    /// The key being proven.
    pub key: [u8; 32],
    /// Sibling hashes from leaf to root (256 elements).
    pub siblings: Vec<[u8; 32]>,
}

impl SmtProof {
    /// Verify this proof against a root hash.
    pub fn verify(&self, root: &[u8; 32], key: &[u8], value: &[u8]) -> bool {
        let Ok(key) = <[u8; 32]>::try_from(key) else {
            return false;
        };
        if self.key != key || self.siblings.len() != TREE_DEPTH {
            return false;
        }
        self.root_with(value) == *root
    }

    /// Root obtained by binding `value` to the proven key.
    pub(crate) fn root_with(&self, value: &[u8]) -> [u8; 32] {
        let mut node = Keccak256Hasher::hash_leaf(&self.key, value);
        for (h, sibling) in self.siblings.iter().enumerate() {
            node = if direction_bit(&self.key, h) {
                Keccak256Hasher::hash_node(sibling, &node)
            } else {
                Keccak256Hasher::hash_node(&node, sibling)
            };
        }
        node
    }

    /// Compress by eliding siblings that equal the empty-subtree hash of
    /// their level.
    pub fn compact(&self) -> CompactSmtProof {
        let defaults = default_hashes();
        let mut default_bitmap = [0u8; 32];
        let mut siblings = Vec::new();
        for (h, sibling) in self.siblings.iter().enumerate() {
            if *sibling == defaults[h] {
                default_bitmap[h / 8] |= 1 << (h % 8);
            } else {
                siblings.push(*sibling);
            }
        }
        CompactSmtProof {
            key: self.key,
            default_bitmap,
            siblings,
        }
    }
}

/// Compressed form of [`SmtProof`]: a 256-bit bitmap marks which siblings
/// are the per-level default hash and are therefore omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactSmtProof {
    /// The key being proven.
    pub key: [u8; 32],
    /// Bit `h` set means the sibling at height `h` is the default hash.
    pub default_bitmap: [u8; 32],
    /// The non-default siblings, leaf to root.
    pub siblings: Vec<[u8; 32]>,
}

impl CompactSmtProof {
    /// Expand back into a full proof, failing when the sibling count does
    /// not match the bitmap.
    pub fn decompact(&self) -> Result<SmtProof, SmtError> {
        let defaults: usize = self
            .default_bitmap
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum();
        let expected = TREE_DEPTH - defaults;
        if self.siblings.len() != expected {
            return Err(SmtError::MalformedCompactProof {
                expected,
                got: self.siblings.len(),
            });
        }

        let default_chain = default_hashes();
        let mut siblings = Vec::with_capacity(TREE_DEPTH);
        let mut taken = self.siblings.iter();
        for h in 0..TREE_DEPTH {
            if self.default_bitmap[h / 8] >> (h % 8) & 1 == 1 {
                siblings.push(default_chain[h]);
            } else if let Some(sibling) = taken.next() {
                siblings.push(*sibling);
            }
        }
        Ok(SmtProof {
            key: self.key,
            siblings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SparseMerkleTree;

    #[test]
    fn compact_round_trip() {
        let mut tree = SparseMerkleTree::new();
        tree.update(&[1u8; 32], b"one").unwrap();
        tree.update(&[2u8; 32], b"two").unwrap();

        let proof = tree.prove(&[1u8; 32]).unwrap();
        let compact = proof.compact();
        // the two leaves diverge high up, so nearly every sibling is a
        // default
        assert!(compact.siblings.len() < 8);
        assert_eq!(compact.decompact().unwrap(), proof);
    }

    #[test]
    fn compact_proof_verifies_after_decompaction() {
        let mut tree = SparseMerkleTree::new();
        let root = tree.update(&[5u8; 32], b"five").unwrap();

        let compact = tree.prove_compact(&[5u8; 32]).unwrap();
        let proof = compact.decompact().unwrap();
        assert!(proof.verify(&root, &[5u8; 32], b"five"));
    }

    #[test]
    fn malformed_compact_proof_is_rejected() {
        let garbage = CompactSmtProof {
            key: [9u8; 32],
            default_bitmap: [0xA5u8; 32],
            siblings: vec![[1u8; 32], [2u8; 32]],
        };
        assert!(matches!(
            garbage.decompact(),
            Err(SmtError::MalformedCompactProof { .. })
        ));
    }
}
