//! Deep partial subtree: verifier-side state reconstruction.

use std::collections::{HashMap, HashSet};

use crate::hasher::{default_hashes, Keccak256Hasher};
use crate::path::{direction_bit, key_array, NodeKey};
use crate::proof::SmtProof;
use crate::{SmtError, TREE_DEPTH};

/// A partial view of a sparse Merkle tree, reconstructed from inclusion
/// proofs against a known root.
///
/// Branches are admitted with [`add_branch`](Self::add_branch); once a key's
/// branch is in, [`update`](Self::update) recomputes the root along the
/// stored path without any access to the full tree.
#[derive(Clone, Debug)]
pub struct DeepSubtree {
    /// Current root; starts at the root the subtree was opened against.
    root: [u8; 32],
    /// Known node hashes along admitted paths and their siblings.
    nodes: HashMap<NodeKey, [u8; 32]>,
    /// Hashes of empty subtrees, indexed by height.
    defaults: Vec<[u8; 32]>,
    /// Keys with an admitted branch.
    admitted: HashSet<[u8; 32]>,
}

impl DeepSubtree {
    /// Open a subtree against `root`.
    pub fn new(root: [u8; 32]) -> Self {
        Self {
            root,
            nodes: HashMap::new(),
            defaults: default_hashes(),
            admitted: HashSet::new(),
        }
    }

    /// Get the current root hash.
    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    /// Admit a branch binding `key` to `value`.
    ///
    /// Fails unless the proof verifies against the subtree's current root;
    /// on success the branch's path and sibling hashes become part of the
    /// subtree.
    pub fn add_branch(
        &mut self,
        proof: &SmtProof,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), SmtError> {
        let key = key_array(key)?;
        if proof.key != key || proof.siblings.len() != TREE_DEPTH {
            return Err(SmtError::BranchMismatch);
        }
        if proof.root_with(value) != self.root {
            return Err(SmtError::BranchMismatch);
        }

        let mut node = Keccak256Hasher::hash_leaf(&key, value);
        self.nodes.insert(NodeKey::leaf(key), node);
        for (h, sibling) in proof.siblings.iter().enumerate() {
            self.nodes.insert(NodeKey::sibling(&key, h), *sibling);
            node = if direction_bit(&key, h) {
                Keccak256Hasher::hash_node(sibling, &node)
            } else {
                Keccak256Hasher::hash_node(&node, sibling)
            };
            self.nodes.insert(NodeKey::at(&key, h + 1), node);
        }
        self.admitted.insert(key);
        Ok(())
    }

    /// Set an admitted `key` to `value` and return the new root.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<[u8; 32], SmtError> {
        let key = key_array(key)?;
        if !self.admitted.contains(&key) {
            return Err(SmtError::UnknownKey(hex::encode(key)));
        }

        let mut node = Keccak256Hasher::hash_leaf(&key, value);
        self.nodes.insert(NodeKey::leaf(key), node);
        for h in 0..TREE_DEPTH {
            let sibling = self.node_or_default(NodeKey::sibling(&key, h));
            node = if direction_bit(&key, h) {
                Keccak256Hasher::hash_node(&sibling, &node)
            } else {
                Keccak256Hasher::hash_node(&node, &sibling)
            };
            self.nodes.insert(NodeKey::at(&key, h + 1), node);
        }
        self.root = node;
        Ok(node)
    }

    fn node_or_default(&self, node: NodeKey) -> [u8; 32] {
        self.nodes
            .get(&node)
            .copied()
            .unwrap_or(self.defaults[node.height as usize])
    }
}
