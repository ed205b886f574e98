//! Sparse Merkle Tree implementation

use std::collections::HashMap;

use crate::hasher::{default_hashes, Keccak256Hasher};
use crate::path::{direction_bit, key_array, NodeKey};
use crate::proof::{CompactSmtProof, SmtProof};
use crate::{SmtError, TREE_DEPTH};

/// Sparse Merkle Tree with 256-level depth.
///
/// Cloning the tree is cheap relative to block sizes and doubles as the
/// snapshot mechanism: callers check candidate state on a clone and commit
/// it only on acceptance.
#[derive(Clone, Debug)]
pub struct SparseMerkleTree {
    /// Non-default node hashes, keyed by height and masked key prefix.
    nodes: HashMap<NodeKey, [u8; 32]>,
    /// Leaf values: key -> value bytes.
    values: HashMap<[u8; 32], Vec<u8>>,
    /// Hashes of empty subtrees, indexed by height.
    defaults: Vec<[u8; 32]>,
    /// Root hash.
    root: [u8; 32],
}

impl SparseMerkleTree {
    /// Create a new empty SMT.
    pub fn new() -> Self {
        let defaults = default_hashes();
        let root = defaults[TREE_DEPTH];
        Self {
            nodes: HashMap::new(),
            values: HashMap::new(),
            defaults,
            root,
        }
    }

    /// Get the root hash.
    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    /// Get the value stored at `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let key: [u8; 32] = key.try_into().ok()?;
        self.values.get(&key).map(Vec::as_slice)
    }

    /// Set `key` to `value` and return the new root.
    ///
    /// The walk from leaf to root touches exactly one node per level, so
    /// roots are reproducible regardless of map iteration order.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Result<[u8; 32], SmtError> {
        let key = key_array(key)?;
        self.values.insert(key, value.to_vec());

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

    /// Generate an inclusion proof for `key`.
    pub fn prove(&self, key: &[u8]) -> Result<SmtProof, SmtError> {
        let key = key_array(key)?;
        let mut siblings = Vec::with_capacity(TREE_DEPTH);
        for h in 0..TREE_DEPTH {
            siblings.push(self.node_or_default(NodeKey::sibling(&key, h)));
        }
        Ok(SmtProof { key, siblings })
    }

    /// Generate a compact inclusion proof for `key`, with default siblings
    /// elided.
    pub fn prove_compact(&self, key: &[u8]) -> Result<CompactSmtProof, SmtError> {
        Ok(self.prove(key)?.compact())
    }

    fn node_or_default(&self, node: NodeKey) -> [u8; 32] {
        self.nodes
            .get(&node)
            .copied()
            .unwrap_or(self.defaults[node.height as usize])
    }
}

impl Default for SparseMerkleTree {
    fn default() -> Self {
        Self::new()
    }
}
