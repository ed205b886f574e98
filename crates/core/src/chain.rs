//! The blockchain: an append-only list of checked blocks over one shared
//! state tree.

use tracing::{info, warn};

use shardproof_smt::SparseMerkleTree;

use crate::block::Block;
use crate::error::BlockError;
use crate::fraud::{check_block, FraudProof};
use crate::types::Hash;

/// Append-only chain of accepted blocks.
///
/// Blocks live in an indexed list; an accepted block's `prev` points at its
/// predecessor's index. Appends are strictly sequential; callers serialize
/// concurrent use.
#[derive(Clone, Debug)]
pub struct Blockchain {
    blocks: Vec<Block>,
    /// Key-values of all accepted transactions.
    state_tree: SparseMerkleTree,
}

impl Blockchain {
    /// Create an empty blockchain.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            state_tree: SparseMerkleTree::new(),
        }
    }

    /// Check `block` against the current state and append it on success.
    ///
    /// The check runs against a snapshot of the state tree: a returned
    /// fraud proof or error leaves the chain byte-identical to before the
    /// call, and the snapshot is committed only when the block is accepted.
    pub fn append(&mut self, block: Block) -> Result<Option<FraudProof>, BlockError> {
        let mut candidate = self.state_tree.clone();
        if let Some(fp) = check_block(&block, &mut candidate)? {
            warn!(
                "rejected block {}: fraud proof over {} chunks",
                self.blocks.len(),
                fp.chunks.len()
            );
            return Ok(Some(fp));
        }

        self.state_tree = candidate;
        let mut block = block;
        block.set_prev(self.blocks.len().checked_sub(1));
        info!(
            "accepted block {}: {} txs, data_root=0x{}",
            self.blocks.len(),
            block.transactions().len(),
            hex::encode(&block.data_root()[..4])
        );
        self.blocks.push(block);
        Ok(None)
    }

    /// Number of accepted blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True before the first block is accepted.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The most recently accepted block.
    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// The accepted block at `index`.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Root of the shared state tree after the last accepted block.
    pub fn state_root(&self) -> Hash {
        self.state_tree.root()
    }

    /// Read view of the state tree; block producers clone it to build the
    /// next block against.
    pub fn state_tree(&self) -> &SparseMerkleTree {
        &self.state_tree
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
