//! Blocks and the block builder.

use serde::{Deserialize, Serialize};
use tracing::debug;

use shardproof_merkle::DataTree;
use shardproof_smt::SparseMerkleTree;

use crate::error::BlockError;
use crate::payload;
use crate::tx::Transaction;
use crate::types::Hash;
use crate::STEP;

/// A block of the chain: an ordered transaction list committed to by a data
/// root, plus the state root and intermediate state roots its author
/// declares.
///
/// Outside this crate a block exposes its roots and transactions read-only;
/// the chunking behind the data root is recomputed on demand.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    data_root: Hash,
    state_root: Hash,
    transactions: Vec<Transaction>,
    inter_state_roots: Vec<Hash>,
    /// Index of the predecessor in the owning chain.
    prev: Option<usize>,
}

impl Block {
    /// Reassemble a block from declared parts, recomputing the chunking and
    /// data root from the declared transactions and intermediate roots.
    ///
    /// This is how a checker materializes a block it received: nothing about
    /// the declared roots is trusted beyond their shape.
    pub fn from_parts(
        transactions: Vec<Transaction>,
        inter_state_roots: Vec<Hash>,
        state_root: Hash,
    ) -> Result<Self, BlockError> {
        for tx in &transactions {
            tx.check()?;
        }
        let payload = payload::build(&transactions, &inter_state_roots)?;
        let mut data_tree = DataTree::new();
        for chunk in &payload.chunks {
            data_tree.push(chunk);
        }
        Ok(Self {
            data_root: data_tree.root(),
            state_root,
            transactions,
            inter_state_roots,
            prev: None,
        })
    }

    /// Commitment to the chunked payload.
    pub fn data_root(&self) -> Hash {
        self.data_root
    }

    /// Declared state root after every write in the block.
    pub fn state_root(&self) -> Hash {
        self.state_root
    }

    /// The ordered transactions.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Declared state roots at every [`STEP`]-transaction checkpoint.
    pub fn inter_state_roots(&self) -> &[Hash] {
        &self.inter_state_roots
    }

    /// Index of the predecessor block in the owning chain.
    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<usize>) {
        self.prev = prev;
    }
}

/// Build a block from `transactions`, advancing `state_tree` through every
/// write.
///
/// Checks every transaction, applies the writes in order while recording a
/// state root after each [`STEP`]-th transaction, and commits the payload
/// chunking into a fresh data tree.
pub fn new_block(
    transactions: Vec<Transaction>,
    state_tree: &mut SparseMerkleTree,
) -> Result<Block, BlockError> {
    for tx in &transactions {
        tx.check()?;
    }

    let (inter_state_roots, state_root) = fill_state_tree(&transactions, state_tree)?;

    let payload = payload::build(&transactions, &inter_state_roots)?;
    let mut data_tree = DataTree::new();
    for chunk in &payload.chunks {
        data_tree.push(chunk);
    }
    let data_root = data_tree.root();

    debug!(
        "built block: {} txs, {} chunks, data_root=0x{}",
        transactions.len(),
        payload.chunks.len(),
        hex::encode(&data_root[..4])
    );

    Ok(Block {
        data_root,
        state_root,
        transactions,
        inter_state_roots,
        prev: None,
    })
}

/// Apply every write in order, recording a state root after each
/// [`STEP`]-th transaction.
fn fill_state_tree(
    transactions: &[Transaction],
    state_tree: &mut SparseMerkleTree,
) -> Result<(Vec<Hash>, Hash), BlockError> {
    let mut inter_state_roots = Vec::with_capacity(transactions.len() / STEP);
    let mut state_root = state_tree.root();
    for (i, tx) in transactions.iter().enumerate() {
        for (key, value) in tx.write_keys.iter().zip(&tx.new_data) {
            state_root = state_tree.update(key, value)?;
        }
        if (i + 1) % STEP == 0 {
            inter_state_roots.push(state_root);
        }
    }
    Ok((inter_state_roots, state_root))
}
