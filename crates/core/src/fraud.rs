//! Fraud-proof generation and verification.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shardproof_merkle::{verify_inclusion, DataTree};
use shardproof_smt::{CompactSmtProof, DeepSubtree, SparseMerkleTree};

use crate::block::{new_block, Block};
use crate::error::BlockError;
use crate::payload;
use crate::tx::Transaction;
use crate::types::Hash;
use crate::STEP;

/// Evidence that a block's declared intermediate state root diverges from
/// the root obtained by honestly re-applying its writes.
///
/// Self-contained: a verifier holding only the block's data root and state
/// root can decide it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FraudProof {
    /// Write keys of the offending transaction window, in order.
    pub write_keys: Vec<Vec<u8>>,
    /// Claimed pre-window values for the write keys.
    pub old_data: Vec<Vec<u8>>,
    /// Read keys of the window, in order.
    pub read_keys: Vec<Vec<u8>>,
    /// Claimed values for the read keys.
    pub read_data: Vec<Vec<u8>>,
    /// One compact state-tree inclusion proof per write key.
    pub proof_state: Vec<CompactSmtProof>,
    /// Raw bytes of the chunks covering the window.
    pub chunks: Vec<Vec<u8>>,
    /// Data-tree leaf index of each listed chunk.
    pub chunk_indices: Vec<u64>,
    /// One data-tree audit path per listed chunk.
    pub proof_chunks: Vec<Vec<Hash>>,
    /// Total leaf count of the data tree.
    pub num_of_leaves: u64,
}

/// Re-derive `block` against the pre-block state and, at the first
/// intermediate-root divergence, assemble a fraud proof for the offending
/// window.
///
/// `state_tree` is advanced through the block's writes as a side effect of
/// the rebuild; callers wanting to keep the pre-block state run this on a
/// clone. `Ok(None)` means the block checked out.
pub fn check_block(
    block: &Block,
    state_tree: &mut SparseMerkleTree,
) -> Result<Option<FraudProof>, BlockError> {
    let rebuilt = new_block(block.transactions().to_vec(), state_tree)?;

    let declared = block.inter_state_roots();
    for (i, expected) in rebuilt.inter_state_roots().iter().enumerate() {
        if declared.get(i) == Some(expected) {
            continue;
        }
        warn!(
            "intermediate state root mismatch at window {}: expected 0x{}",
            i,
            hex::encode(&expected[..4])
        );
        return build_fraud_proof(block, i, state_tree).map(Some);
    }
    Ok(None)
}

/// Assemble the proof for the `window`-th transaction window, with
/// `state_tree` already advanced through the block.
fn build_fraud_proof(
    block: &Block,
    window: usize,
    state_tree: &SparseMerkleTree,
) -> Result<FraudProof, BlockError> {
    let window_txs = &block.transactions()[window * STEP..(window + 1) * STEP];

    let mut write_keys = Vec::new();
    let mut old_data = Vec::new();
    let mut read_keys = Vec::new();
    let mut read_data = Vec::new();
    for tx in window_txs {
        write_keys.extend(tx.write_keys.iter().cloned());
        old_data.extend(tx.old_data.iter().cloned());
        read_keys.extend(tx.read_keys.iter().cloned());
        read_data.extend(tx.read_data.iter().cloned());
    }

    let mut proof_state = Vec::with_capacity(write_keys.len());
    for key in &write_keys {
        proof_state.push(state_tree.prove_compact(key)?);
    }

    // the chunks come from the block's own payload, declared roots included,
    // and are proven against its data root
    let block_payload = payload::build(block.transactions(), block.inter_state_roots())?;
    let mut chunk_indices: Vec<u64> = Vec::new();
    let mut seen = HashSet::new();
    for tx in window_txs {
        let offset = block_payload.offsets[&tx.fingerprint()];
        for index in payload::chunk_span(offset, tx.encoded_len()) {
            if seen.insert(index) {
                chunk_indices.push(index);
            }
        }
    }

    let mut data_tree = DataTree::new();
    for chunk in &block_payload.chunks {
        data_tree.push(chunk);
    }
    let num_of_leaves = data_tree.num_leaves() as u64;

    let mut chunks = Vec::with_capacity(chunk_indices.len());
    let mut proof_chunks = Vec::with_capacity(chunk_indices.len());
    for &index in &chunk_indices {
        proof_chunks.push(data_tree.prove(index as usize)?);
        chunks.push(block_payload.chunks[index as usize].clone());
    }

    debug!(
        "fraud proof over window {}: {} write keys, {} chunks",
        window,
        write_keys.len(),
        chunks.len()
    );

    Ok(FraudProof {
        write_keys,
        old_data,
        read_keys,
        read_data,
        proof_state,
        chunks,
        chunk_indices,
        proof_chunks,
        num_of_leaves,
    })
}

/// Decide a fraud proof against nothing more than the block's two roots.
///
/// Stateless and hash-pure. Returns only a boolean: corrupt chunk openings,
/// corrupt state openings, and internal inconsistencies all reject alike.
pub fn verify_fraud_proof(data_root: &Hash, state_root: &Hash, fp: &FraudProof) -> bool {
    if fp.chunks.len() != fp.chunk_indices.len()
        || fp.chunks.len() != fp.proof_chunks.len()
        || fp.write_keys.len() != fp.proof_state.len()
        || fp.chunks.is_empty()
        || fp.chunks.iter().any(|chunk| chunk.is_empty())
    {
        return false;
    }

    // 1. every listed chunk is a leaf of the data tree
    for (j, chunk) in fp.chunks.iter().enumerate() {
        if !verify_inclusion(
            data_root,
            chunk,
            &fp.proof_chunks[j],
            fp.chunk_indices[j],
            fp.num_of_leaves,
        ) {
            return false;
        }
    }

    // 2. reassemble the payload fragment and align on the first transaction
    let mut buf = Vec::new();
    for chunk in &fp.chunks {
        buf.extend_from_slice(&chunk[1..]);
    }
    let align = fp.chunks[0][0] as usize;
    if align > buf.len() {
        return false;
    }
    let mut rest = &buf[align..];

    // 3. parse transactions while they last, collecting declared new values
    let mut new_data: Vec<Vec<u8>> = Vec::new();
    while rest.len() >= 2 {
        match Transaction::parse_prefix(rest) {
            Ok((tx, used)) => {
                new_data.extend(tx.new_data);
                rest = &rest[used..];
            }
            Err(_) => break,
        }
    }
    if new_data.len() < fp.write_keys.len() {
        return false;
    }

    // 4. replay the declared writes on a partial view of the state tree
    let mut subtree = DeepSubtree::new(*state_root);
    for (i, key) in fp.write_keys.iter().enumerate() {
        let Ok(proof) = fp.proof_state[i].decompact() else {
            return false;
        };
        if subtree.add_branch(&proof, key, &new_data[i]).is_err() {
            return false;
        }
        if subtree.update(key, &new_data[i]).is_err() {
            return false;
        }
    }

    subtree.root() == *state_root
}
