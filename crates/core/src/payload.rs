//! Linear payload layout and chunking.
//!
//! The payload concatenates serialized transactions in order, appending the
//! matching intermediate state root after every transaction whose 1-based
//! index is a multiple of [`STEP`]. The buffer is then split into chunks of
//! `CHUNK_SIZE - 1` payload bytes behind a one-byte position prefix.

use std::collections::HashMap;

use crate::error::BlockError;
use crate::tx::Transaction;
use crate::types::Hash;
use crate::{CHUNK_SIZE, STEP};

/// A block's payload split into position-prefixed chunks, plus the byte
/// offset of each transaction within the linear buffer.
#[derive(Debug)]
pub(crate) struct BlockPayload {
    pub chunks: Vec<Vec<u8>>,
    pub offsets: HashMap<Hash, usize>,
}

pub(crate) fn build(
    transactions: &[Transaction],
    inter_state_roots: &[Hash],
) -> Result<BlockPayload, BlockError> {
    let expected = transactions.len() / STEP;
    if inter_state_roots.len() != expected {
        return Err(BlockError::InterRootCount {
            expected,
            got: inter_state_roots.len(),
        });
    }

    let mut buf = Vec::new();
    let mut offsets = HashMap::with_capacity(transactions.len());
    let mut roots = inter_state_roots.iter();
    for (i, tx) in transactions.iter().enumerate() {
        if offsets.insert(tx.fingerprint(), buf.len()).is_some() {
            return Err(BlockError::DuplicateTransaction { index: i });
        }
        buf.extend_from_slice(&tx.serialize());
        if (i + 1) % STEP == 0 {
            if let Some(root) = roots.next() {
                buf.extend_from_slice(root);
            }
        }
    }

    // split into position-prefixed chunks; the last one may run short
    let payload_size = CHUNK_SIZE - 1;
    let mut chunks = Vec::with_capacity(buf.len() / payload_size + 1);
    for piece in buf.chunks(payload_size) {
        let mut chunk = Vec::with_capacity(piece.len() + 1);
        chunk.push(0x00);
        chunk.extend_from_slice(piece);
        chunks.push(chunk);
    }

    // Stamp position bytes, last transaction first so the earliest start in
    // a chunk is the one recorded. Position arithmetic uses the full chunk
    // width, header byte included; the layout is frozen chain-wide.
    for tx in transactions.iter().rev() {
        let offset = offsets[&tx.fingerprint()];
        chunks[offset / CHUNK_SIZE][0] = (offset % CHUNK_SIZE) as u8;
    }

    Ok(BlockPayload { chunks, offsets })
}

/// Chunk indices a transaction's encoding touches, given its byte offset,
/// under the same full-chunk-width arithmetic as the position bytes.
pub(crate) fn chunk_span(offset: usize, encoded_len: usize) -> Vec<u64> {
    let index = (offset / CHUNK_SIZE) as u64;
    let last = (encoded_len / CHUNK_SIZE) as u64;
    let mut indices: Vec<u64> = (index..=index + last).collect();
    if encoded_len > CHUNK_SIZE - offset % CHUNK_SIZE {
        indices.push(index + last + 1);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(tag: u8, data_len: usize) -> Transaction {
        Transaction::new(
            vec![vec![tag; 32]],
            vec![vec![tag; data_len]],
            vec![vec![tag; data_len]],
            vec![vec![tag; 32]],
            vec![vec![tag; data_len]],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn root_count_must_cover_transactions() {
        let txs = vec![tx(1, 8), tx(2, 8), tx(3, 8)];
        let err = build(&txs, &[]).unwrap_err();
        assert_eq!(err, BlockError::InterRootCount { expected: 1, got: 0 });

        let err = build(&txs, &[[0u8; 32]; 2]).unwrap_err();
        assert_eq!(err, BlockError::InterRootCount { expected: 1, got: 2 });
    }

    #[test]
    fn duplicate_transactions_are_rejected() {
        let txs = vec![tx(1, 8), tx(1, 8)];
        let err = build(&txs, &[[0u8; 32]]).unwrap_err();
        assert_eq!(err, BlockError::DuplicateTransaction { index: 1 });
    }

    #[test]
    fn roots_are_interleaved_after_every_step() {
        let txs = vec![tx(1, 8), tx(2, 8), tx(3, 8), tx(4, 8)];
        let roots = [[0xAAu8; 32], [0xBBu8; 32]];
        let payload = build(&txs, &roots).unwrap();

        let mut buf = Vec::new();
        for chunk in &payload.chunks {
            buf.extend_from_slice(&chunk[1..]);
        }

        let tx_len = txs[0].encoded_len();
        assert_eq!(buf.len(), 4 * tx_len + 64);
        assert_eq!(&buf[2 * tx_len..2 * tx_len + 32], &[0xAAu8; 32]);
        assert_eq!(&buf[4 * tx_len + 32..], &[0xBBu8; 32]);

        assert_eq!(payload.offsets[&txs[0].fingerprint()], 0);
        assert_eq!(payload.offsets[&txs[1].fingerprint()], tx_len);
        assert_eq!(payload.offsets[&txs[2].fingerprint()], 2 * tx_len + 32);
    }

    #[test]
    fn position_byte_marks_first_start_in_chunk() {
        // two transactions of 92 payload-relevant bytes each: both start in
        // chunk 0, so its position byte keeps the earlier offset
        let txs = vec![tx(1, 8), tx(2, 8)];
        let payload = build(&txs, &[[0xCCu8; 32]]).unwrap();

        assert_eq!(payload.chunks.len(), 1);
        assert_eq!(payload.chunks[0][0], 0x00);
    }

    #[test]
    fn position_byte_uses_full_chunk_width() {
        // first transaction is large enough to push the second past the
        // first chunk boundary
        let big = tx(1, 100);
        let small = tx(2, 8);
        let offset = big.encoded_len();
        assert!(offset > CHUNK_SIZE);

        let payload = build(&[big, small], &[[0xDDu8; 32]]).unwrap();
        assert_eq!(
            payload.chunks[offset / CHUNK_SIZE][0],
            (offset % CHUNK_SIZE) as u8
        );
    }

    #[test]
    fn chunk_spans() {
        // fits within the first chunk
        assert_eq!(chunk_span(0, 100), vec![0]);
        // overruns the remaining width of its starting chunk
        assert_eq!(chunk_span(210, 210), vec![0, 1]);
        // spans a full chunk width on its own
        assert_eq!(chunk_span(0, 300), vec![0, 1, 2]);
    }

    #[test]
    fn empty_block_has_no_chunks() {
        let payload = build(&[], &[]).unwrap();
        assert!(payload.chunks.is_empty());
        assert!(payload.offsets.is_empty());
    }
}
