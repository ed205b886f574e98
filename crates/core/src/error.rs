//! Error types for transactions, blocks, and the chain.

use thiserror::Error;

use shardproof_merkle::MerkleError;
use shardproof_smt::SmtError;

/// Transaction construction and decoding failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// The five field sequences disagree in length.
    #[error(
        "field count mismatch: {write_keys} write keys, {new_data} new values, \
         {old_data} old values, {read_keys} read keys, {read_data} read values"
    )]
    FieldCountMismatch {
        write_keys: usize,
        new_data: usize,
        old_data: usize,
        read_keys: usize,
        read_data: usize,
    },

    /// The free-form blob must stay empty in this configuration.
    #[error("arbitrary payload must be empty")]
    ArbitraryNotEmpty,

    /// A single field does not fit a u16 length prefix.
    #[error("field of {len} bytes does not fit a u16 length prefix")]
    FieldTooLong { len: usize },

    /// The whole encoding does not fit a u16.
    #[error("encoded transaction of {len} bytes does not fit a u16")]
    EncodingTooLong { len: usize },

    /// The buffer ended inside a declared field.
    #[error("truncated encoding: needed {needed} more bytes")]
    Truncated { needed: usize },

    /// Bytes were left over after a full transaction was decoded.
    #[error("{len} trailing bytes after transaction encoding")]
    TrailingBytes { len: usize },
}

/// Block construction and checking failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// A transaction failed its shape or format checks.
    #[error(transparent)]
    Tx(#[from] TxError),

    /// The declared intermediate state roots cannot cover the transactions.
    #[error("expected {expected} intermediate state roots, got {got}")]
    InterRootCount { expected: usize, got: usize },

    /// Two transactions share a fingerprint, so payload offsets would be
    /// ambiguous.
    #[error("duplicate transaction fingerprint at index {index}")]
    DuplicateTransaction { index: usize },

    /// Surfaced from the state tree.
    #[error(transparent)]
    Smt(#[from] SmtError),

    /// Surfaced from the data tree.
    #[error(transparent)]
    Merkle(#[from] MerkleError),
}
