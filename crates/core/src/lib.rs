//! Block construction and succinct fraud proofs over sharded block data.
//!
//! A block publishes two Merkle roots: a data root over its chunked linear
//! payload and a state root over a sparse key-value store. Intermediate
//! state roots are woven into the payload every [`STEP`] transactions, which
//! couples the two commitments: any checker that re-derives the roots can
//! pin a divergence to one transaction window and assemble a fraud proof a
//! stateless verifier decides from the two roots alone.
//!
//! This crate contains the transaction wire format, the payload layout and
//! chunking, the block builder, the checker / fraud-proof generator, the
//! stateless verifier, and the blockchain that ties them to one shared
//! state tree.

pub mod block;
pub mod chain;
pub mod error;
pub mod fraud;
pub mod tx;
pub mod types;

mod payload;

pub use block::{new_block, Block};
pub use chain::Blockchain;
pub use error::{BlockError, TxError};
pub use fraud::{check_block, verify_fraud_proof, FraudProof};
pub use tx::Transaction;
pub use types::Hash;

/// Number of applied transactions between intermediate state roots.
pub const STEP: usize = 2;

/// Size of a data-tree leaf: one position byte plus the payload slice.
pub const CHUNK_SIZE: usize = 256;

const _: () = assert!(STEP > 0);
const _: () = assert!(CHUNK_SIZE > 1 && CHUNK_SIZE <= 256);
