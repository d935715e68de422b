//! # Domain Entities
//!
//! Decoded headers, assembled blocks and accumulator header records.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::Hash;

/// Header fields the admission flow depends on.
///
/// Produced by a `BlockCodec`; `hash` is always recomputed from the raw bytes,
/// never taken from the sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub hash: Hash,
    pub parent_hash: Hash,
    pub number: u64,
    pub difficulty: u128,
    pub uncles_hash: Hash,
    pub transactions_root: Hash,
    pub receipts_root: Hash,
}

/// A block reassembled from a header and a body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledBlock {
    pub header: BlockHeader,
    /// Raw RLP of each transaction
    pub transactions: Vec<Vec<u8>>,
    /// Raw RLP of each uncle header
    pub uncles: Vec<Vec<u8>>,
}

impl AssembledBlock {
    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }
}

/// One entry of an epoch: a block hash and the chain's total difficulty at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub block_hash: Hash,
    pub total_difficulty: u128,
}

impl HeaderRecord {
    pub fn new(block_hash: Hash, total_difficulty: u128) -> Self {
        Self {
            block_hash,
            total_difficulty,
        }
    }

    /// Merkle leaf: `SHA-256(block_hash || total_difficulty as 16 big-endian bytes)`.
    pub fn leaf_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.block_hash);
        hasher.update(self.total_difficulty.to_be_bytes());
        hasher.finalize().into()
    }
}
