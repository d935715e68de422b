//! # Epoch Merkle Proofs
//!
//! Epoch roots are binary SHA-256 Merkle roots over [`HeaderRecord`] leaves.
//! An unpaired node at the end of a level is paired with itself.
//!
//! A [`HeaderProof`] shows that a header record is a member of an epoch. The
//! verifier folds the path into a root and compares it with the sealed root in
//! the master accumulator. The path alone proves nothing for an epoch that is
//! not sealed locally, since the sender picks the root it folds to.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::entities::HeaderRecord;
use super::errors::{CodecError, Hash};

/// Side the sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Left,
    Right,
}

/// Sibling hash on a Merkle path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    pub hash: Hash,
    pub position: Position,
}

impl ProofNode {
    pub fn left(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Left,
        }
    }

    pub fn right(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Right,
        }
    }
}

/// Hash two nodes together.
pub fn hash_concat(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|chunk| {
            let left = &chunk[0];
            let right = chunk.get(1).unwrap_or(left);
            hash_concat(left, right)
        })
        .collect()
}

/// Merkle root over leaf hashes. Empty input yields the zero hash.
pub fn compute_merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Sibling path for the leaf at `index`, or `None` when out of range.
pub fn build_merkle_path(leaves: &[Hash], index: usize) -> Option<Vec<ProofNode>> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut index = index;

    while level.len() > 1 {
        let node = if index % 2 == 0 {
            // Unpaired last node is hashed with itself
            let sibling = level.get(index + 1).unwrap_or(&level[index]);
            ProofNode::right(*sibling)
        } else {
            ProofNode::left(level[index - 1])
        };
        path.push(node);

        level = next_level(&level);
        index /= 2;
    }

    Some(path)
}

/// Fold a leaf up a path into the root it implies.
pub fn fold_merkle_path(leaf: &Hash, path: &[ProofNode]) -> Hash {
    path.iter().fold(*leaf, |current, node| match node.position {
        Position::Left => hash_concat(&node.hash, &current),
        Position::Right => hash_concat(&current, &node.hash),
    })
}

/// Root of an epoch.
pub fn epoch_root(records: &[HeaderRecord]) -> Hash {
    let leaves: Vec<Hash> = records.iter().map(HeaderRecord::leaf_hash).collect();
    compute_merkle_root(&leaves)
}

/// Inclusion proof of a header in a sealed epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderProof {
    pub epoch_index: u64,
    pub record: HeaderRecord,
    pub path: Vec<ProofNode>,
}

impl HeaderProof {
    /// Build a proof for `block_hash` from the full record list of an epoch.
    pub fn build(epoch_index: u64, records: &[HeaderRecord], block_hash: &Hash) -> Option<Self> {
        let index = records.iter().position(|r| &r.block_hash == block_hash)?;
        let leaves: Vec<Hash> = records.iter().map(HeaderRecord::leaf_hash).collect();
        let path = build_merkle_path(&leaves, index)?;

        Some(Self {
            epoch_index,
            record: records[index],
            path,
        })
    }

    /// Root the proof claims for its epoch.
    pub fn claimed_root(&self) -> Hash {
        fold_merkle_path(&self.record.leaf_hash(), &self.path)
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Decode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Encode an epoch's records.
pub fn encode_epoch(records: &[HeaderRecord]) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(records).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Decode an epoch's records.
pub fn decode_epoch(bytes: &[u8]) -> Result<Vec<HeaderRecord>, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
