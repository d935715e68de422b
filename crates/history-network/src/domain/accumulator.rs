//! # Header Accumulator
//!
//! Epoch-structured commitment to the canonical header chain.
//!
//! | Structure | Contents |
//! |-----------|----------|
//! | `current_epoch` | Append-only [`HeaderRecord`]s, at most `epoch_size` |
//! | `historical_epochs` | Roots of sealed epochs (master accumulator) |
//! | `verifiers` | Sparse epoch index -> trusted header hash |
//!
//! Epoch `i` holds blocks `genesis + 1 + i * epoch_size ..= genesis + (i + 1) * epoch_size`.
//!
//! ## Sealing
//!
//! [`Accumulator::update_accumulator`] never seals. It reports
//! [`EpochStatus::Full`] when the append filled the epoch, and refuses further
//! appends until the caller has called [`Accumulator::seal_epoch`]. The seal
//! therefore always completes before the next successor is appended.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::{BlockHeader, HeaderRecord};
use super::errors::{AccumulatorError, Hash};
use super::proof::{encode_epoch, epoch_root, HeaderProof};

/// Headers per epoch.
pub const EPOCH_SIZE: usize = 8192;

/// Epoch indices admitted unconditionally into `verifiers`.
pub const BOOTSTRAP_VERIFIERS: usize = 3;

/// The block the accumulator counts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAnchor {
    pub number: u64,
    pub hash: Hash,
    pub total_difficulty: u128,
}

/// Result of an append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpochStatus {
    /// Room remains in the current epoch.
    Open,
    /// The append filled the epoch; seal before the next append.
    Full,
}

/// A freshly sealed epoch, ready to be persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedEpoch {
    pub index: u64,
    pub root: Hash,
    pub records: Vec<HeaderRecord>,
    pub encoded: Vec<u8>,
}

/// Transmissible accumulator state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorSnapshot {
    pub historical_epochs: Vec<Hash>,
    pub current_epoch: Vec<HeaderRecord>,
}

impl AccumulatorSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, AccumulatorError> {
        bincode::serialize(self).map_err(|e| AccumulatorError::Encoding(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, AccumulatorError> {
        bincode::deserialize(bytes).map_err(|e| AccumulatorError::MalformedSnapshot(e.to_string()))
    }
}

/// Header accumulator owned by one network instance.
#[derive(Clone, Debug)]
pub struct Accumulator {
    epoch_size: usize,
    genesis: GenesisAnchor,
    historical_epochs: Vec<Hash>,
    current_epoch: Vec<HeaderRecord>,
    verifiers: BTreeMap<u64, Hash>,
    /// Last admitted record; survives sealing.
    tip: Option<HeaderRecord>,
}

impl Accumulator {
    pub fn new(genesis: GenesisAnchor, epoch_size: usize) -> Self {
        Self {
            epoch_size,
            genesis,
            historical_epochs: Vec::new(),
            current_epoch: Vec::with_capacity(epoch_size),
            verifiers: BTreeMap::new(),
            tip: Some(HeaderRecord::new(genesis.hash, genesis.total_difficulty)),
        }
    }

    /// Rebuild from a persisted snapshot.
    pub fn from_snapshot(
        genesis: GenesisAnchor,
        epoch_size: usize,
        snapshot: AccumulatorSnapshot,
    ) -> Result<Self, AccumulatorError> {
        let mut accumulator = Self::new(genesis, epoch_size);
        accumulator.check_snapshot(&snapshot)?;
        accumulator.commit_snapshot(snapshot);
        Ok(accumulator)
    }

    pub fn epoch_size(&self) -> usize {
        self.epoch_size
    }

    pub fn genesis(&self) -> &GenesisAnchor {
        &self.genesis
    }

    pub fn current_epoch(&self) -> &[HeaderRecord] {
        &self.current_epoch
    }

    pub fn historical_epochs(&self) -> &[Hash] {
        &self.historical_epochs
    }

    pub fn verifiers(&self) -> &BTreeMap<u64, Hash> {
        &self.verifiers
    }

    /// Height of the last admitted header, or the genesis height.
    pub fn current_height(&self) -> u64 {
        let admitted = self.historical_epochs.len() * self.epoch_size + self.current_epoch.len();
        self.genesis.number + admitted as u64
    }

    /// Tip hash. `None` only when restored from a snapshot that ends exactly
    /// on an epoch boundary.
    pub fn last_block_hash(&self) -> Option<Hash> {
        self.tip.map(|record| record.block_hash)
    }

    /// `number == current_height + 1` and the parent is the tip.
    pub fn is_successor(&self, header: &BlockHeader) -> bool {
        header.number == self.current_height() + 1
            && self.last_block_hash() == Some(header.parent_hash)
    }

    pub fn is_epoch_full(&self) -> bool {
        self.current_epoch.len() >= self.epoch_size
    }

    /// Epoch a block number falls into.
    pub fn epoch_index_of(&self, number: u64) -> u64 {
        number.saturating_sub(self.genesis.number + 1) / self.epoch_size as u64
    }

    /// Append `header` to the current epoch.
    ///
    /// The caller must have checked [`Self::is_successor`] and sealed a full
    /// epoch first.
    pub fn update_accumulator(
        &mut self,
        header: &BlockHeader,
    ) -> Result<EpochStatus, AccumulatorError> {
        if self.is_epoch_full() {
            return Err(AccumulatorError::EpochFull {
                size: self.epoch_size,
            });
        }

        let tip = match self.tip {
            Some(tip) if self.is_successor(header) => tip,
            _ => {
                return Err(AccumulatorError::NotSuccessor {
                    number: header.number,
                    height: self.current_height(),
                })
            }
        };

        let record = HeaderRecord::new(
            header.hash,
            tip.total_difficulty.saturating_add(header.difficulty),
        );
        self.current_epoch.push(record);
        self.tip = Some(record);

        if self.is_epoch_full() {
            Ok(EpochStatus::Full)
        } else {
            Ok(EpochStatus::Open)
        }
    }

    /// Seal the full current epoch into the master accumulator.
    pub fn seal_epoch(&mut self) -> Result<SealedEpoch, AccumulatorError> {
        if !self.is_epoch_full() {
            return Err(AccumulatorError::EpochNotFull {
                len: self.current_epoch.len(),
                size: self.epoch_size,
            });
        }

        let encoded = encode_epoch(&self.current_epoch)
            .map_err(|e| AccumulatorError::Encoding(e.to_string()))?;
        let records = std::mem::take(&mut self.current_epoch);
        let root = epoch_root(&records);
        let index = self.historical_epochs.len() as u64;
        self.historical_epochs.push(root);

        Ok(SealedEpoch {
            index,
            root,
            records,
            encoded,
        })
    }

    pub fn snapshot(&self) -> AccumulatorSnapshot {
        AccumulatorSnapshot {
            historical_epochs: self.historical_epochs.clone(),
            current_epoch: self.current_epoch.clone(),
        }
    }

    pub fn encode_snapshot(&self) -> Result<Vec<u8>, AccumulatorError> {
        self.snapshot().encode()
    }

    /// Merge a snapshot received from a peer.
    ///
    /// The snapshot is decoded and checked in full before anything is
    /// committed; on error local state is unchanged.
    pub fn receive_snapshot(&mut self, bytes: &[u8]) -> Result<(), AccumulatorError> {
        let snapshot = AccumulatorSnapshot::decode(bytes)?;
        self.check_snapshot(&snapshot)?;
        self.commit_snapshot(snapshot);
        Ok(())
    }

    fn commit_snapshot(&mut self, snapshot: AccumulatorSnapshot) {
        self.tip = match snapshot.current_epoch.last() {
            Some(record) => Some(*record),
            // Nothing new; keep the tip we already know
            None if snapshot.historical_epochs == self.historical_epochs => self.tip,
            None => None,
        };
        self.historical_epochs = snapshot.historical_epochs;
        self.current_epoch = snapshot.current_epoch;
    }

    fn check_snapshot(&self, snapshot: &AccumulatorSnapshot) -> Result<(), AccumulatorError> {
        if snapshot.current_epoch.len() > self.epoch_size {
            return Err(AccumulatorError::MalformedSnapshot(format!(
                "current epoch holds {} records, limit {}",
                snapshot.current_epoch.len(),
                self.epoch_size
            )));
        }

        let admitted =
            snapshot.historical_epochs.len() * self.epoch_size + snapshot.current_epoch.len();
        let height = self.genesis.number + admitted as u64;
        if height < self.current_height() {
            return Err(AccumulatorError::SnapshotRejected(format!(
                "height {} is below local height {}",
                height,
                self.current_height()
            )));
        }

        if !snapshot
            .historical_epochs
            .starts_with(&self.historical_epochs)
        {
            return Err(AccumulatorError::SnapshotRejected(
                "sealed epochs diverge from local master accumulator".to_string(),
            ));
        }

        if snapshot.historical_epochs.len() == self.historical_epochs.len()
            && !snapshot.current_epoch.starts_with(&self.current_epoch)
        {
            return Err(AccumulatorError::SnapshotRejected(
                "current epoch diverges from local records".to_string(),
            ));
        }

        Ok(())
    }

    /// Record `hash` as the trusted header for `epoch_index`.
    ///
    /// While fewer than [`BOOTSTRAP_VERIFIERS`] entries exist any index is
    /// written, replacing an existing entry. Afterwards only absent indices are
    /// added.
    pub fn observe_verifier(&mut self, epoch_index: u64, hash: Hash) {
        if self.verifiers.len() < BOOTSTRAP_VERIFIERS {
            self.verifiers.insert(epoch_index, hash);
        } else {
            self.verifiers.entry(epoch_index).or_insert(hash);
        }
    }

    /// Check that `proof` places `header_hash` in a trusted epoch.
    ///
    /// A sealed epoch is checked by root. For an epoch not sealed locally the
    /// path is ignored: the header must be that epoch's verifier, or its
    /// record must already sit in the open epoch.
    pub fn verify_inclusion_proof(&self, proof: &HeaderProof, header_hash: &Hash) -> bool {
        if &proof.record.block_hash != header_hash {
            return false;
        }

        if let Some(root) = self.historical_epochs.get(proof.epoch_index as usize) {
            return *root == proof.claimed_root();
        }

        if self.verifiers.get(&proof.epoch_index) == Some(header_hash) {
            return true;
        }
        proof.epoch_index == self.historical_epochs.len() as u64
            && self.current_epoch.contains(&proof.record)
    }
}
