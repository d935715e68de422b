//! Domain layer: content addressing, the header accumulator and gossip queues.

pub mod accumulator;
pub mod content_key;
pub mod entities;
pub mod errors;
pub mod gossip;
pub mod proof;

pub use accumulator::{
    Accumulator, AccumulatorSnapshot, EpochStatus, GenesisAnchor, SealedEpoch,
    BOOTSTRAP_VERIFIERS, EPOCH_SIZE,
};
pub use content_key::{
    xor_distance, BeaconContentKey, ContentId, ContentKey, ContentType, NodeId,
};
pub use entities::{AssembledBlock, BlockHeader, HeaderRecord};
pub use errors::{
    AccumulatorError, CodecError, Hash, HistoryError, LookupError, StoreError, TransportError,
};
pub use gossip::{GossipQueue, GossipQueues, Pulse, MAX_PULSE, MIN_PULSE};
pub use proof::{
    build_merkle_path, compute_merkle_root, decode_epoch, encode_epoch, epoch_root,
    fold_merkle_path, HeaderProof, Position, ProofNode,
};
