//! # History Network Configuration
//!
//! One [`HistoryConfig`] per network instance.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{GenesisAnchor, Hash, NodeId, EPOCH_SIZE, MAX_PULSE, MIN_PULSE};
use crate::events::DEFAULT_EVENT_CAPACITY;

/// Mainnet chain id.
pub const MAINNET_CHAIN_ID: u16 = 1;

/// Mainnet genesis block hash.
pub const MAINNET_GENESIS_HASH: Hash = [
    0xd4, 0xe5, 0x67, 0x40, 0xf8, 0x76, 0xae, 0xf8, 0xc0, 0x10, 0xb8, 0x6a, 0x40, 0xd5, 0xf5, 0x67,
    0x45, 0xa1, 0x18, 0xd0, 0x90, 0x6a, 0x34, 0xe6, 0x9a, 0xec, 0x8c, 0x0d, 0xb1, 0xcb, 0x8f, 0xa3,
];

/// Mainnet genesis difficulty.
pub const MAINNET_GENESIS_DIFFICULTY: u128 = 17_179_869_184;

/// Pending backfill lookups; two epochs' worth of headers and bodies.
pub const DEFAULT_BACKFILL_QUEUE_CAPACITY: usize = 2 * EPOCH_SIZE;

/// Peers each new item is offered to.
pub const DEFAULT_GOSSIP_FANOUT: usize = 5;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("epoch_size must be non-zero")]
    ZeroEpochSize,

    #[error("gossip_fanout must be non-zero")]
    ZeroFanout,

    #[error("initial_pulse {0} outside [1, 26]")]
    PulseOutOfRange(u8),

    #[error("event_channel_capacity must be non-zero")]
    ZeroEventCapacity,

    #[error("backfill_queue_capacity must be non-zero")]
    ZeroBackfillCapacity,
}

/// History network configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Chain id carried in every content key.
    pub chain_id: u16,

    /// Local node id, used for radius checks.
    pub local_node_id: Hash,

    /// Storage radius: content within this XOR distance is stored locally.
    pub radius: U256,

    /// Block the accumulator counts from.
    pub genesis: GenesisAnchor,

    /// Headers per epoch.
    pub epoch_size: usize,

    /// Nearest peers each item is queued for.
    pub gossip_fanout: usize,

    /// Queue length that triggers an OFFER.
    pub initial_pulse: u8,

    /// Upper bound on fetching a missing header for a block body.
    pub header_lookup_timeout_ms: u64,

    /// Broadcast capacity for history events.
    pub event_channel_capacity: usize,

    /// Pending backfill lookups; requests beyond this are dropped.
    pub backfill_queue_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            chain_id: MAINNET_CHAIN_ID,
            local_node_id: [0u8; 32],
            radius: U256::MAX,
            genesis: GenesisAnchor {
                number: 0,
                hash: MAINNET_GENESIS_HASH,
                total_difficulty: MAINNET_GENESIS_DIFFICULTY,
            },
            epoch_size: EPOCH_SIZE,
            gossip_fanout: DEFAULT_GOSSIP_FANOUT,
            initial_pulse: MAX_PULSE,
            header_lookup_timeout_ms: 5_000,
            event_channel_capacity: DEFAULT_EVENT_CAPACITY,
            backfill_queue_capacity: DEFAULT_BACKFILL_QUEUE_CAPACITY,
        }
    }
}

impl HistoryConfig {
    /// Create a config for testing (small epochs, short timeouts).
    pub fn for_testing() -> Self {
        Self {
            epoch_size: 16,
            header_lookup_timeout_ms: 200,
            event_channel_capacity: 4096,
            ..Self::default()
        }
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.local_node_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epoch_size == 0 {
            return Err(ConfigError::ZeroEpochSize);
        }
        if self.gossip_fanout == 0 {
            return Err(ConfigError::ZeroFanout);
        }
        if !(MIN_PULSE..=MAX_PULSE).contains(&self.initial_pulse) {
            return Err(ConfigError::PulseOutOfRange(self.initial_pulse));
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if self.backfill_queue_capacity == 0 {
            return Err(ConfigError::ZeroBackfillCapacity);
        }
        Ok(())
    }
}
