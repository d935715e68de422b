//! # Portal History Network
//!
//! Content admission and gossip for a Kademlia-style overlay that stores
//! historical chain data (headers, bodies, receipts) and lets any node verify
//! an old header against a compact header accumulator.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Responsibilities
//!
//! | Component | Role |
//! |-----------|------|
//! | `Accumulator` | Epoch-structured header commitment, inclusion proofs |
//! | `ContentManager` | Per-type validation, epoch sealing, persistence, backfill |
//! | `GossipManager` | Per-peer queues flushed as one OFFER at the pulse |
//! | `HistoryNetwork` | One owned instance wiring the above over its ports |
//!
//! ## Module Structure
//!
//! ```text
//! history-network/
//! ├── domain/      # Content keys, accumulator, Merkle proofs, gossip queues, errors
//! ├── ports/       # API traits (inbound) + collaborator traits (outbound)
//! ├── service/     # ContentManager, GossipManager, backfill queue
//! ├── events/      # HistoryEvent broadcast
//! ├── adapters/    # In-memory store/routing, RLP codec, offer channel
//! ├── network.rs   # HistoryNetwork
//! └── config.rs    # HistoryConfig
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let (ports, _) = test_utils::memory_ports();
//! let mut network = HistoryNetwork::new(HistoryConfig::default(), ports)?;
//! network.start_backfill();
//! network
//!     .content()
//!     .add_content_to_history(1, ContentType::BlockHeader, hash, &raw_header)
//!     .await?;
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod network;
pub mod ports;
pub mod service;

/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use adapters::{
    ChannelOfferSink, InMemoryContentStore, InMemoryRoutingTable, NoReceipts, OfferDriver,
    OfferRequest, RlpBlockCodec,
};
pub use config::{ConfigError, HistoryConfig};
pub use domain::{
    Accumulator, AccumulatorError, AccumulatorSnapshot, BeaconContentKey, BlockHeader,
    CodecError, ContentId, ContentKey, ContentType, GenesisAnchor, Hash, HeaderProof,
    HeaderRecord, HistoryError, LookupError, NodeId, StoreError, EPOCH_SIZE,
};
pub use events::HistoryEvent;
pub use network::{HistoryNetwork, NetworkError};
pub use ports::{
    BlockCodec, ContentLookup, ContentStore, GossipApi, HistoryContentApi, OfferSink,
    OfferTransport, ReceiptManager, RoutingTable,
};
pub use service::{ContentManager, GossipManager, HistoryPorts};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
