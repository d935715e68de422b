//! Adapters for the outbound ports.

pub mod memory_store;
pub mod offer_channel;
pub mod receipts;
pub mod rlp_codec;
pub mod routing;

pub use memory_store::InMemoryContentStore;
pub use offer_channel::{ChannelOfferSink, OfferDriver, OfferRequest};
pub use receipts::NoReceipts;
pub use rlp_codec::{keccak256, RlpBlockCodec, EMPTY_TRIE_ROOT};
pub use routing::InMemoryRoutingTable;
