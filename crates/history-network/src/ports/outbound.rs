//! # Outbound Ports
//!
//! Traits for the collaborators the core consumes: storage, routing, the
//! find-content protocol, block decoding, receipt derivation and the offer
//! transport.

use async_trait::async_trait;

use crate::domain::{
    AssembledBlock, BlockHeader, CodecError, ContentId, ContentKey, LookupError, NodeId,
    StoreError, TransportError,
};

/// Content-addressed key/value persistence - outbound port.
pub trait ContentStore: Send + Sync {
    /// Store `value` under `id`, replacing any previous value.
    fn put(&self, id: &ContentId, value: &[u8]) -> Result<(), StoreError>;

    /// Fetch the value under `id`; `Ok(None)` when absent.
    fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, StoreError>;

    fn contains(&self, id: &ContentId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }
}

/// Known peers and their content - outbound port.
pub trait RoutingTable: Send + Sync {
    /// Up to `k` peers, closest to `id` first.
    fn nearest(&self, id: &ContentId, k: usize) -> Vec<NodeId>;

    /// Whether `peer` is already known to hold `key`.
    fn content_key_known_to_peer(&self, peer: &NodeId, key: &ContentKey) -> bool;

    fn all_known_peers(&self) -> Vec<NodeId>;

    fn has_peers(&self) -> bool {
        !self.all_known_peers().is_empty()
    }
}

/// Find-content protocol - outbound port.
///
/// Retries and per-hop timeouts belong to the implementation.
#[async_trait]
pub trait ContentLookup: Send + Sync {
    async fn run(&self, key: &ContentKey) -> Result<Vec<u8>, LookupError>;
}

/// Header decoding and block reassembly - outbound port.
pub trait BlockCodec: Send + Sync {
    /// Decode a raw header; the returned hash is recomputed from `raw`.
    fn decode_header(&self, raw: &[u8]) -> Result<BlockHeader, CodecError>;

    /// Rebuild a block from a raw header and a raw body, checking the body
    /// against the header's commitments.
    fn assemble_block(&self, raw_header: &[u8], raw_body: &[u8])
        -> Result<AssembledBlock, CodecError>;
}

/// Receipt derivation - outbound port.
pub trait ReceiptManager: Send + Sync {
    /// Encoded receipts for `block`, or `None` if they cannot be derived.
    fn derive_receipts(&self, block: &AssembledBlock) -> Option<Vec<u8>>;
}

/// Non-blocking hand-off of an OFFER batch - outbound port.
pub trait OfferSink: Send + Sync {
    /// Dispatch `keys` to `peer`. Must not block; never retried.
    fn dispatch_offer(&self, peer: NodeId, keys: Vec<ContentKey>);
}

/// OFFER/ACCEPT wire transport - outbound port.
#[async_trait]
pub trait OfferTransport: Send + Sync {
    async fn send_offer(&self, peer: NodeId, keys: Vec<ContentKey>) -> Result<(), TransportError>;
}
