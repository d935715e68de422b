//! Ports layer: inbound API traits and outbound collaborator traits.

pub mod inbound;
pub mod outbound;

pub use inbound::{GossipApi, HistoryContentApi};
pub use outbound::{
    BlockCodec, ContentLookup, ContentStore, OfferSink, OfferTransport, ReceiptManager,
    RoutingTable,
};
