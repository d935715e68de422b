//! Application services: content admission, backfill and gossip.

pub mod backfill;
pub mod content_manager;
pub mod gossip_manager;

pub use backfill::{BackfillQueue, BackfillRequest};
pub use content_manager::ContentManager;
pub use gossip_manager::GossipManager;

use std::sync::Arc;

use crate::ports::{
    BlockCodec, ContentLookup, ContentStore, OfferSink, ReceiptManager, RoutingTable,
};

/// Outbound collaborators of one network instance.
#[derive(Clone)]
pub struct HistoryPorts {
    pub store: Arc<dyn ContentStore>,
    pub routing: Arc<dyn RoutingTable>,
    pub lookup: Arc<dyn ContentLookup>,
    pub codec: Arc<dyn BlockCodec>,
    pub receipts: Arc<dyn ReceiptManager>,
    pub offers: Arc<dyn OfferSink>,
}
