//! Inbound ports (API) for the history network.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{ContentType, Hash, HistoryError};
use crate::events::HistoryEvent;

/// Content admission API.
///
/// Validation failures are not errors: the item is logged and dropped and the
/// call returns `Ok(())`. Only an unknown content type, a storage failure or an
/// accumulator invariant breach is returned as `Err`.
#[async_trait]
pub trait HistoryContentApi: Send + Sync {
    /// Admit an item from a local caller.
    async fn add_content_to_history(
        &self,
        chain_id: u16,
        content_type: ContentType,
        hash_key: Hash,
        value: &[u8],
    ) -> Result<(), HistoryError>;

    /// Admit an item received from the network under its encoded content key.
    async fn accept_content(&self, content_key: &[u8], value: &[u8]) -> Result<(), HistoryError>;

    /// Subscribe to admission events.
    fn subscribe(&self) -> broadcast::Receiver<HistoryEvent>;
}

/// Gossip control API.
pub trait GossipApi: Send + Sync {
    /// Set the flush threshold if `1 <= rate <= 26`. Returns the pulse in effect.
    fn set_pulse(&self, rate: i64) -> u8;

    /// Queue an item for the nearest peers.
    fn add(&self, hash: Hash, content_type: ContentType);
}
