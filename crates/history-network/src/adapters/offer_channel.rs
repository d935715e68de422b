//! # Offer Channel
//!
//! [`ChannelOfferSink`] hands OFFER batches to a tokio channel so the gossip
//! manager never waits on the network. [`OfferDriver`] drains that channel
//! and sends each batch over an [`OfferTransport`], once.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::{ContentKey, NodeId};
use crate::ports::{OfferSink, OfferTransport};

/// One OFFER batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferRequest {
    pub peer: NodeId,
    pub keys: Vec<ContentKey>,
}

/// `OfferSink` backed by an unbounded channel.
pub struct ChannelOfferSink {
    sender: mpsc::UnboundedSender<OfferRequest>,
}

impl ChannelOfferSink {
    /// Create a sink and the receiving end for an [`OfferDriver`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OfferRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl OfferSink for ChannelOfferSink {
    fn dispatch_offer(&self, peer: NodeId, keys: Vec<ContentKey>) {
        if self.sender.send(OfferRequest { peer, keys }).is_err() {
            warn!(peer = %peer, "[history] Offer driver gone, batch dropped");
        }
    }
}

/// Sends queued offers over the transport. Failed sends are logged, not retried.
pub struct OfferDriver<T: OfferTransport> {
    transport: Arc<T>,
    receiver: mpsc::UnboundedReceiver<OfferRequest>,
}

impl<T: OfferTransport> OfferDriver<T> {
    pub fn new(transport: Arc<T>, receiver: mpsc::UnboundedReceiver<OfferRequest>) -> Self {
        Self {
            transport,
            receiver,
        }
    }

    /// Run until every sink is dropped. Returns the number of batches delivered.
    pub async fn run(mut self) -> usize {
        let mut delivered = 0;
        while let Some(request) = self.receiver.recv().await {
            let count = request.keys.len();
            match self.transport.send_offer(request.peer, request.keys).await {
                Ok(()) => {
                    delivered += 1;
                    debug!(peer = %request.peer, keys = count, "[history] Offer sent");
                }
                Err(e) => {
                    warn!(peer = %request.peer, error = %e, "[history] Offer failed");
                }
            }
        }
        delivered
    }
}
