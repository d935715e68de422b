//! # Gossip Manager
//!
//! Queues newly admitted content for the peers nearest its content id and
//! flushes a peer's queue as one OFFER once it reaches the pulse.
//!
//! The manager knows nothing about validation. It is handed items after they
//! have been stored, asks the routing table who should have them, and passes
//! full batches to the [`OfferSink`] without waiting for delivery.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

use history_telemetry::metrics::{GOSSIP_KEYS_OFFERED, GOSSIP_OFFERS};

use crate::domain::{ContentKey, ContentType, GossipQueues, Hash, NodeId, Pulse};
use crate::ports::{GossipApi, OfferSink, RoutingTable};

/// Per-instance gossip state and its collaborators.
pub struct GossipManager {
    chain_id: u16,
    fanout: usize,
    routing: Arc<dyn RoutingTable>,
    offers: Arc<dyn OfferSink>,
    queues: Mutex<GossipQueues>,
}

impl GossipManager {
    pub fn new(
        chain_id: u16,
        fanout: usize,
        initial_pulse: u8,
        routing: Arc<dyn RoutingTable>,
        offers: Arc<dyn OfferSink>,
    ) -> Self {
        let pulse = Pulse::new(initial_pulse as i64).unwrap_or_default();
        Self {
            chain_id,
            fanout,
            routing,
            offers,
            queues: Mutex::new(GossipQueues::new(pulse)),
        }
    }

    pub fn pulse(&self) -> u8 {
        self.queues.lock().pulse().get()
    }

    /// Keys waiting for `peer`.
    pub fn pending(&self, peer: &NodeId) -> usize {
        self.queues.lock().pending(peer)
    }

    /// Queue `key` for its nearest peers and flush any queue that filled up.
    pub fn add_key(&self, key: ContentKey) {
        let content_id = key.content_id();
        let targets: Vec<NodeId> = self
            .routing
            .nearest(&content_id, self.fanout)
            .into_iter()
            .filter(|peer| {
                let known = self.routing.content_key_known_to_peer(peer, &key);
                if known {
                    trace!(peer = %peer, key = %key, "[history] peer already holds key");
                }
                !known
            })
            .collect();

        let batches: Vec<(NodeId, Vec<ContentKey>)> = {
            let mut queues = self.queues.lock();
            targets
                .into_iter()
                .filter_map(|peer| queues.enqueue(peer, key).map(|batch| (peer, batch)))
                .collect()
        };

        for (peer, keys) in batches {
            self.flush(peer, keys);
        }
    }

    fn flush(&self, peer: NodeId, keys: Vec<ContentKey>) {
        debug!(peer = %peer, keys = keys.len(), "[history] Flushing gossip queue");
        GOSSIP_OFFERS.inc();
        GOSSIP_KEYS_OFFERED.inc_by(keys.len() as u64);
        self.offers.dispatch_offer(peer, keys);
    }
}

impl GossipApi for GossipManager {
    fn set_pulse(&self, rate: i64) -> u8 {
        let mut queues = self.queues.lock();
        let before = queues.pulse().get();
        let after = queues.set_pulse(rate);
        if before == after && rate != after as i64 {
            debug!(rate, pulse = after, "[history] Pulse out of range, unchanged");
        }
        after
    }

    fn add(&self, hash: Hash, content_type: ContentType) {
        self.add_key(ContentKey::new(content_type, self.chain_id, hash));
    }
}
