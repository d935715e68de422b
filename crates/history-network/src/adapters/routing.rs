//! In-memory routing table: a flat peer set ordered by XOR distance on demand.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::domain::{ContentId, ContentKey, NodeId};
use crate::ports::RoutingTable;

#[derive(Default)]
struct RoutingState {
    peers: Vec<NodeId>,
    known_content: HashMap<NodeId, HashSet<ContentKey>>,
}

/// Routing table over an explicit peer list.
#[derive(Default)]
pub struct InMemoryRoutingTable {
    state: RwLock<RoutingState>,
}

impl InMemoryRoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&self, peer: NodeId) {
        let mut state = self.state.write();
        if !state.peers.contains(&peer) {
            state.peers.push(peer);
        }
    }

    pub fn remove_peer(&self, peer: &NodeId) {
        let mut state = self.state.write();
        state.peers.retain(|p| p != peer);
        state.known_content.remove(peer);
    }

    /// Record that `peer` holds `key`.
    pub fn mark_known(&self, peer: NodeId, key: ContentKey) {
        self.state
            .write()
            .known_content
            .entry(peer)
            .or_default()
            .insert(key);
    }
}

impl RoutingTable for InMemoryRoutingTable {
    fn nearest(&self, id: &ContentId, k: usize) -> Vec<NodeId> {
        let mut peers = self.state.read().peers.clone();
        peers.sort_by_key(|peer| peer.distance_to(id));
        peers.truncate(k);
        peers
    }

    fn content_key_known_to_peer(&self, peer: &NodeId, key: &ContentKey) -> bool {
        self.state
            .read()
            .known_content
            .get(peer)
            .map_or(false, |keys| keys.contains(key))
    }

    fn all_known_peers(&self) -> Vec<NodeId> {
        self.state.read().peers.clone()
    }
}
