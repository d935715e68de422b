//! # Gossip Queues
//!
//! Per-peer pending offers and the pulse that bounds them.
//!
//! A queue fills with distinct content keys until its length reaches the
//! pulse, at which point the whole batch is handed back for a single OFFER and
//! the queue starts over empty.

use std::collections::HashMap;

use super::content_key::{ContentKey, NodeId};

/// Smallest accepted pulse.
pub const MIN_PULSE: u8 = 1;

/// Largest accepted pulse.
pub const MAX_PULSE: u8 = 26;

/// Batch size that triggers a flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pulse(u8);

impl Pulse {
    /// `None` unless `MIN_PULSE <= rate <= MAX_PULSE`.
    pub fn new(rate: i64) -> Option<Self> {
        if (MIN_PULSE as i64..=MAX_PULSE as i64).contains(&rate) {
            Some(Self(rate as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Pulse {
    fn default() -> Self {
        Self(MAX_PULSE)
    }
}

/// Ordered, deduplicated keys awaiting an offer to one peer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GossipQueue {
    keys: Vec<ContentKey>,
}

impl GossipQueue {
    /// Append `key` unless already queued. Returns whether it was added.
    pub fn enqueue(&mut self, key: ContentKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[ContentKey] {
        &self.keys
    }

    /// Remove and return every queued key.
    pub fn drain(&mut self) -> Vec<ContentKey> {
        std::mem::take(&mut self.keys)
    }
}

/// All peer queues of one network instance.
#[derive(Debug, Default)]
pub struct GossipQueues {
    pulse: Pulse,
    queues: HashMap<NodeId, GossipQueue>,
}

impl GossipQueues {
    pub fn new(pulse: Pulse) -> Self {
        Self {
            pulse,
            queues: HashMap::new(),
        }
    }

    pub fn pulse(&self) -> Pulse {
        self.pulse
    }

    /// Apply `rate` if in range. Returns the pulse now in effect.
    pub fn set_pulse(&mut self, rate: i64) -> u8 {
        if let Some(pulse) = Pulse::new(rate) {
            self.pulse = pulse;
        }
        self.pulse.get()
    }

    /// Queue `key` for `peer`. When the queue reaches the pulse its contents
    /// are returned as a batch and the queue is left empty.
    pub fn enqueue(&mut self, peer: NodeId, key: ContentKey) -> Option<Vec<ContentKey>> {
        let threshold = self.pulse.get() as usize;
        let queue = self.queues.entry(peer).or_default();
        queue.enqueue(key);

        if queue.len() >= threshold {
            Some(queue.drain())
        } else {
            None
        }
    }

    /// Keys pending for `peer`.
    pub fn pending(&self, peer: &NodeId) -> usize {
        self.queues.get(peer).map_or(0, GossipQueue::len)
    }

    /// Peers that have a queue, flushed or not.
    pub fn peer_count(&self) -> usize {
        self.queues.len()
    }
}
