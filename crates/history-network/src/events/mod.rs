//! # History Events
//!
//! Admission results published to logging and UI collaborators over a
//! `tokio::sync::broadcast` channel.
//!
//! | Event | Emitted for |
//! |-------|-------------|
//! | `ContentAdded` | every stored item except proofs and accumulator snapshots |
//! | `Verified` | every `HeaderProof`, valid or not |

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{ContentType, Hash};

/// Default broadcast capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Events emitted by the content manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// An item passed validation and was stored.
    ContentAdded {
        hash_key: Hash,
        content_type: ContentType,
        /// `0x`-prefixed hex of the stored value
        value_hex: String,
    },

    /// Result of a header inclusion proof check.
    Verified { hash_key: Hash, verified: bool },
}

impl HistoryEvent {
    pub fn content_added(hash_key: Hash, content_type: ContentType, value: &[u8]) -> Self {
        Self::ContentAdded {
            hash_key,
            content_type,
            value_hex: format!("0x{}", hex::encode(value)),
        }
    }
}

/// Broadcast publisher for [`HistoryEvent`]s.
pub struct EventEmitter {
    sender: broadcast::Sender<HistoryEvent>,
    events_emitted: AtomicU64,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_emitted: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`. Returns the number of receivers; zero is not an error.
    pub fn emit(&self, event: HistoryEvent) -> usize {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("[history] event dropped, no subscribers");
                0
            }
        }
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
