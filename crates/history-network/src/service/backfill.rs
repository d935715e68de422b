//! # Backfill Queue
//!
//! Lookups scheduled while processing an epoch. Requests are queued instead of
//! awaited so an epoch pass never blocks on the network and admission never
//! re-enters itself.
//!
//! The queue is bounded. When it is full new requests are dropped and counted
//! in `ph_backfill_dropped_total`; the next epoch pass schedules them again.

use history_telemetry::metrics::BACKFILL_DROPPED;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::domain::ContentKey;

/// One missing item to fetch and admit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackfillRequest {
    pub key: ContentKey,
}

/// Bounded FIFO of backfill requests.
pub struct BackfillQueue {
    sender: mpsc::Sender<BackfillRequest>,
    receiver: Mutex<mpsc::Receiver<BackfillRequest>>,
}

impl BackfillQueue {
    /// `capacity` must be non-zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Queue `key`. Returns `false` if the request was dropped.
    pub fn push(&self, key: ContentKey) -> bool {
        match self.sender.try_send(BackfillRequest { key }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                BACKFILL_DROPPED.inc();
                trace!(key = %key, "[history] backfill queue full, request dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(key = %key, "[history] backfill queue closed, request dropped");
                false
            }
        }
    }

    /// Next request without waiting.
    ///
    /// Returns `None` when the queue is empty or a worker holds the receiver.
    pub fn try_next(&self) -> Option<BackfillRequest> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// Wait for the next request.
    pub async fn next(&self) -> Option<BackfillRequest> {
        self.receiver.lock().await.recv().await
    }
}
