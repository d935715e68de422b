//! # History Network Instance
//!
//! Wires one [`ContentManager`] and one [`GossipManager`] over a shared set of
//! ports. Instances share no state, so a history network and a beacon
//! light-client network can run side by side.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{ConfigError, HistoryConfig};
use crate::domain::HistoryError;
use crate::service::{ContentManager, GossipManager, HistoryPorts};

/// Errors building a network instance.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// One network instance.
pub struct HistoryNetwork {
    content: Arc<ContentManager>,
    gossip: Arc<GossipManager>,
    backfill_worker: Option<JoinHandle<()>>,
}

impl HistoryNetwork {
    pub fn new(config: HistoryConfig, ports: HistoryPorts) -> Result<Self, NetworkError> {
        config.validate()?;

        let gossip = Arc::new(GossipManager::new(
            config.chain_id,
            config.gossip_fanout,
            config.initial_pulse,
            ports.routing.clone(),
            ports.offers.clone(),
        ));
        let content = Arc::new(ContentManager::new(config, &ports, gossip.clone())?);

        info!(
            chain_id = content.config().chain_id,
            height = content.current_height(),
            pulse = gossip.pulse(),
            "[history] Network instance ready"
        );

        Ok(Self {
            content,
            gossip,
            backfill_worker: None,
        })
    }

    pub fn content(&self) -> &Arc<ContentManager> {
        &self.content
    }

    pub fn gossip(&self) -> &Arc<GossipManager> {
        &self.gossip
    }

    /// Start the backfill worker. Must be called inside a tokio runtime.
    pub fn start_backfill(&mut self) {
        if self.backfill_worker.is_none() {
            self.backfill_worker = Some(self.content.spawn_backfill_worker());
        }
    }

    pub fn is_backfilling(&self) -> bool {
        self.backfill_worker
            .as_ref()
            .map_or(false, |worker| !worker.is_finished())
    }

    /// Stop the backfill worker; queued requests stay queued.
    pub fn stop_backfill(&mut self) {
        if let Some(worker) = self.backfill_worker.take() {
            worker.abort();
        }
    }
}

impl Drop for HistoryNetwork {
    fn drop(&mut self) {
        self.stop_backfill();
    }
}
