//! Cross-component integration flows.

pub mod body_flow;
pub mod gossip_flow;
pub mod keys;
pub mod proof_flow;
pub mod telemetry_flow;

use history_network::test_utils::{memory_ports, MemoryPorts};
use history_network::{HistoryConfig, HistoryEvent, HistoryNetwork};
use tokio::sync::broadcast;

/// A network instance over in-memory ports.
pub struct TestNode {
    pub network: HistoryNetwork,
    pub ports: MemoryPorts,
    pub events: broadcast::Receiver<HistoryEvent>,
}

impl TestNode {
    pub fn new(config: HistoryConfig) -> Self {
        use history_network::HistoryContentApi;

        let (ports, handles) = memory_ports();
        let network = HistoryNetwork::new(config, ports).expect("valid test config");
        let events = network.content().subscribe();
        Self {
            network,
            ports: handles,
            events,
        }
    }

    /// Events received so far.
    pub fn drain_events(&mut self) -> Vec<HistoryEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
