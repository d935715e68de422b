//! # Gossip Flow
//!
//! Admitted content reaching peers as pulse-sized OFFER batches, both through
//! a recording sink and through the channel sink and offer driver.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use history_network::domain::TransportError;
    use history_network::test_utils::{ChainBuilder, MockLookup};
    use history_network::{
        ChannelOfferSink, ContentKey, ContentType, GossipApi, HistoryConfig, HistoryNetwork,
        HistoryPorts, InMemoryContentStore, InMemoryRoutingTable, NoReceipts, NodeId,
        OfferDriver, OfferTransport, RlpBlockCodec,
    };

    use crate::integration::TestNode;

    fn peer(n: u8) -> NodeId {
        NodeId::new([n; 32])
    }

    // =============================================================================
    // PULSE BATCHING
    // =============================================================================

    #[tokio::test]
    async fn test_headers_offered_in_pulse_sized_batches() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(5);
        let node = TestNode::new(config);
        node.ports.routing.add_peer(peer(1));
        node.ports.routing.add_peer(peer(2));
        assert_eq!(node.network.gossip().set_pulse(2), 2);

        for header in &chain {
            node.network
                .content()
                .add_content_to_history(1, ContentType::BlockHeader, header.hash, &header.rlp)
                .await
                .unwrap();
        }

        let offers = node.ports.offers.offers();
        // Two full batches per peer; the fifth header is still queued
        assert_eq!(offers.len(), 4);
        assert!(offers.iter().all(|(_, keys)| keys.len() == 2));
        assert_eq!(node.network.gossip().pending(&peer(1)), 1);
        assert_eq!(node.network.gossip().pending(&peer(2)), 1);

        let first_to_peer_1: Vec<ContentKey> = offers
            .iter()
            .find(|(p, _)| *p == peer(1))
            .map(|(_, keys)| keys.clone())
            .unwrap();
        assert_eq!(
            first_to_peer_1,
            vec![
                ContentKey::new(ContentType::BlockHeader, 1, chain[0].hash),
                ContentKey::new(ContentType::BlockHeader, 1, chain[1].hash),
            ]
        );
    }

    #[tokio::test]
    async fn test_peer_holding_key_is_skipped() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(1);
        let node = TestNode::new(config);
        node.ports.routing.add_peer(peer(1));
        node.ports.routing.add_peer(peer(2));
        node.ports.routing.mark_known(
            peer(2),
            ContentKey::new(ContentType::BlockHeader, 1, chain[0].hash),
        );
        node.network.gossip().set_pulse(1);

        node.network
            .content()
            .add_content_to_history(1, ContentType::BlockHeader, chain[0].hash, &chain[0].rlp)
            .await
            .unwrap();

        let offers = node.ports.offers.offers();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].0, peer(1));
    }

    #[tokio::test]
    async fn test_no_gossip_without_peers() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(3);
        let node = TestNode::new(config);
        node.network.gossip().set_pulse(1);

        for header in &chain {
            node.network
                .content()
                .add_content_to_history(1, ContentType::BlockHeader, header.hash, &header.rlp)
                .await
                .unwrap();
        }

        assert!(node.ports.offers.offers().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_pulse_keeps_batching() {
        let config = HistoryConfig::for_testing();
        let node = TestNode::new(config);
        let gossip = node.network.gossip();

        assert_eq!(gossip.set_pulse(3), 3);
        assert_eq!(gossip.set_pulse(0), 3);
        assert_eq!(gossip.set_pulse(27), 3);
        assert_eq!(gossip.set_pulse(-5), 3);
        assert_eq!(gossip.pulse(), 3);
    }

    #[tokio::test]
    async fn test_accumulator_and_proofs_never_gossiped() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(2);
        let source = TestNode::new(config.clone());
        for header in &chain {
            source
                .network
                .content()
                .add_content_to_history(1, ContentType::BlockHeader, header.hash, &header.rlp)
                .await
                .unwrap();
        }
        let snapshot_key = ContentKey::header_accumulator(1);
        let snapshot = source
            .network
            .content()
            .get_content(&snapshot_key)
            .unwrap()
            .unwrap();

        let node = TestNode::new(config);
        node.ports.routing.add_peer(peer(1));
        node.network.gossip().set_pulse(1);

        node.network
            .content()
            .accept_content(&snapshot_key.encode(), &snapshot)
            .await
            .unwrap();
        node.network
            .content()
            .add_content_to_history(1, ContentType::HeaderProof, chain[0].hash, &[0xde, 0xad])
            .await
            .unwrap();

        assert_eq!(node.network.content().current_height(), 2);
        assert!(node.ports.offers.offers().is_empty());
        assert_eq!(node.network.gossip().pending(&peer(1)), 0);
    }

    // =============================================================================
    // OFFER DRIVER
    // =============================================================================

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(NodeId, usize)>>,
        refuse: Mutex<Option<NodeId>>,
    }

    #[async_trait]
    impl OfferTransport for RecordingTransport {
        async fn send_offer(
            &self,
            peer: NodeId,
            keys: Vec<ContentKey>,
        ) -> Result<(), TransportError> {
            if *self.refuse.lock() == Some(peer) {
                return Err(TransportError("connection refused".to_string()));
            }
            self.sent.lock().push((peer, keys.len()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_offer_driver_delivers_batches() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(4);

        let routing = Arc::new(InMemoryRoutingTable::new());
        routing.add_peer(peer(1));
        routing.add_peer(peer(2));
        let (sink, receiver) = ChannelOfferSink::new();
        let ports = HistoryPorts {
            store: Arc::new(InMemoryContentStore::new()),
            routing: routing.clone(),
            lookup: Arc::new(MockLookup::new()),
            codec: Arc::new(RlpBlockCodec::new()),
            receipts: Arc::new(NoReceipts),
            offers: Arc::new(sink),
        };

        let transport = Arc::new(RecordingTransport::default());
        *transport.refuse.lock() = Some(peer(2));
        let driver = tokio::spawn(OfferDriver::new(transport.clone(), receiver).run());

        {
            let network = HistoryNetwork::new(config, ports).unwrap();
            network.gossip().set_pulse(2);
            for header in &chain {
                network
                    .content()
                    .add_content_to_history(1, ContentType::BlockHeader, header.hash, &header.rlp)
                    .await
                    .unwrap();
            }
        }

        // Dropping the network drops the last sink, which ends the driver
        let delivered = driver.await.unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(*transport.sent.lock(), vec![(peer(1), 2), (peer(1), 2)]);
    }
}
