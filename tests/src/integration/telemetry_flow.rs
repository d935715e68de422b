//! # Telemetry Flow
//!
//! Admission, rejection and gossip show up in the Prometheus registry.
//! Counters are process-global and other tests run alongside, so assertions
//! only rely on them growing.

#[cfg(test)]
mod tests {
    use history_network::test_utils::ChainBuilder;
    use history_network::{ContentType, GossipApi, HistoryConfig, NodeId};
    use history_telemetry::{
        gather_text, register_metrics, CONTENT_ADDED, CONTENT_REJECTED, GOSSIP_OFFERS,
    };

    use crate::integration::TestNode;

    #[tokio::test]
    async fn test_admission_and_gossip_are_counted() {
        register_metrics().unwrap();
        let added_before = CONTENT_ADDED.with_label_values(&["block_header"]).get();
        let rejected_before = CONTENT_REJECTED
            .with_label_values(&["block_header", "hash_mismatch"])
            .get();
        let offers_before = GOSSIP_OFFERS.get();

        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(2);
        let node = TestNode::new(config);
        node.ports.routing.add_peer(NodeId::new([1u8; 32]));
        node.network.gossip().set_pulse(1);
        let content = node.network.content();

        content
            .add_content_to_history(1, ContentType::BlockHeader, chain[0].hash, &chain[0].rlp)
            .await
            .unwrap();
        content
            .add_content_to_history(1, ContentType::BlockHeader, chain[0].hash, &chain[1].rlp)
            .await
            .unwrap();

        assert!(CONTENT_ADDED.with_label_values(&["block_header"]).get() > added_before);
        assert!(
            CONTENT_REJECTED
                .with_label_values(&["block_header", "hash_mismatch"])
                .get()
                > rejected_before
        );
        assert!(GOSSIP_OFFERS.get() > offers_before);

        let text = gather_text().unwrap();
        assert!(text.contains("ph_content_added_total"));
        assert!(text.contains("ph_content_rejected_total"));
        assert!(text.contains("ph_gossip_offers_total"));
        assert!(text.contains("ph_accumulator_height"));
    }
}
