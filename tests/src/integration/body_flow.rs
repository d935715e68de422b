//! # Body and Backfill Flow
//!
//! Block bodies admitted against local and fetched headers, and epoch-driven
//! backfill that pulls both back from the network.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use history_network::test_utils::{body_rlp, ChainBuilder};
    use history_network::{ContentKey, ContentStore, ContentType, HistoryConfig, HistoryEvent};

    use crate::integration::TestNode;

    fn content_added(events: &[HistoryEvent]) -> Vec<ContentType> {
        events
            .iter()
            .filter_map(|event| match event {
                HistoryEvent::ContentAdded { content_type, .. } => Some(*content_type),
                _ => None,
            })
            .collect()
    }

    // =============================================================================
    // BODY ADMISSION
    // =============================================================================

    #[tokio::test]
    async fn test_body_for_missing_header_with_failed_fetch_is_dropped() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(1);
        let mut node = TestNode::new(config);
        node.ports.lookup.fail_all();

        node.network
            .content()
            .add_content_to_history(1, ContentType::BlockBody, chain[0].hash, &body_rlp())
            .await
            .unwrap();

        assert!(node.ports.store.is_empty());
        assert_eq!(node.ports.lookup.calls(), 1);
        assert!(content_added(&node.drain_events()).is_empty());
    }

    #[tokio::test]
    async fn test_body_fetches_and_admits_missing_header() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(1);
        let mut node = TestNode::new(config);
        let header_key = ContentKey::new(ContentType::BlockHeader, 1, chain[0].hash);
        node.ports.lookup.insert(header_key, chain[0].rlp.clone());

        node.network
            .content()
            .add_content_to_history(1, ContentType::BlockBody, chain[0].hash, &body_rlp())
            .await
            .unwrap();

        let content = node.network.content();
        assert_eq!(content.current_height(), 1);
        assert_eq!(
            content.get_content(&header_key).unwrap(),
            Some(chain[0].rlp.clone())
        );
        let body_key = ContentKey::new(ContentType::BlockBody, 1, chain[0].hash);
        assert_eq!(content.get_content(&body_key).unwrap(), Some(body_rlp()));

        assert_eq!(
            content_added(&node.drain_events()),
            vec![ContentType::BlockHeader, ContentType::BlockBody]
        );
    }

    #[tokio::test]
    async fn test_body_assembling_into_other_block_is_dropped() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(2);
        let node = TestNode::new(config);

        // Block 1's header sits where block 2's header should be
        let header_key = ContentKey::new(ContentType::BlockHeader, 1, chain[1].hash);
        node.ports
            .store
            .put(&header_key.content_id(), &chain[0].rlp)
            .unwrap();

        let content = node.network.content();
        content
            .add_content_to_history(1, ContentType::BlockBody, chain[1].hash, &body_rlp())
            .await
            .unwrap();

        let body_key = ContentKey::new(ContentType::BlockBody, 1, chain[1].hash);
        assert_eq!(content.get_content(&body_key).unwrap(), None);
        assert_eq!(node.ports.lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_dropped() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(1);
        let node = TestNode::new(config);
        let content = node.network.content();
        content
            .add_content_to_history(1, ContentType::BlockHeader, chain[0].hash, &chain[0].rlp)
            .await
            .unwrap();

        content
            .add_content_to_history(1, ContentType::BlockBody, chain[0].hash, &[0xc0])
            .await
            .unwrap();

        let body_key = ContentKey::new(ContentType::BlockBody, 1, chain[0].hash);
        assert_eq!(content.get_content(&body_key).unwrap(), None);
    }

    // =============================================================================
    // BACKFILL
    // =============================================================================

    /// A node that has the first `epoch_size + 1` headers and serves the
    /// whole first epoch (headers and bodies) through its lookup.
    async fn seed_and_serve(config: &HistoryConfig) -> (Vec<u8>, TestNode) {
        let chain = ChainBuilder::from_config(config).build(config.epoch_size as u64 + 1);
        let source = TestNode::new(config.clone());
        for header in &chain {
            source
                .network
                .content()
                .add_content_to_history(1, ContentType::BlockHeader, header.hash, &header.rlp)
                .await
                .unwrap();
        }
        let root = source.network.content().historical_epochs()[0];
        let epoch_key = ContentKey::new(ContentType::EpochAccumulator, 1, root);
        let epoch = source
            .network
            .content()
            .get_content(&epoch_key)
            .unwrap()
            .unwrap();

        let target = TestNode::new(config.clone());
        for header in &chain[..config.epoch_size] {
            target.ports.lookup.insert(
                ContentKey::new(ContentType::BlockHeader, 1, header.hash),
                header.rlp.clone(),
            );
            target.ports.lookup.insert(
                ContentKey::new(ContentType::BlockBody, 1, header.hash),
                body_rlp(),
            );
        }
        (epoch, target)
    }

    #[tokio::test]
    async fn test_received_epoch_backfills_headers_and_bodies() {
        let config = HistoryConfig::for_testing();
        let epoch_size = config.epoch_size;
        let (epoch, target) = seed_and_serve(&config).await;
        let records = history_network::domain::decode_epoch(&epoch).unwrap();
        let root = history_network::domain::epoch_root(&records);
        let content = target.network.content();

        content
            .add_content_to_history(1, ContentType::EpochAccumulator, root, &epoch)
            .await
            .unwrap();
        assert_eq!(content.drain_backfill().await, epoch_size * 2);

        assert_eq!(content.current_height(), epoch_size as u64);
        for record in &records {
            let body_key = ContentKey::new(ContentType::BlockBody, 1, record.block_hash);
            assert!(content.get_content(&body_key).unwrap().is_some());
        }

        // Everything is stored now, so a second copy queues nothing
        content
            .add_content_to_history(1, ContentType::EpochAccumulator, root, &epoch)
            .await
            .unwrap();
        assert_eq!(content.drain_backfill().await, 0);
    }

    #[tokio::test]
    async fn test_backfill_worker_runs_in_background() {
        let config = HistoryConfig::for_testing();
        let epoch_size = config.epoch_size as u64;
        let (epoch, mut target) = seed_and_serve(&config).await;
        let records = history_network::domain::decode_epoch(&epoch).unwrap();
        let root = history_network::domain::epoch_root(&records);

        target.network.start_backfill();
        let content = target.network.content().clone();
        content
            .add_content_to_history(1, ContentType::EpochAccumulator, root, &epoch)
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while content.current_height() < epoch_size {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("backfill did not complete");

        assert!(target.network.is_backfilling());
        target.network.stop_backfill();
    }

    #[tokio::test]
    async fn test_backfill_survives_unreachable_network() {
        let config = HistoryConfig::for_testing();
        let (epoch, target) = seed_and_serve(&config).await;
        let records = history_network::domain::decode_epoch(&epoch).unwrap();
        let root = history_network::domain::epoch_root(&records);
        target.ports.lookup.fail_all();

        let content = target.network.content();
        content
            .add_content_to_history(1, ContentType::EpochAccumulator, root, &epoch)
            .await
            .unwrap();

        assert_eq!(content.drain_backfill().await, config.epoch_size * 2);
        assert_eq!(content.current_height(), 0);
        let epoch_key = ContentKey::new(ContentType::EpochAccumulator, 1, root);
        assert!(content.get_content(&epoch_key).unwrap().is_some());
    }
}
