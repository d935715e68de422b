//! # Proof Flow
//!
//! One node builds header inclusion proofs from its sealed epochs; other
//! nodes check them against their own sealed epochs or, before sealing, against
//! the records they have accumulated themselves.

#[cfg(test)]
mod tests {
    use history_network::test_utils::{ChainBuilder, TestHeader};
    use history_network::{
        ContentKey, ContentType, HeaderProof, HeaderRecord, HistoryConfig, HistoryEvent,
    };

    use crate::integration::TestNode;

    const CHAIN_ID: u16 = 1;

    async fn admit_headers(node: &TestNode, headers: &[TestHeader]) {
        for header in headers {
            node.network
                .content()
                .add_content_to_history(
                    CHAIN_ID,
                    ContentType::BlockHeader,
                    header.hash,
                    &header.rlp,
                )
                .await
                .unwrap();
        }
    }

    /// Verified results in the order they were emitted.
    fn verified(node: &mut TestNode) -> Vec<(history_network::Hash, bool)> {
        node.drain_events()
            .into_iter()
            .filter_map(|event| match event {
                HistoryEvent::Verified {
                    hash_key,
                    verified,
                } => Some((hash_key, verified)),
                _ => None,
            })
            .collect()
    }

    /// A node that has sealed the first epoch, and the chain it was built from.
    async fn prover(config: &HistoryConfig) -> (TestNode, Vec<TestHeader>) {
        let chain = ChainBuilder::from_config(config).build(config.epoch_size as u64 + 1);
        let node = TestNode::new(config.clone());
        admit_headers(&node, &chain).await;
        assert_eq!(node.network.content().historical_epochs().len(), 1);
        (node, chain)
    }

    fn proof_for(prover: &TestNode, block_hash: history_network::Hash) -> Vec<u8> {
        let content = prover.network.content();
        let root = content.historical_epochs()[0];
        content
            .build_header_proof(CHAIN_ID, root, block_hash)
            .unwrap()
            .expect("block is in the sealed epoch")
    }

    // =============================================================================
    // AGAINST SEALED EPOCHS
    // =============================================================================

    #[tokio::test]
    async fn test_proof_verifies_after_snapshot_exchange() {
        let config = HistoryConfig::for_testing();
        let (prover, chain) = prover(&config).await;
        let mut verifier = TestNode::new(config);

        let snapshot_key = ContentKey::header_accumulator(CHAIN_ID);
        let snapshot = prover
            .network
            .content()
            .get_content(&snapshot_key)
            .unwrap()
            .unwrap();
        verifier
            .network
            .content()
            .accept_content(&snapshot_key.encode(), &snapshot)
            .await
            .unwrap();

        let target = &chain[4];
        let proof = proof_for(&prover, target.hash);
        verifier
            .network
            .content()
            .add_content_to_history(CHAIN_ID, ContentType::HeaderProof, target.hash, &proof)
            .await
            .unwrap();

        // Same proof offered for a different header
        verifier
            .network
            .content()
            .add_content_to_history(CHAIN_ID, ContentType::HeaderProof, chain[5].hash, &proof)
            .await
            .unwrap();

        assert_eq!(
            verified(&mut verifier),
            vec![(target.hash, true), (chain[5].hash, false)]
        );
    }

    #[tokio::test]
    async fn test_tampered_proof_is_refused() {
        let config = HistoryConfig::for_testing();
        let (mut prover, chain) = prover(&config).await;
        prover.drain_events();

        let target = &chain[2];
        let mut proof = HeaderProof::decode(&proof_for(&prover, target.hash)).unwrap();
        proof.record.total_difficulty += 1;
        let tampered = proof.encode().unwrap();

        prover
            .network
            .content()
            .add_content_to_history(CHAIN_ID, ContentType::HeaderProof, target.hash, &tampered)
            .await
            .unwrap();

        assert_eq!(verified(&mut prover), vec![(target.hash, false)]);
    }

    #[tokio::test]
    async fn test_no_proof_for_unsealed_block() {
        let config = HistoryConfig::for_testing();
        let (prover, chain) = prover(&config).await;
        let content = prover.network.content();
        let root = content.historical_epochs()[0];

        // Block epoch_size + 1 opened the second epoch
        let open = chain.last().unwrap();
        assert_eq!(content.build_header_proof(CHAIN_ID, root, open.hash).unwrap(), None);
        assert_eq!(
            content
                .build_header_proof(CHAIN_ID, [0x42; 32], chain[0].hash)
                .unwrap(),
            None
        );
    }

    // =============================================================================
    // BEFORE THE EPOCH IS SEALED LOCALLY
    // =============================================================================

    #[tokio::test]
    async fn test_proof_verifies_against_open_epoch() {
        let config = HistoryConfig::for_testing();
        let epoch_size = config.epoch_size;
        let (prover, chain) = prover(&config).await;

        // The verifier has followed the first epoch but not sealed it
        let mut verifier = TestNode::new(config);
        admit_headers(&verifier, &chain[..epoch_size]).await;
        assert!(verifier.network.content().historical_epochs().is_empty());
        verifier.drain_events();

        let target = &chain[7];
        let proof = proof_for(&prover, target.hash);
        verifier
            .network
            .content()
            .add_content_to_history(CHAIN_ID, ContentType::HeaderProof, target.hash, &proof)
            .await
            .unwrap();

        assert_eq!(verified(&mut verifier), vec![(target.hash, true)]);
    }

    #[tokio::test]
    async fn test_proof_for_unknown_epoch_is_refused() {
        let config = HistoryConfig::for_testing();
        let (prover, chain) = prover(&config).await;
        let mut verifier = TestNode::new(config);

        let target = &chain[3];
        let proof = proof_for(&prover, target.hash);
        verifier
            .network
            .content()
            .add_content_to_history(CHAIN_ID, ContentType::HeaderProof, target.hash, &proof)
            .await
            .unwrap();

        assert_eq!(verified(&mut verifier), vec![(target.hash, false)]);
    }

    #[tokio::test]
    async fn test_forged_epoch_around_trusted_header_is_refused() {
        let config = HistoryConfig::for_testing();
        let chain = ChainBuilder::from_config(&config).build(1);
        let mut verifier = TestNode::new(config);
        admit_headers(&verifier, &chain).await;
        verifier.drain_events();

        let trusted = chain[0].decoded();
        let fake = [0x66; 32];
        let forged_epoch = vec![
            HeaderRecord::new(trusted.hash, 1),
            HeaderRecord::new(fake, 2),
        ];
        let forged = HeaderProof::build(0, &forged_epoch, &fake)
            .unwrap()
            .encode()
            .unwrap();
        verifier
            .network
            .content()
            .add_content_to_history(CHAIN_ID, ContentType::HeaderProof, fake, &forged)
            .await
            .unwrap();

        assert_eq!(verified(&mut verifier), vec![(fake, false)]);
    }
}
