//! # Content Key Flow
//!
//! Encoded keys arriving from the wire: dispatch by selector, storage under
//! the key's content id, and the beacon light-client key space.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use history_network::{
        BeaconContentKey, ContentKey, ContentStore, ContentType, HistoryConfig, HistoryError,
    };

    use crate::integration::TestNode;

    #[tokio::test]
    async fn test_unknown_selector_is_an_error() {
        let node = TestNode::new(HistoryConfig::for_testing());
        let mut raw = ContentKey::new(ContentType::Receipt, 1, [9u8; 32]).encode();
        raw[0] = 0x07;

        let result = node.network.content().accept_content(&raw, b"value").await;
        assert!(matches!(result, Err(HistoryError::UnknownContentType(0x07))));
        assert!(node.ports.store.is_empty());
    }

    #[tokio::test]
    async fn test_receipt_stored_under_content_id() {
        let node = TestNode::new(HistoryConfig::for_testing());
        let key = ContentKey::new(ContentType::Receipt, 1, [9u8; 32]);

        node.network
            .content()
            .accept_content(&key.encode(), b"receipts")
            .await
            .unwrap();

        assert_eq!(
            node.ports.store.get(&key.content_id()).unwrap(),
            Some(b"receipts".to_vec())
        );
    }

    #[test]
    fn test_chain_id_separates_content_ids() {
        let mainnet = ContentKey::new(ContentType::BlockHeader, 1, [3u8; 32]);
        let other = ContentKey::new(ContentType::BlockHeader, 5, [3u8; 32]);
        assert_ne!(mainnet.content_id(), other.content_id());
        assert_eq!(
            ContentKey::decode(&other.encode()).unwrap().chain_id(),
            5
        );
    }

    #[test]
    fn test_beacon_finality_key_from_wire() {
        let raw = hex::decode("1200a0660000000000").unwrap();
        let key = BeaconContentKey::decode(&raw).unwrap();
        assert_eq!(
            key,
            BeaconContentKey::LightClientFinalityUpdate {
                finalized_slot: 6_725_632
            }
        );
        assert_eq!(key.encode(), raw);
    }

    #[test]
    fn test_beacon_key_rejects_history_selector() {
        let raw = ContentKey::new(ContentType::BlockHeader, 1, [0u8; 32]).encode();
        assert!(matches!(
            BeaconContentKey::decode(&raw),
            Err(HistoryError::UnknownContentType(0))
        ));
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            if let Ok(key) = ContentKey::decode(&bytes) {
                prop_assert!(key.content_type().selector() <= 5);
                prop_assert_eq!(key.encode().len(), bytes.len());
            }
        }
    }
}
