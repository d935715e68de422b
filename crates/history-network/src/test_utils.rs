//! Builders and mocks shared by unit and integration tests.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rlp::RlpStream;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{
    keccak256, InMemoryContentStore, InMemoryRoutingTable, NoReceipts, RlpBlockCodec,
    EMPTY_TRIE_ROOT,
};
use crate::config::HistoryConfig;
use crate::domain::{
    BlockHeader, ContentId, ContentKey, Hash, LookupError, NodeId, StoreError,
};
use crate::ports::{ContentLookup, ContentStore, OfferSink};
use crate::service::HistoryPorts;

/// Keccak-256 of the RLP empty list.
pub const EMPTY_UNCLES_HASH: Hash = [
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
];

/// An encoded header and the fields tests assert on.
#[derive(Clone, Debug)]
pub struct TestHeader {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub difficulty: u64,
    pub rlp: Vec<u8>,
}

impl TestHeader {
    pub fn decoded(&self) -> BlockHeader {
        BlockHeader {
            hash: self.hash,
            parent_hash: self.parent_hash,
            number: self.number,
            difficulty: self.difficulty as u128,
            uncles_hash: EMPTY_UNCLES_HASH,
            transactions_root: EMPTY_TRIE_ROOT,
            receipts_root: EMPTY_TRIE_ROOT,
        }
    }
}

/// Builds an RLP header for an empty block.
pub struct HeaderBuilder {
    number: u64,
    parent_hash: Hash,
    difficulty: u64,
    extra_data: Vec<u8>,
}

impl HeaderBuilder {
    pub fn new(number: u64, parent_hash: Hash) -> Self {
        Self {
            number,
            parent_hash,
            difficulty: 17_179_869_184,
            extra_data: Vec::new(),
        }
    }

    pub fn difficulty(mut self, difficulty: u64) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn extra_data(mut self, extra_data: &[u8]) -> Self {
        self.extra_data = extra_data.to_vec();
        self
    }

    pub fn build(self) -> TestHeader {
        let mut stream = RlpStream::new_list(15);
        stream.append(&self.parent_hash.to_vec());
        stream.append(&EMPTY_UNCLES_HASH.to_vec());
        stream.append(&vec![0u8; 20]);
        stream.append(&vec![0u8; 32]);
        stream.append(&EMPTY_TRIE_ROOT.to_vec());
        stream.append(&EMPTY_TRIE_ROOT.to_vec());
        stream.append(&vec![0u8; 256]);
        stream.append(&self.difficulty);
        stream.append(&self.number);
        stream.append(&5000u64);
        stream.append(&0u64);
        stream.append(&(1_438_269_973u64 + self.number * 13));
        stream.append(&self.extra_data);
        stream.append(&vec![0u8; 32]);
        stream.append(&vec![0u8; 8]);
        let rlp = stream.out().to_vec();

        TestHeader {
            number: self.number,
            hash: keccak256(&rlp),
            parent_hash: self.parent_hash,
            difficulty: self.difficulty,
            rlp,
        }
    }
}

/// Builds a contiguous chain of empty blocks on top of a genesis block.
pub struct ChainBuilder {
    genesis_number: u64,
    genesis_hash: Hash,
}

impl ChainBuilder {
    pub fn new(genesis_number: u64, genesis_hash: Hash) -> Self {
        Self {
            genesis_number,
            genesis_hash,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.genesis.number, config.genesis.hash)
    }

    /// Blocks `genesis + 1 ..= genesis + len`.
    pub fn build(&self, len: u64) -> Vec<TestHeader> {
        let mut headers = Vec::with_capacity(len as usize);
        let mut parent = self.genesis_hash;
        for offset in 1..=len {
            let header = HeaderBuilder::new(self.genesis_number + offset, parent).build();
            parent = header.hash;
            headers.push(header);
        }
        headers
    }
}

/// Body of an empty block: `[[], []]`.
pub fn body_rlp() -> Vec<u8> {
    let mut stream = RlpStream::new_list(2);
    stream.begin_list(0);
    stream.begin_list(0);
    stream.out().to_vec()
}

/// Scripted find-content lookup.
#[derive(Default)]
pub struct MockLookup {
    responses: RwLock<HashMap<ContentKey, Vec<u8>>>,
    fail_all: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: ContentKey, value: Vec<u8>) {
        self.responses.write().insert(key, value);
    }

    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Delay every lookup by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentLookup for MockLookup {
    async fn run(&self, key: &ContentKey) -> Result<Vec<u8>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(LookupError::Network("mock failure".to_string()));
        }
        self.responses
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(key.to_string()))
    }
}

/// Offer sink that records every batch.
#[derive(Default)]
pub struct RecordingOfferSink {
    offers: Mutex<Vec<(NodeId, Vec<ContentKey>)>>,
}

impl RecordingOfferSink {
    pub fn offers(&self) -> Vec<(NodeId, Vec<ContentKey>)> {
        self.offers.lock().clone()
    }
}

impl OfferSink for RecordingOfferSink {
    fn dispatch_offer(&self, peer: NodeId, keys: Vec<ContentKey>) {
        self.offers.lock().push((peer, keys));
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

impl ContentStore for FailingStore {
    fn put(&self, _id: &ContentId, _value: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Backend("store unavailable".to_string()))
    }

    fn get(&self, _id: &ContentId) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Backend("store unavailable".to_string()))
    }
}

/// In-memory store whose writes can be switched off.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryContentStore,
    fail_puts: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

impl ContentStore for FlakyStore {
    fn put(&self, id: &ContentId, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.put(id, value)
    }

    fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(id)
    }
}

/// Concrete handles to the in-memory ports.
pub struct MemoryPorts {
    pub store: Arc<InMemoryContentStore>,
    pub routing: Arc<InMemoryRoutingTable>,
    pub lookup: Arc<MockLookup>,
    pub offers: Arc<RecordingOfferSink>,
}

/// In-memory ports with an RLP codec and no receipts.
pub fn memory_ports() -> (HistoryPorts, MemoryPorts) {
    memory_ports_with_store(Arc::new(InMemoryContentStore::new()))
}

/// Like [`memory_ports`] over an existing store.
pub fn memory_ports_with_store(store: Arc<InMemoryContentStore>) -> (HistoryPorts, MemoryPorts) {
    let handles = MemoryPorts {
        store,
        routing: Arc::new(InMemoryRoutingTable::new()),
        lookup: Arc::new(MockLookup::new()),
        offers: Arc::new(RecordingOfferSink::default()),
    };
    let ports = HistoryPorts {
        store: handles.store.clone(),
        routing: handles.routing.clone(),
        lookup: handles.lookup.clone(),
        codec: Arc::new(RlpBlockCodec::new()),
        receipts: Arc::new(NoReceipts),
        offers: handles.offers.clone(),
    };
    (ports, handles)
}
