//! # Content Manager
//!
//! Single entry point for admitting history content into local state.
//!
//! ## Admission Flow
//!
//! ```text
//! value ──► validate (per type) ──► accumulator ──► store ──► ContentAdded ──► gossip
//!               │                                                              ▲
//!               └── reject: log + metric, Ok(())          routing table has peers
//! ```
//!
//! | Type | Validation | Stored |
//! |------|------------|--------|
//! | BlockHeader | recomputed hash == key | raw header (+ snapshot, sealed epoch) |
//! | BlockBody | assembles with local or fetched header | body + derived receipts |
//! | Receipt | none | as-is |
//! | EpochAccumulator | decodes as header records | as-is, then backfill scheduled |
//! | HeaderAccumulator | snapshot merge | local snapshot only, no event, no gossip |
//! | HeaderProof | inclusion proof | nothing; `Verified` event only |
//!
//! ## Locking
//!
//! The accumulator sits behind a `parking_lot::Mutex`. Header admission is
//! synchronous: seal, append and snapshot persistence for one header happen in
//! one critical section on a staged copy, which replaces the live accumulator
//! only after every store write succeeded. No guard is held across an `.await`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use async_trait::async_trait;
use history_telemetry::metrics::{
    ACCUMULATOR_HEIGHT, BACKFILL_LOOKUPS, CONTENT_ADDED, CONTENT_REJECTED, EPOCHS_SEALED,
};

use super::backfill::{BackfillQueue, BackfillRequest};
use super::gossip_manager::GossipManager;
use super::HistoryPorts;
use crate::config::HistoryConfig;
use crate::domain::{
    decode_epoch, Accumulator, AccumulatorSnapshot, ContentKey, ContentType, EpochStatus, Hash,
    HeaderProof, HeaderRecord, HistoryError, NodeId, SealedEpoch,
};
use crate::events::{EventEmitter, HistoryEvent};
use crate::ports::{
    BlockCodec, ContentLookup, ContentStore, HistoryContentApi, ReceiptManager, RoutingTable,
};

/// Validation, accumulator maintenance and backfill for one network instance.
pub struct ContentManager {
    config: HistoryConfig,
    node_id: NodeId,
    store: Arc<dyn ContentStore>,
    routing: Arc<dyn RoutingTable>,
    lookup: Arc<dyn ContentLookup>,
    codec: Arc<dyn BlockCodec>,
    receipts: Arc<dyn ReceiptManager>,
    gossip: Arc<GossipManager>,
    accumulator: Mutex<Accumulator>,
    events: EventEmitter,
    backfill: BackfillQueue,
}

impl ContentManager {
    /// Create a manager, restoring the accumulator from the persisted snapshot
    /// when one exists.
    pub fn new(
        config: HistoryConfig,
        ports: &HistoryPorts,
        gossip: Arc<GossipManager>,
    ) -> Result<Self, HistoryError> {
        let accumulator = Self::restore_accumulator(&config, ports.store.as_ref())?;
        ACCUMULATOR_HEIGHT.set(accumulator.current_height() as i64);
        let backfill = BackfillQueue::new(config.backfill_queue_capacity);

        Ok(Self {
            node_id: config.node_id(),
            events: EventEmitter::new(config.event_channel_capacity),
            config,
            store: ports.store.clone(),
            routing: ports.routing.clone(),
            lookup: ports.lookup.clone(),
            codec: ports.codec.clone(),
            receipts: ports.receipts.clone(),
            gossip,
            accumulator: Mutex::new(accumulator),
            backfill,
        })
    }

    fn restore_accumulator(
        config: &HistoryConfig,
        store: &dyn ContentStore,
    ) -> Result<Accumulator, HistoryError> {
        let snapshot_id = ContentKey::header_accumulator(config.chain_id).content_id();
        let Some(bytes) = store.get(&snapshot_id)? else {
            debug!("[history] No persisted accumulator, starting from genesis");
            return Ok(Accumulator::new(config.genesis, config.epoch_size));
        };

        let restored = AccumulatorSnapshot::decode(&bytes).and_then(|snapshot| {
            Accumulator::from_snapshot(config.genesis, config.epoch_size, snapshot)
        });
        match restored {
            Ok(accumulator) => {
                info!(
                    height = accumulator.current_height(),
                    epochs = accumulator.historical_epochs().len(),
                    "[history] Restored header accumulator"
                );
                Ok(accumulator)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "[history] Persisted accumulator unusable, starting from genesis"
                );
                Ok(Accumulator::new(config.genesis, config.epoch_size))
            }
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Height of the accumulator tip.
    pub fn current_height(&self) -> u64 {
        self.accumulator.lock().current_height()
    }

    /// Copy of the accumulator state.
    pub fn accumulator_snapshot(&self) -> AccumulatorSnapshot {
        self.accumulator.lock().snapshot()
    }

    /// Roots of sealed epochs.
    pub fn historical_epochs(&self) -> Vec<Hash> {
        self.accumulator.lock().historical_epochs().to_vec()
    }

    /// Read a stored item.
    pub fn get_content(&self, key: &ContentKey) -> Result<Option<Vec<u8>>, HistoryError> {
        Ok(self.store.get(&key.content_id())?)
    }

    /// Admit an item.
    ///
    /// Rejected items are logged and dropped; the call still succeeds.
    pub async fn add_content_to_history(
        &self,
        chain_id: u16,
        content_type: ContentType,
        hash_key: Hash,
        value: &[u8],
    ) -> Result<(), HistoryError> {
        let key = ContentKey::new(content_type, chain_id, hash_key);
        if chain_id != self.config.chain_id {
            warn!(
                key = %key,
                expected = self.config.chain_id,
                "[history] Content for another chain dropped"
            );
            self.reject(&key, "chain_id");
            return Ok(());
        }
        trace!(key = %key, bytes = value.len(), "[history] Admitting content");

        let admitted = match content_type {
            ContentType::BlockHeader => self.admit_header(&key, value)?,
            ContentType::BlockBody => self.admit_body(&key, value).await?,
            ContentType::Receipt => {
                self.store.put(&key.content_id(), value)?;
                true
            }
            ContentType::EpochAccumulator => self.admit_epoch(&key, value)?,
            ContentType::HeaderAccumulator => {
                self.receive_snapshot(chain_id, value)?;
                return Ok(());
            }
            ContentType::HeaderProof => {
                self.verify_header_proof(hash_key, value);
                return Ok(());
            }
        };

        if admitted {
            self.announce(&key, value);
        }
        Ok(())
    }

    /// Admit an item received under an encoded content key.
    pub async fn accept_content(
        &self,
        content_key: &[u8],
        value: &[u8],
    ) -> Result<(), HistoryError> {
        let key = ContentKey::decode(content_key)?;
        self.add_content_to_history(key.chain_id(), key.content_type(), *key.hash(), value)
            .await
    }

    /// `ContentAdded`, then gossip if anyone is listening.
    fn announce(&self, key: &ContentKey, value: &[u8]) {
        let content_type = key.content_type();
        CONTENT_ADDED.with_label_values(&[content_type.as_str()]).inc();
        self.events
            .emit(HistoryEvent::content_added(*key.hash(), content_type, value));

        if self.routing.has_peers() {
            self.gossip.add_key(*key);
        }
    }

    fn reject(&self, key: &ContentKey, reason: &'static str) {
        CONTENT_REJECTED
            .with_label_values(&[key.content_type().as_str(), reason])
            .inc();
    }

    /// Validate a header and fold it into the accumulator.
    ///
    /// Returns `Ok(false)` when the header was rejected.
    fn admit_header(&self, key: &ContentKey, value: &[u8]) -> Result<bool, HistoryError> {
        let header = match self.codec.decode_header(value) {
            Ok(header) => header,
            Err(e) => {
                warn!(key = %key, error = %e, "[history] Undecodable header dropped");
                self.reject(key, "decode");
                return Ok(false);
            }
        };

        if &header.hash != key.hash() {
            warn!(
                expected = %hex::encode(key.hash()),
                actual = %hex::encode(header.hash),
                "[history] Header hash mismatch, dropped"
            );
            self.reject(key, "hash_mismatch");
            return Ok(false);
        }

        let snapshot_id = ContentKey::header_accumulator(key.chain_id()).content_id();
        let sealed = {
            let mut accumulator = self.accumulator.lock();
            // Staged on a copy; committed only once every write has landed
            let mut staged = accumulator.clone();
            let epoch_index = staged.epoch_index_of(header.number);
            staged.observe_verifier(epoch_index, header.hash);

            let sealed = if staged.is_successor(&header) {
                let sealed = if staged.is_epoch_full() {
                    let sealed = staged.seal_epoch()?;
                    let epoch_key =
                        ContentKey::new(ContentType::EpochAccumulator, key.chain_id(), sealed.root);
                    self.store.put(&epoch_key.content_id(), &sealed.encoded)?;
                    Some(sealed)
                } else {
                    None
                };

                if staged.update_accumulator(&header)? == EpochStatus::Full {
                    debug!(
                        number = header.number,
                        "[history] Epoch full, sealing with next successor"
                    );
                }
                self.store.put(&snapshot_id, &staged.encode_snapshot()?)?;
                sealed
            } else {
                trace!(
                    number = header.number,
                    height = staged.current_height(),
                    "[history] Header is not the next successor"
                );
                None
            };

            self.store.put(&key.content_id(), value)?;
            *accumulator = staged;
            ACCUMULATOR_HEIGHT.set(accumulator.current_height() as i64);
            sealed
        };

        if let Some(sealed) = sealed {
            self.publish_sealed_epoch(key.chain_id(), sealed);
        }
        Ok(true)
    }

    /// Announce a locally sealed epoch and schedule its backfill.
    fn publish_sealed_epoch(&self, chain_id: u16, sealed: SealedEpoch) {
        EPOCHS_SEALED.inc();
        info!(
            epoch = sealed.index,
            root = %hex::encode(sealed.root),
            "[history] Sealed epoch"
        );

        let epoch_key = ContentKey::new(ContentType::EpochAccumulator, chain_id, sealed.root);
        self.announce(&epoch_key, &sealed.encoded);
        self.receive_epoch(chain_id, &sealed.records);
    }

    /// Reassemble a block from `value` and its header, fetching the header
    /// from the network when it is not stored locally.
    async fn admit_body(&self, key: &ContentKey, value: &[u8]) -> Result<bool, HistoryError> {
        let header_key = ContentKey::new(ContentType::BlockHeader, key.chain_id(), *key.hash());

        let raw_header = match self.store.get(&header_key.content_id())? {
            Some(raw) => raw,
            None => match self.fetch_header(&header_key).await? {
                Some(raw) => raw,
                None => {
                    debug!(key = %key, "[history] No header for body, dropped");
                    self.reject(key, "missing_header");
                    return Ok(false);
                }
            },
        };

        let block = match self.codec.assemble_block(&raw_header, value) {
            Ok(block) if &block.hash() == key.hash() => block,
            Ok(_) => {
                warn!(key = %key, "[history] Body assembled into a different block, dropped");
                self.reject(key, "hash_mismatch");
                return Ok(false);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "[history] Body does not assemble, dropped");
                self.reject(key, "assembly");
                return Ok(false);
            }
        };

        self.store.put(&key.content_id(), value)?;

        match self.receipts.derive_receipts(&block) {
            Some(receipts) => {
                let receipt_key =
                    ContentKey::new(ContentType::Receipt, key.chain_id(), *key.hash());
                self.store.put(&receipt_key.content_id(), &receipts)?;
            }
            None => trace!(number = block.number(), "[history] No receipts derived"),
        }
        Ok(true)
    }

    /// Bounded network fetch of a header, admitted through the header path.
    async fn fetch_header(&self, header_key: &ContentKey) -> Result<Option<Vec<u8>>, HistoryError> {
        let timeout = Duration::from_millis(self.config.header_lookup_timeout_ms);
        let raw = match tokio::time::timeout(timeout, self.lookup.run(header_key)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                debug!(key = %header_key, error = %e, "[history] Header lookup failed");
                return Ok(None);
            }
            Err(_) => {
                debug!(
                    key = %header_key,
                    timeout_ms = self.config.header_lookup_timeout_ms,
                    "[history] Header lookup timed out"
                );
                return Ok(None);
            }
        };

        if !self.admit_header(header_key, &raw)? {
            return Ok(None);
        }
        self.announce(header_key, &raw);
        Ok(Some(raw))
    }

    fn admit_epoch(&self, key: &ContentKey, value: &[u8]) -> Result<bool, HistoryError> {
        let records = match decode_epoch(value) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %key, error = %e, "[history] Undecodable epoch dropped");
                self.reject(key, "decode");
                return Ok(false);
            }
        };

        self.store.put(&key.content_id(), value)?;
        self.receive_epoch(key.chain_id(), &records);
        Ok(true)
    }

    /// Queue lookups for epoch members within radius that are not stored yet.
    ///
    /// Iterates the records' block hashes. Never fails.
    pub fn receive_epoch(&self, chain_id: u16, records: &[HeaderRecord]) {
        let mut queued = 0usize;
        for record in records {
            for content_type in [ContentType::BlockHeader, ContentType::BlockBody] {
                let key = ContentKey::new(content_type, chain_id, record.block_hash);
                let content_id = key.content_id();
                if !content_id.is_within_radius(&self.node_id, self.config.radius) {
                    continue;
                }
                match self.store.contains(&content_id) {
                    Ok(true) => {}
                    Ok(false) => {
                        if self.backfill.push(key) {
                            queued += 1;
                        }
                    }
                    Err(e) => debug!(key = %key, error = %e, "[history] Store check failed"),
                }
            }
        }
        debug!(records = records.len(), queued, "[history] Epoch backfill scheduled");
    }

    fn receive_snapshot(&self, chain_id: u16, value: &[u8]) -> Result<(), HistoryError> {
        let snapshot_id = ContentKey::header_accumulator(chain_id).content_id();
        let mut accumulator = self.accumulator.lock();
        match accumulator.receive_snapshot(value) {
            Ok(()) => {
                self.store
                    .put(&snapshot_id, &accumulator.encode_snapshot()?)?;
                ACCUMULATOR_HEIGHT.set(accumulator.current_height() as i64);
                info!(
                    height = accumulator.current_height(),
                    "[history] Accumulator snapshot merged"
                );
            }
            Err(e) => {
                warn!(error = %e, "[history] Accumulator snapshot rejected");
                CONTENT_REJECTED
                    .with_label_values(&[ContentType::HeaderAccumulator.as_str(), "snapshot"])
                    .inc();
            }
        }
        Ok(())
    }

    fn verify_header_proof(&self, hash_key: Hash, value: &[u8]) {
        let verified = match HeaderProof::decode(value) {
            Ok(proof) => self
                .accumulator
                .lock()
                .verify_inclusion_proof(&proof, &hash_key),
            Err(e) => {
                debug!(error = %e, "[history] Undecodable header proof");
                false
            }
        };

        debug!(hash = %hex::encode(hash_key), verified, "[history] Header proof checked");
        self.events.emit(HistoryEvent::Verified { hash_key, verified });
    }

    /// Encoded inclusion proof for `block_hash` from a stored epoch, if the
    /// epoch is stored and sealed locally and contains the block.
    pub fn build_header_proof(
        &self,
        chain_id: u16,
        epoch_root: Hash,
        block_hash: Hash,
    ) -> Result<Option<Vec<u8>>, HistoryError> {
        let epoch_key = ContentKey::new(ContentType::EpochAccumulator, chain_id, epoch_root);
        let Some(encoded) = self.store.get(&epoch_key.content_id())? else {
            return Ok(None);
        };
        let records = match decode_epoch(&encoded) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %epoch_key, error = %e, "[history] Stored epoch unreadable");
                return Ok(None);
            }
        };

        let epoch_index = {
            let accumulator = self.accumulator.lock();
            let Some(index) = accumulator
                .historical_epochs()
                .iter()
                .position(|root| root == &epoch_root)
            else {
                return Ok(None);
            };
            index as u64
        };

        let Some(proof) = HeaderProof::build(epoch_index, &records, &block_hash) else {
            return Ok(None);
        };

        match proof.encode() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                warn!(error = %e, "[history] Header proof encoding failed");
                Ok(None)
            }
        }
    }

    /// Run one backfill request: look the key up and admit what comes back.
    async fn process_backfill(&self, request: BackfillRequest) {
        let key = request.key;
        match self.lookup.run(&key).await {
            Ok(value) => {
                BACKFILL_LOOKUPS.with_label_values(&["found"]).inc();
                if let Err(e) = self
                    .add_content_to_history(key.chain_id(), key.content_type(), *key.hash(), &value)
                    .await
                {
                    warn!(key = %key, error = %e, "[history] Backfilled content not admitted");
                }
            }
            Err(e) => {
                BACKFILL_LOOKUPS.with_label_values(&["failed"]).inc();
                debug!(key = %key, error = %e, "[history] Backfill lookup failed");
            }
        }
    }

    /// Process queued backfill requests inline until the queue is empty.
    ///
    /// Returns the number of requests processed. Returns 0 at once while a
    /// worker from [`Self::spawn_backfill_worker`] owns the queue.
    pub async fn drain_backfill(&self) -> usize {
        let mut processed = 0;
        while let Some(request) = self.backfill.try_next() {
            self.process_backfill(request).await;
            processed += 1;
        }
        processed
    }

    /// Spawn a task that processes backfill requests as they are queued.
    pub fn spawn_backfill_worker(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            debug!("[history] Backfill worker started");
            while let Some(request) = manager.backfill.next().await {
                manager.process_backfill(request).await;
            }
        })
    }
}

#[async_trait]
impl HistoryContentApi for ContentManager {
    async fn add_content_to_history(
        &self,
        chain_id: u16,
        content_type: ContentType,
        hash_key: Hash,
        value: &[u8],
    ) -> Result<(), HistoryError> {
        ContentManager::add_content_to_history(self, chain_id, content_type, hash_key, value).await
    }

    async fn accept_content(&self, content_key: &[u8], value: &[u8]) -> Result<(), HistoryError> {
        ContentManager::accept_content(self, content_key, value).await
    }

    fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }
}
