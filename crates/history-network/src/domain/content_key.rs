//! # Content Keys and Identifiers
//!
//! Every storable item is named by a [`ContentKey`]. Its canonical encoding is
//! hashed with SHA-256 into a [`ContentId`], which is compared against node ids
//! with the XOR metric to decide routing and local storage eligibility.
//!
//! ## Wire Layout
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | selector | 1 | [`ContentType`] discriminant |
//! | chain_id | 2 | little-endian |
//! | hash | 32 | block hash or epoch root; absent for `HeaderAccumulator` |
//!
//! Beacon light-client keys ([`BeaconContentKey`]) share the selector-first
//! layout but carry slot/period payloads instead of a chain id.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::errors::{Hash, HistoryError};

/// Length of an encoded key carrying a hash.
const HASHED_KEY_LEN: usize = 1 + 2 + 32;

/// Length of the header accumulator key (selector + chain id).
const ACCUMULATOR_KEY_LEN: usize = 1 + 2;

/// Closed set of history content types.
///
/// The discriminant is the content-key selector byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    BlockHeader = 0,
    BlockBody = 1,
    Receipt = 2,
    EpochAccumulator = 3,
    HeaderAccumulator = 4,
    HeaderProof = 5,
}

impl ContentType {
    /// Selector byte for this type.
    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::BlockHeader => "block_header",
            ContentType::BlockBody => "block_body",
            ContentType::Receipt => "receipt",
            ContentType::EpochAccumulator => "epoch_accumulator",
            ContentType::HeaderAccumulator => "header_accumulator",
            ContentType::HeaderProof => "header_proof",
        }
    }
}

impl TryFrom<u8> for ContentType {
    type Error = HistoryError;

    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(ContentType::BlockHeader),
            1 => Ok(ContentType::BlockBody),
            2 => Ok(ContentType::Receipt),
            3 => Ok(ContentType::EpochAccumulator),
            4 => Ok(ContentType::HeaderAccumulator),
            5 => Ok(ContentType::HeaderProof),
            other => Err(HistoryError::UnknownContentType(other)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 256-bit node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// XOR distance to a content id.
    pub fn distance_to(&self, content_id: &ContentId) -> U256 {
        xor_distance(&self.0, &content_id.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}..)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

/// SHA-256 of an encoded content key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub [u8; 32]);

impl ContentId {
    /// Hash an encoded content key.
    pub fn from_key_bytes(encoded: &[u8]) -> Self {
        Self(Sha256::digest(encoded).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True iff `distance(node, self) <= radius`.
    pub fn is_within_radius(&self, node: &NodeId, radius: U256) -> bool {
        node.distance_to(self) <= radius
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// XOR of two 32-byte ids as a big-endian 256-bit integer.
pub fn xor_distance(a: &[u8; 32], b: &[u8; 32]) -> U256 {
    let mut xored = [0u8; 32];
    for (out, (x, y)) in xored.iter_mut().zip(a.iter().zip(b.iter())) {
        *out = x ^ y;
    }
    U256::from_big_endian(&xored)
}

/// History network content key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContentKey {
    content_type: ContentType,
    chain_id: u16,
    hash: Hash,
}

impl ContentKey {
    /// Build a key. The hash is ignored for `HeaderAccumulator`.
    pub fn new(content_type: ContentType, chain_id: u16, hash: Hash) -> Self {
        let hash = match content_type {
            ContentType::HeaderAccumulator => [0u8; 32],
            _ => hash,
        };
        Self {
            content_type,
            chain_id,
            hash,
        }
    }

    /// The fixed key the accumulator snapshot is stored under.
    pub fn header_accumulator(chain_id: u16) -> Self {
        Self::new(ContentType::HeaderAccumulator, chain_id, [0u8; 32])
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn chain_id(&self) -> u16 {
        self.chain_id
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Canonical byte encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HASHED_KEY_LEN);
        out.push(self.content_type.selector());
        out.extend_from_slice(&self.chain_id.to_le_bytes());
        if self.content_type != ContentType::HeaderAccumulator {
            out.extend_from_slice(&self.hash);
        }
        out
    }

    /// Decode a canonical key.
    ///
    /// An unknown selector fails with [`HistoryError::UnknownContentType`]
    /// before any length check.
    pub fn decode(bytes: &[u8]) -> Result<Self, HistoryError> {
        let selector = *bytes
            .first()
            .ok_or_else(|| HistoryError::MalformedKey("empty key".to_string()))?;
        let content_type = ContentType::try_from(selector)?;

        let expected = match content_type {
            ContentType::HeaderAccumulator => ACCUMULATOR_KEY_LEN,
            _ => HASHED_KEY_LEN,
        };
        if bytes.len() != expected {
            return Err(HistoryError::MalformedKey(format!(
                "{} key must be {} bytes, got {}",
                content_type,
                expected,
                bytes.len()
            )));
        }

        let chain_id = u16::from_le_bytes([bytes[1], bytes[2]]);
        let mut hash = [0u8; 32];
        if expected == HASHED_KEY_LEN {
            hash.copy_from_slice(&bytes[3..]);
        }

        Ok(Self {
            content_type,
            chain_id,
            hash,
        })
    }

    /// Content id of this key.
    pub fn content_id(&self) -> ContentId {
        ContentId::from_key_bytes(&self.encode())
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.encode()))
    }
}

/// Selector for a light-client bootstrap.
pub const BEACON_BOOTSTRAP: u8 = 0x10;
/// Selector for light-client updates by period range.
pub const BEACON_UPDATES_BY_RANGE: u8 = 0x11;
/// Selector for a light-client finality update.
pub const BEACON_FINALITY_UPDATE: u8 = 0x12;
/// Selector for a light-client optimistic update.
pub const BEACON_OPTIMISTIC_UPDATE: u8 = 0x13;

/// Beacon light-client network content key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BeaconContentKey {
    LightClientBootstrap { block_hash: Hash },
    LightClientUpdatesByRange { start_period: u64, count: u64 },
    LightClientFinalityUpdate { finalized_slot: u64 },
    LightClientOptimisticUpdate { optimistic_slot: u64 },
}

impl BeaconContentKey {
    pub fn selector(&self) -> u8 {
        match self {
            Self::LightClientBootstrap { .. } => BEACON_BOOTSTRAP,
            Self::LightClientUpdatesByRange { .. } => BEACON_UPDATES_BY_RANGE,
            Self::LightClientFinalityUpdate { .. } => BEACON_FINALITY_UPDATE,
            Self::LightClientOptimisticUpdate { .. } => BEACON_OPTIMISTIC_UPDATE,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.selector()];
        match self {
            Self::LightClientBootstrap { block_hash } => out.extend_from_slice(block_hash),
            Self::LightClientUpdatesByRange {
                start_period,
                count,
            } => {
                out.extend_from_slice(&start_period.to_le_bytes());
                out.extend_from_slice(&count.to_le_bytes());
            }
            Self::LightClientFinalityUpdate { finalized_slot } => {
                out.extend_from_slice(&finalized_slot.to_le_bytes())
            }
            Self::LightClientOptimisticUpdate { optimistic_slot } => {
                out.extend_from_slice(&optimistic_slot.to_le_bytes())
            }
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HistoryError> {
        let (&selector, payload) = bytes
            .split_first()
            .ok_or_else(|| HistoryError::MalformedKey("empty key".to_string()))?;

        let key = match selector {
            BEACON_BOOTSTRAP => Self::LightClientBootstrap {
                block_hash: fixed::<32>(payload)?,
            },
            BEACON_UPDATES_BY_RANGE => {
                let range = fixed::<16>(payload)?;
                Self::LightClientUpdatesByRange {
                    start_period: u64::from_le_bytes(fixed::<8>(&range[..8])?),
                    count: u64::from_le_bytes(fixed::<8>(&range[8..])?),
                }
            }
            BEACON_FINALITY_UPDATE => Self::LightClientFinalityUpdate {
                finalized_slot: u64::from_le_bytes(fixed::<8>(payload)?),
            },
            BEACON_OPTIMISTIC_UPDATE => Self::LightClientOptimisticUpdate {
                optimistic_slot: u64::from_le_bytes(fixed::<8>(payload)?),
            },
            other => return Err(HistoryError::UnknownContentType(other)),
        };
        Ok(key)
    }

    pub fn content_id(&self) -> ContentId {
        ContentId::from_key_bytes(&self.encode())
    }
}

fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N], HistoryError> {
    payload.try_into().map_err(|_| {
        HistoryError::MalformedKey(format!(
            "expected {} payload bytes, got {}",
            N,
            payload.len()
        ))
    })
}
