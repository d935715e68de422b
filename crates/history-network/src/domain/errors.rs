//! # Domain Errors
//!
//! Error types for the history network core.
//!
//! Only [`HistoryError`] ever reaches a caller of the admission API. Validation
//! failures are logged and dropped inside the content manager, so the codec,
//! lookup and accumulator errors below mostly travel between internal layers.

use thiserror::Error;

/// Hash type alias (32-byte block, epoch or content hash)
pub type Hash = [u8; 32];

/// Errors surfaced by content admission.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Content key selector does not name a known content type.
    ///
    /// Indicates a protocol or version mismatch with the sending peer.
    #[error("Unknown content type: selector {0:#04x}")]
    UnknownContentType(u8),

    /// Content key bytes could not be decoded.
    #[error("Malformed content key: {0}")]
    MalformedKey(String),

    /// Persisting an admitted item failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Accumulator refused a mutation the admission flow requested.
    #[error("Accumulator error: {0}")]
    Accumulator(#[from] AccumulatorError),
}

/// Content store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store rejected the operation.
    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Find-content lookup failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No peer returned the content.
    #[error("Lookup failed for key {0}")]
    NotFound(String),

    /// The lookup did not finish in time.
    #[error("Lookup timed out after {0} ms")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),
}

/// Offer transport failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Offer transport error: {0}")]
pub struct TransportError(pub String);

/// Block/header decoding failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Bytes are not valid RLP or have the wrong shape.
    #[error("Invalid RLP: {0}")]
    Rlp(String),

    /// A decoded field has an invalid value.
    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Body contents do not commit to the header.
    #[error("Body does not match header: {0}")]
    BodyMismatch(String),

    /// Binary (bincode) decoding failed.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<rlp::DecoderError> for CodecError {
    fn from(err: rlp::DecoderError) -> Self {
        CodecError::Rlp(err.to_string())
    }
}

/// Accumulator errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccumulatorError {
    /// The current epoch must be sealed before another header is appended.
    #[error("Current epoch is full ({size} records); seal before appending")]
    EpochFull {
        /// Epoch size
        size: usize,
    },

    /// Sealing was requested before the epoch filled up.
    #[error("Current epoch holds {len}/{size} records; cannot seal")]
    EpochNotFull {
        /// Records in the current epoch
        len: usize,
        /// Epoch size
        size: usize,
    },

    /// Header does not extend the accumulator tip.
    #[error("Header {number} does not extend tip at height {height}")]
    NotSuccessor {
        /// Header number
        number: u64,
        /// Accumulator height
        height: u64,
    },

    /// Snapshot bytes are malformed or violate the epoch bound.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Snapshot is well-formed but inconsistent with local state.
    #[error("Snapshot rejected: {0}")]
    SnapshotRejected(String),

    /// Encoding accumulator state failed.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}
