//! # RLP Block Codec
//!
//! Decodes execution-layer headers and reassembles blocks from a header and a
//! body using the `rlp` crate. Header hashes are Keccak-256 of the header RLP.
//!
//! ## Header Fields Read
//!
//! | Index | Field |
//! |-------|-------|
//! | 0 | parent hash |
//! | 1 | ommers (uncles) hash |
//! | 4 | transactions root |
//! | 5 | receipts root |
//! | 7 | difficulty |
//! | 8 | number |
//!
//! A body is `[transactions, uncles]`, optionally followed by withdrawals.
//! Assembly checks the uncles against the header's ommers hash and that an
//! empty transaction list matches the empty trie root. Rebuilding the full
//! transaction trie is left to the execution client.

use rlp::Rlp;
use sha3::{Digest, Keccak256};

use crate::domain::{AssembledBlock, BlockHeader, CodecError, Hash};
use crate::ports::BlockCodec;

/// Fields every pre-London header carries.
const MIN_HEADER_FIELDS: usize = 15;

/// Keccak-256 of an empty trie.
pub const EMPTY_TRIE_ROOT: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Keccak-256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

fn hash_field(rlp: &Rlp<'_>, index: usize, field: &'static str) -> Result<Hash, CodecError> {
    let data = rlp.at(index)?.data()?;
    data.try_into().map_err(|_| CodecError::InvalidField {
        field,
        reason: format!("expected 32 bytes, got {}", data.len()),
    })
}

fn uint_field(
    rlp: &Rlp<'_>,
    index: usize,
    field: &'static str,
    max: usize,
) -> Result<u128, CodecError> {
    let data = rlp.at(index)?.data()?;
    if data.len() > max {
        return Err(CodecError::InvalidField {
            field,
            reason: format!("{} bytes exceeds {}", data.len(), max),
        });
    }
    Ok(data.iter().fold(0u128, |acc, byte| (acc << 8) | *byte as u128))
}

/// `BlockCodec` over Ethereum RLP.
#[derive(Clone, Copy, Debug, Default)]
pub struct RlpBlockCodec;

impl RlpBlockCodec {
    pub fn new() -> Self {
        Self
    }
}

impl BlockCodec for RlpBlockCodec {
    fn decode_header(&self, raw: &[u8]) -> Result<BlockHeader, CodecError> {
        let rlp = Rlp::new(raw);
        if !rlp.is_list() {
            return Err(CodecError::Rlp("header is not a list".to_string()));
        }

        let info = rlp.payload_info()?;
        if info.header_len + info.value_len != raw.len() {
            return Err(CodecError::Rlp("trailing bytes after header".to_string()));
        }

        let fields = rlp.item_count()?;
        if fields < MIN_HEADER_FIELDS {
            return Err(CodecError::Rlp(format!(
                "header has {} fields, expected at least {}",
                fields, MIN_HEADER_FIELDS
            )));
        }

        Ok(BlockHeader {
            hash: keccak256(raw),
            parent_hash: hash_field(&rlp, 0, "parent_hash")?,
            uncles_hash: hash_field(&rlp, 1, "uncles_hash")?,
            transactions_root: hash_field(&rlp, 4, "transactions_root")?,
            receipts_root: hash_field(&rlp, 5, "receipts_root")?,
            difficulty: uint_field(&rlp, 7, "difficulty", 16)?,
            number: uint_field(&rlp, 8, "number", 8)? as u64,
        })
    }

    fn assemble_block(
        &self,
        raw_header: &[u8],
        raw_body: &[u8],
    ) -> Result<AssembledBlock, CodecError> {
        let header = self.decode_header(raw_header)?;

        let body = Rlp::new(raw_body);
        if !body.is_list() {
            return Err(CodecError::Rlp("body is not a list".to_string()));
        }
        let parts = body.item_count()?;
        if !(2..=3).contains(&parts) {
            return Err(CodecError::Rlp(format!("body has {} parts", parts)));
        }

        let transactions = body.at(0)?;
        let uncles = body.at(1)?;
        if !transactions.is_list() || !uncles.is_list() {
            return Err(CodecError::Rlp("body parts must be lists".to_string()));
        }

        if keccak256(uncles.as_raw()) != header.uncles_hash {
            return Err(CodecError::BodyMismatch("uncles hash".to_string()));
        }

        let tx_count = transactions.item_count()?;
        if (tx_count == 0) != (header.transactions_root == EMPTY_TRIE_ROOT) {
            return Err(CodecError::BodyMismatch("transactions root".to_string()));
        }

        let transactions = transactions
            .iter()
            .map(|tx| tx.as_raw().to_vec())
            .collect();
        let uncles = uncles.iter().map(|u| u.as_raw().to_vec()).collect();

        Ok(AssembledBlock {
            header,
            transactions,
            uncles,
        })
    }
}
