use serde::{Deserialize, Serialize};

use crate::state::{
    hash::{Hash, keccak256},
    transaction::Transaction,
};

/// [`BlockHeader`] is the hashed part of a block.
///
/// Field order defines the canonical JSON pre-image of the block hash.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Hash of the preceding block, zero only for genesis
    pub parent_hash: Hash,
    /// Combined hash of the ordered transaction list
    pub transaction_hash: Hash,
    /// Distance from genesis
    pub height: u64,
}

/// [`Block`] is an ordered batch of transactions chained to its parent.
///
/// The block identity is the hash of its header alone; the body is bound to
/// the header only through `transaction_hash`, which is why the validator
/// recomputes it.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct Block {
    #[serde(rename = "blockHeader")]
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Builds a block on top of `parent_hash`, computing the combined
    /// transaction hash from `transactions`.
    pub fn new(
        parent_hash: Hash,
        height: u64,
        transactions: Vec<Transaction>,
    ) -> Result<Self, serde_json::Error> {
        let transaction_hash = combined_hash(&transactions)?;
        Ok(Self {
            header: BlockHeader {
                parent_hash,
                transaction_hash,
                height,
            },
            transactions,
        })
    }

    /// keccak256 over the canonical JSON of the header.
    pub fn hash(&self) -> Result<Hash, serde_json::Error> {
        Ok(keccak256(serde_json::to_vec(&self.header)?))
    }

    #[inline]
    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    #[inline]
    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Folds the ordered transaction hashes into a single digest:
/// `keccak256(hash(tx_0) || hash(tx_1) || ...)`.
///
/// An empty list hashes to `keccak256("")`.
pub fn combined_hash(transactions: &[Transaction]) -> Result<Hash, serde_json::Error> {
    let mut buffer = Vec::with_capacity(transactions.len() * 32);
    for tx in transactions {
        buffer.extend_from_slice(tx.hash()?.as_bytes());
    }
    Ok(keccak256(&buffer))
}
