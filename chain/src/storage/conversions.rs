use anyhow::Result;
use rkyv::{api::high::to_bytes_with_alloc, rancor, ser::allocator::Arena, util::AlignedVec};

use crate::state::{
    block::Block,
    hash::{HASH_LENGTH, Hash},
};

pub fn serialize_block(block: &Block) -> Result<AlignedVec> {
    let mut arena = Arena::new();
    to_bytes_with_alloc::<_, rancor::Error>(block, arena.acquire())
        .map_err(|e| anyhow::anyhow!("Serialization failed: {:?}", e))
}

/// Decodes a block stored by [`serialize_block`].
///
/// Bytes handed out by the database carry no alignment guarantee, so they are
/// copied into an aligned buffer and validated before deserializing.
pub fn deserialize_block(bytes: &[u8]) -> Result<Block> {
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<Block, rancor::Error>(&aligned)
        .map_err(|e| anyhow::anyhow!("Failed to deserialize block: {:?}", e))
}

pub fn hash_from_slice(bytes: &[u8]) -> Result<Hash> {
    let arr: [u8; HASH_LENGTH] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("stored hash has {} bytes", bytes.len()))?;
    Ok(Hash(arr))
}
