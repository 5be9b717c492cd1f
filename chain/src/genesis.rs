//! Deterministic root block.

use slog::Logger;
use thiserror::Error;

use crate::{
    chainhead::Chainhead,
    state::{block::{Block, BlockHeader}, hash::Hash},
    storage::{Database, StorageError},
};

/// Hash of [`genesis_block`]: keccak256 of
/// `{"parentHash":"0x00..00","transactionHash":"0x00..00","height":0}`.
pub const GENESIS_HASH: Hash = Hash([
    0x71, 0x38, 0xc7, 0x62, 0x5b, 0x14, 0x01, 0xec,
    0x8b, 0x57, 0x4d, 0x30, 0xe3, 0x7c, 0xc7, 0xd3,
    0x1e, 0x8e, 0x38, 0xec, 0x78, 0xc0, 0x62, 0xd9,
    0x90, 0xbf, 0xb5, 0xcc, 0x2d, 0x4a, 0x0c, 0x45,
]);

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("incorrect genesis hash {computed}, expected 0x7138c762...0c45")]
    HashMismatch { computed: Hash },

    #[error("genesis encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenesisOutcome {
    Initialized,
    AlreadyInitialized,
}

/// Zero parent, zero transaction hash, height 0, no transactions.
///
/// The transaction hash is zero rather than the combined hash of the empty
/// list; genesis is never validated.
pub fn genesis_block() -> Block {
    Block {
        header: BlockHeader {
            parent_hash: Hash::ZERO,
            transaction_hash: Hash::ZERO,
            height: 0,
        },
        transactions: Vec::new(),
    }
}

/// Seeds `db` and `chainhead` with the genesis block on first run.
///
/// A no-op when the database already has a head. Otherwise genesis is
/// (re)stored and becomes the head, which also repairs a database holding the
/// genesis block without a head. Fails before writing anything if the
/// computed genesis hash differs from [`GENESIS_HASH`].
pub fn initialize_genesis(
    db: &dyn Database,
    chainhead: &dyn Chainhead,
    logger: &Logger,
) -> Result<GenesisOutcome, GenesisError> {
    let genesis = genesis_block();
    let computed = genesis.hash()?;
    if computed != GENESIS_HASH {
        return Err(GenesisError::HashMismatch { computed });
    }

    if let Some(head) = db.try_get_head()? {
        slog::info!(logger, "Chain head present, skipping genesis"; "head" => %head);
        return Ok(GenesisOutcome::AlreadyInitialized);
    }

    slog::info!(logger, "Initializing genesis"; "hash" => %GENESIS_HASH);
    db.put_block(&genesis)?;
    chainhead.set_head(&genesis)?;
    Ok(GenesisOutcome::Initialized)
}
