use thiserror::Error;

use crate::state::{block::Block, hash::Hash};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("block not found: {0}")]
    BlockNotFound(Hash),

    #[error("chain head not set")]
    HeadNotSet,

    #[error("database is closed")]
    Closed,

    #[error("block encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Block and chain-head persistence.
///
/// Implementations must agree on error semantics: a missing block is
/// [`StorageError::BlockNotFound`], an unset head is
/// [`StorageError::HeadNotSet`], and any call after [`Database::close`] fails
/// with [`StorageError::Closed`].
pub trait Database: Send + Sync {
    /// Stores `block` under its hash. Storing the same block twice is harmless.
    fn put_block(&self, block: &Block) -> Result<(), StorageError>;

    fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, StorageError>;

    fn set_head(&self, hash: &Hash) -> Result<(), StorageError>;

    fn get_head(&self) -> Result<Hash, StorageError>;

    fn close(&self) -> Result<(), StorageError>;

    /// Whether a block with `hash` is stored. Errors other than not-found
    /// propagate.
    fn contains_block(&self, hash: &Hash) -> Result<bool, StorageError> {
        match self.get_block_by_hash(hash) {
            Ok(_) => Ok(true),
            Err(StorageError::BlockNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Head hash if one is set, `None` otherwise.
    fn try_get_head(&self) -> Result<Option<Hash>, StorageError> {
        match self.get_head() {
            Ok(hash) => Ok(Some(hash)),
            Err(StorageError::HeadNotSet) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
