//! Chain tip tracking.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    genesis::GENESIS_HASH,
    state::block::Block,
    storage::{Database, StorageError},
};

/// Tracks the currently accepted chain tip.
pub trait Chainhead: Send + Sync {
    /// Makes `block` the head. No validation happens here.
    fn set_head(&self, block: &Block) -> Result<(), StorageError>;

    fn get_head(&self) -> Result<Block, StorageError>;
}

/// [`Chainhead`] caching the head block in memory on top of a [`Database`].
///
/// On a cold cache the head is resolved from the persisted head hash, or from
/// the genesis hash if none was ever set. Lookup and cache fill happen under
/// the same lock as [`Chainhead::set_head`].
pub struct CachedChainhead {
    db: Arc<dyn Database>,
    cache: Mutex<Option<Block>>,
}

impl CachedChainhead {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            cache: Mutex::new(None),
        }
    }
}

impl Chainhead for CachedChainhead {
    fn set_head(&self, block: &Block) -> Result<(), StorageError> {
        let hash = block.hash()?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        // persisted first, so a failure leaves cache and database agreeing
        self.db.set_head(&hash)?;
        *cache = Some(block.clone());
        Ok(())
    }

    fn get_head(&self) -> Result<Block, StorageError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(block) = cache.as_ref() {
            return Ok(block.clone());
        }

        let hash = self.db.try_get_head()?.unwrap_or(GENESIS_HASH);
        let block = self.db.get_block_by_hash(&hash)?;
        *cache = Some(block.clone());
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        genesis::genesis_block,
        state::{hash::Hash, transaction::Transaction},
        storage::MemoryDatabase,
    };

    fn child_of(parent: &Block) -> Block {
        let tx = Transaction::new("0x01".into(), "x".into(), vec![1u8; 65]);
        Block::new(parent.hash().unwrap(), parent.height() + 1, vec![tx]).unwrap()
    }

    #[test]
    fn cold_cache_falls_back_to_genesis() {
        let db = Arc::new(MemoryDatabase::new());
        db.put_block(&genesis_block()).unwrap();

        let head = CachedChainhead::new(db).get_head().unwrap();
        assert_eq!(head.hash().unwrap(), GENESIS_HASH);
    }

    #[test]
    fn cold_cache_uses_persisted_head() {
        let db = Arc::new(MemoryDatabase::new());
        let genesis = genesis_block();
        let next = child_of(&genesis);
        db.put_block(&genesis).unwrap();
        db.put_block(&next).unwrap();
        db.set_head(&next.hash().unwrap()).unwrap();

        let head = CachedChainhead::new(db).get_head().unwrap();
        assert_eq!(head, next);
    }

    #[test]
    fn missing_head_block_is_not_found() {
        let db = Arc::new(MemoryDatabase::new());
        let chainhead = CachedChainhead::new(db);
        assert!(matches!(
            chainhead.get_head(),
            Err(StorageError::BlockNotFound(h)) if h == GENESIS_HASH
        ));
    }

    #[test]
    fn set_head_persists_before_caching() {
        let db = Arc::new(MemoryDatabase::new());
        let chainhead = CachedChainhead::new(db.clone());
        let block = child_of(&genesis_block());

        // the block itself need not be stored, set_head does not validate
        chainhead.set_head(&block).unwrap();
        assert_eq!(db.get_head().unwrap(), block.hash().unwrap());
        assert_eq!(chainhead.get_head().unwrap(), block);
    }

    #[test]
    fn failed_persist_leaves_cache_untouched() {
        let db = Arc::new(MemoryDatabase::new());
        let genesis = genesis_block();
        db.put_block(&genesis).unwrap();
        let chainhead = CachedChainhead::new(db.clone());
        assert_eq!(chainhead.get_head().unwrap(), genesis);

        db.close().unwrap();
        assert!(chainhead.set_head(&child_of(&genesis)).is_err());
        assert_eq!(chainhead.get_head().unwrap(), genesis);
        assert_ne!(genesis.hash().unwrap(), Hash::ZERO);
    }
}
