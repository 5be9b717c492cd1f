use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use super::database::{Database, StorageError};
use crate::state::{block::Block, hash::Hash};

#[derive(Default)]
struct Inner {
    blocks: HashMap<Hash, Block>,
    head: Option<Hash>,
    closed: bool,
}

/// Volatile [`Database`] backed by a hash map. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryDatabase {
    inner: RwLock<Inner>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .blocks
            .len()
    }
}

impl Database for MemoryDatabase {
    fn put_block(&self, block: &Block) -> Result<(), StorageError> {
        let hash = block.hash()?;
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Err(StorageError::Closed);
        }
        inner.blocks.insert(hash, block.clone());
        Ok(())
    }

    fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, StorageError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Err(StorageError::Closed);
        }
        inner
            .blocks
            .get(hash)
            .cloned()
            .ok_or(StorageError::BlockNotFound(*hash))
    }

    fn set_head(&self, hash: &Hash) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Err(StorageError::Closed);
        }
        inner.head = Some(*hash);
        Ok(())
    }

    fn get_head(&self) -> Result<Hash, StorageError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Err(StorageError::Closed);
        }
        inner.head.ok_or(StorageError::HeadNotSet)
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.closed = true;
        inner.blocks.clear();
        inner.head = None;
        Ok(())
    }
}
