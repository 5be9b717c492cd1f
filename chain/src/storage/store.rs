use std::{
    path::Path,
    sync::{PoisonError, RwLock},
};

use anyhow::{Context, Result};
use redb::ReadableDatabase;

use super::{
    conversions::{deserialize_block, hash_from_slice, serialize_block},
    database::{Database, StorageError},
    tables::{BLOCKS, CHAIN_HEAD_KEY, META},
};
use crate::state::{block::Block, hash::Hash};

/// Durable [`Database`] on top of redb. Blocks are stored rkyv-encoded.
pub struct RedbDatabase {
    db: RwLock<Option<redb::Database>>,
}

impl RedbDatabase {
    /// Opens a database from a path to the database file, creating it (and
    /// its parent directories) if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = if path.exists() {
            redb::Database::open(path).context("Failed to open database")?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            redb::Database::create(path).context("Failed to create database")?
        };
        let store = Self {
            db: RwLock::new(Some(db)),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.with_db(|db| {
            let write_txn = db
                .begin_write()
                .context("Failed to begin write transaction")?;
            {
                write_txn
                    .open_table(BLOCKS)
                    .context("Failed to open blocks table")?;
                write_txn
                    .open_table(META)
                    .context("Failed to open meta table")?;
            }
            write_txn
                .commit()
                .context("Failed to commit write transaction")
        })
        .map_err(|e| anyhow::anyhow!(e))
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&redb::Database) -> Result<T>,
    ) -> std::result::Result<T, StorageError> {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(f(db)?)
    }

    fn read_block(db: &redb::Database, hash: &Hash) -> Result<Option<Block>> {
        let read = db.begin_read()?;
        let table = read.open_table(BLOCKS)?;
        match table.get(hash.as_bytes().as_slice())? {
            Some(row) => Ok(Some(deserialize_block(row.value())?)),
            None => Ok(None),
        }
    }

    fn read_head(db: &redb::Database) -> Result<Option<Hash>> {
        let read = db.begin_read()?;
        let table = read.open_table(META)?;
        match table.get(CHAIN_HEAD_KEY)? {
            Some(row) => Ok(Some(hash_from_slice(row.value())?)),
            None => Ok(None),
        }
    }
}

impl Database for RedbDatabase {
    fn put_block(&self, block: &Block) -> std::result::Result<(), StorageError> {
        let hash = block.hash()?;
        let bytes = serialize_block(block)?;
        self.with_db(|db| {
            let write_txn = db
                .begin_write()
                .context("Failed to begin write transaction")?;
            {
                let mut table = write_txn
                    .open_table(BLOCKS)
                    .context("Failed to open blocks table")?;
                table
                    .insert(hash.as_bytes().as_slice(), &bytes[..])
                    .context("Failed to insert block")?;
            }
            write_txn
                .commit()
                .context("Failed to commit write transaction")
        })
    }

    fn get_block_by_hash(&self, hash: &Hash) -> std::result::Result<Block, StorageError> {
        self.with_db(|db| Self::read_block(db, hash).context("Failed to read block"))?
            .ok_or(StorageError::BlockNotFound(*hash))
    }

    fn set_head(&self, hash: &Hash) -> std::result::Result<(), StorageError> {
        self.with_db(|db| {
            let write_txn = db
                .begin_write()
                .context("Failed to begin write transaction")?;
            {
                let mut table = write_txn
                    .open_table(META)
                    .context("Failed to open meta table")?;
                table
                    .insert(CHAIN_HEAD_KEY, hash.as_bytes().as_slice())
                    .context("Failed to store chain head")?;
            }
            write_txn
                .commit()
                .context("Failed to commit write transaction")
        })
    }

    fn get_head(&self) -> std::result::Result<Hash, StorageError> {
        self.with_db(|db| Self::read_head(db).context("Failed to read chain head"))?
            .ok_or(StorageError::HeadNotSet)
    }

    fn close(&self) -> std::result::Result<(), StorageError> {
        // dropping the handle releases the file lock
        self.db
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
