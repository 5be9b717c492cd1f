use std::sync::Arc;

use anyhow::Result;

pub mod config;
pub mod conversions;
pub mod database;
pub mod memory;
pub mod store;
pub mod tables;

pub use config::{StorageBackend, StorageConfig};
pub use database::{Database, StorageError};
pub use memory::MemoryDatabase;
pub use store::RedbDatabase;

/// Opens the backend selected by `config`.
pub fn open_database(config: &StorageConfig) -> Result<Arc<dyn Database>> {
    Ok(match config.backend {
        StorageBackend::Memory => Arc::new(MemoryDatabase::new()),
        StorageBackend::Redb => Arc::new(RedbDatabase::open(&config.path)?),
    })
}
