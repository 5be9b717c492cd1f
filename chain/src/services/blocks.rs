//! Block Processing Service
//!
//! Consumes blocks from the network, validates them and commits the accepted
//! ones. A commit is three separate steps, in this order:
//!
//! 1. `Database::put_block`
//! 2. `Chainhead::set_head` (persisted head, then cache)
//! 3. `Mempool::prune` of the included transactions
//!
//! The steps are not atomic. A failure in step 1 abandons the block; a
//! failure in step 2 leaves an orphan stored block and skips step 3.

use std::sync::Arc;

use slog::Logger;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    chainhead::Chainhead,
    mempool::Mempool,
    state::{block::Block, hash::Hash},
    storage::{Database, StorageError},
    traits::{Consumer, NetworkError},
    validation::{ValidationError, Validator},
};

/// Local failures while processing a block. Rejections of the block itself
/// are reported through [`CommitOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum BlockProcessingError {
    #[error("validation could not complete: {0}")]
    Validation(#[source] ValidationError),

    #[error("failed to store block {hash}: {source}")]
    Store {
        hash: Hash,
        #[source]
        source: StorageError,
    },

    #[error("block {hash} stored but head not updated: {source}")]
    Head {
        hash: Hash,
        #[source]
        source: StorageError,
    },

    #[error("block encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug)]
pub enum CommitOutcome {
    Committed {
        hash: Hash,
        height: u64,
        /// Transactions actually removed from the mempool
        pruned: usize,
    },
    Rejected(ValidationError),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

pub struct BlockProcessingService {
    db: Arc<dyn Database>,
    chainhead: Arc<dyn Chainhead>,
    validator: Arc<dyn Validator>,
    mempool: Arc<Mempool>,
    consumer: Arc<dyn Consumer>,
    logger: Logger,
}

impl BlockProcessingService {
    pub fn new(
        db: Arc<dyn Database>,
        chainhead: Arc<dyn Chainhead>,
        validator: Arc<dyn Validator>,
        mempool: Arc<Mempool>,
        consumer: Arc<dyn Consumer>,
        logger: Logger,
    ) -> Self {
        Self {
            db,
            chainhead,
            validator,
            mempool,
            consumer,
            logger,
        }
    }

    /// Validates `block` and, if accepted, commits it.
    pub fn process_block(&self, block: &Block) -> Result<CommitOutcome, BlockProcessingError> {
        match self.validator.validate(block) {
            Ok(()) => {}
            Err(e) if e.is_rejection() => return Ok(CommitOutcome::Rejected(e)),
            Err(e) => return Err(BlockProcessingError::Validation(e)),
        }

        let hash = block.hash()?;
        self.db
            .put_block(block)
            .map_err(|source| BlockProcessingError::Store { hash, source })?;
        self.chainhead
            .set_head(block)
            .map_err(|source| BlockProcessingError::Head { hash, source })?;
        let pruned = self.mempool.prune(&block.transactions);

        Ok(CommitOutcome::Committed {
            hash,
            height: block.height(),
            pruned,
        })
    }

    /// Consumes and processes blocks until the consumer closes or `cancel`
    /// fires. Rejected blocks are logged and discarded. Commits run on the
    /// blocking pool since storage writes are synchronous.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = self.consumer.consume_block() => received,
            };
            let block = match received {
                Ok(block) => block,
                Err(NetworkError::Closed) => {
                    slog::info!(self.logger, "Block consumer closed");
                    break;
                }
                Err(e) => {
                    slog::warn!(self.logger, "Failed to consume block"; "error" => %e);
                    continue;
                }
            };

            let tx_count = block.transactions.len();
            let service = Arc::clone(&self);
            let processed =
                match tokio::task::spawn_blocking(move || service.process_block(&block)).await {
                    Ok(processed) => processed,
                    Err(e) => {
                        slog::error!(self.logger, "Block commit task failed"; "error" => %e);
                        continue;
                    }
                };

            match processed {
                Ok(CommitOutcome::Committed {
                    hash,
                    height,
                    pruned,
                }) => {
                    slog::info!(
                        self.logger,
                        "Block committed";
                        "hash" => %hash,
                        "height" => height,
                        "tx_count" => tx_count,
                        "pruned" => pruned,
                    );
                }
                Ok(CommitOutcome::Rejected(reason)) => {
                    slog::info!(self.logger, "Block rejected"; "reason" => %reason);
                }
                Err(e) => {
                    slog::error!(self.logger, "Block commit failed"; "error" => %e);
                }
            }
        }
        slog::debug!(self.logger, "Block processing loop stopped");
    }
}
