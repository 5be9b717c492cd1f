//! Periodic block assembly.

use std::{sync::Arc, time::Duration};

use slog::Logger;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::{
    chainhead::Chainhead,
    mempool::Mempool,
    state::{block::Block, hash::Hash},
    storage::StorageError,
    traits::Publisher,
};

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("failed to resolve chain head: {0}")]
    Head(#[from] StorageError),

    #[error("block encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result of one producer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The mempool was empty
    Idle,
    Produced {
        hash: Hash,
        height: u64,
        tx_count: usize,
        /// Whether the publisher accepted the block
        published: bool,
    },
}

/// Drains the mempool into a new block on every tick and publishes it.
///
/// The producer never commits its own block: it reaches the local chain the
/// same way a remote block does, through the block processing service.
pub struct BlockProducer {
    mempool: Arc<Mempool>,
    chainhead: Arc<dyn Chainhead>,
    publisher: Arc<dyn Publisher>,
    block_time: Duration,
    logger: Logger,
}

impl BlockProducer {
    pub fn new(
        mempool: Arc<Mempool>,
        chainhead: Arc<dyn Chainhead>,
        publisher: Arc<dyn Publisher>,
        block_time: Duration,
        logger: Logger,
    ) -> Self {
        Self {
            mempool,
            chainhead,
            publisher,
            block_time,
            logger,
        }
    }

    /// Builds and publishes one block from the current mempool snapshot.
    ///
    /// Head resolution or hashing failures abort the tick before the mempool
    /// is touched. A publish failure is logged and the transactions are
    /// pruned anyway.
    pub async fn tick(&self) -> Result<TickOutcome, ProducerError> {
        let transactions = self.mempool.list();
        if transactions.is_empty() {
            return Ok(TickOutcome::Idle);
        }

        let head = self.chainhead.get_head()?;
        let block = Block::new(head.hash()?, head.height() + 1, transactions)?;
        let hash = block.hash()?;

        let published = match self.publisher.publish_block(&block).await {
            Ok(()) => true,
            Err(e) => {
                slog::warn!(
                    self.logger,
                    "Failed to publish block";
                    "hash" => %hash,
                    "error" => %e,
                );
                false
            }
        };

        let pruned = self.mempool.prune(&block.transactions);
        slog::info!(
            self.logger,
            "Produced block";
            "hash" => %hash,
            "height" => block.height(),
            "tx_count" => block.transactions.len(),
            "pruned" => pruned,
        );

        Ok(TickOutcome::Produced {
            hash,
            height: block.height(),
            tx_count: block.transactions.len(),
            published,
        })
    }

    /// Ticks every `block_time` until `cancel` fires. The first tick happens
    /// one full interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.block_time, self.block_time);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        slog::info!(self.logger, "Block producer started"; "block_time_ms" => self.block_time.as_millis() as u64);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        slog::error!(self.logger, "Block production aborted"; "error" => %e);
                    }
                }
            }
        }

        slog::info!(self.logger, "Block producer stopped");
    }
}
