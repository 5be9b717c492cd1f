//! Process-level container wiring every component together.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use slog::Logger;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    chainhead::{CachedChainhead, Chainhead},
    crypto::wallet::Wallet,
    genesis::{GenesisError, GenesisOutcome, initialize_genesis},
    mempool::{Mempool, run_monitor},
    producer::BlockProducer,
    services::{BlockProcessingService, TransactionProcessingService},
    storage::Database,
    traits::{Consumer, Publisher, TransactionsInput},
    validation::{BlockValidator, Validator},
};

/// Behaviour switches of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Run the block producer on this node
    pub block_producer: bool,
    /// Interval between producer ticks
    #[serde(with = "millis")]
    pub block_time: Duration,
    /// Interval between mempool size checks
    #[serde(with = "millis")]
    pub monitor_interval: Duration,
    /// Re-verify transaction signatures of inbound blocks
    pub verify_block_transactions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            block_producer: false,
            block_time: Duration::from_secs(5),
            monitor_interval: Duration::from_secs(1),
            verify_block_transactions: false,
        }
    }
}

/// One instance of every component, shared by handle.
#[derive(Clone)]
pub struct Components {
    pub db: Arc<dyn Database>,
    pub chainhead: Arc<dyn Chainhead>,
    pub mempool: Arc<Mempool>,
    pub validator: Arc<dyn Validator>,
    pub wallet: Arc<Wallet>,
    pub publisher: Arc<dyn Publisher>,
    pub consumer: Arc<dyn Consumer>,
    pub logger: Logger,
}

impl Components {
    /// Builds the default chainhead, mempool and validator on top of the
    /// given collaborators.
    pub fn new(
        db: Arc<dyn Database>,
        wallet: Wallet,
        publisher: Arc<dyn Publisher>,
        consumer: Arc<dyn Consumer>,
        config: &AppConfig,
        logger: Logger,
    ) -> Self {
        let chainhead: Arc<dyn Chainhead> = Arc::new(CachedChainhead::new(Arc::clone(&db)));
        let validator: Arc<dyn Validator> = Arc::new(
            BlockValidator::new(Arc::clone(&db))
                .with_transaction_verification(config.verify_block_transactions),
        );
        let mempool = Arc::new(Mempool::new(logger.new(slog::o!("component" => "mempool"))));
        Self {
            db,
            chainhead,
            mempool,
            validator,
            wallet: Arc::new(wallet),
            publisher,
            consumer,
            logger,
        }
    }

    pub fn block_processing_service(&self) -> BlockProcessingService {
        BlockProcessingService::new(
            Arc::clone(&self.db),
            Arc::clone(&self.chainhead),
            Arc::clone(&self.validator),
            Arc::clone(&self.mempool),
            Arc::clone(&self.consumer),
            self.logger.new(slog::o!("component" => "blocks")),
        )
    }

    pub fn transaction_processing_service(&self) -> TransactionProcessingService {
        TransactionProcessingService::new(
            Arc::clone(&self.wallet),
            Arc::clone(&self.mempool),
            Arc::clone(&self.publisher),
            Arc::clone(&self.consumer),
            self.logger.new(slog::o!("component" => "transactions")),
        )
    }

    pub fn block_producer(&self, block_time: Duration) -> BlockProducer {
        BlockProducer::new(
            Arc::clone(&self.mempool),
            Arc::clone(&self.chainhead),
            Arc::clone(&self.publisher),
            block_time,
            self.logger.new(slog::o!("component" => "producer")),
        )
    }
}

pub struct App {
    components: Components,
    config: AppConfig,
}

/// Running tasks of a started [`App`].
pub struct AppHandle {
    pub genesis: GenesisOutcome,
    tasks: Vec<JoinHandle<()>>,
}

impl AppHandle {
    /// Waits for every task to finish. Tasks exit once the cancellation token
    /// passed to [`App::start`] fires or their source closes.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

impl App {
    pub fn new(components: Components, config: AppConfig) -> Self {
        Self { components, config }
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Initializes genesis, then spawns every long-running task under
    /// `cancel`. Must be called inside a tokio runtime.
    pub fn start(
        self,
        inputs: Vec<Box<dyn TransactionsInput>>,
        cancel: CancellationToken,
    ) -> Result<AppHandle, GenesisError> {
        let c = &self.components;
        let genesis = initialize_genesis(c.db.as_ref(), c.chainhead.as_ref(), &c.logger)?;

        let mut tasks = Arc::new(c.transaction_processing_service()).spawn(inputs, cancel.clone());
        tasks.push(tokio::spawn(
            Arc::new(c.block_processing_service()).run(cancel.clone()),
        ));
        if self.config.block_producer {
            tasks.push(tokio::spawn(
                c.block_producer(self.config.block_time).run(cancel.clone()),
            ));
        }
        tasks.push(tokio::spawn(run_monitor(
            Arc::clone(&c.mempool),
            self.config.monitor_interval,
            cancel,
            c.logger.new(slog::o!("component" => "monitor")),
        )));

        slog::info!(
            c.logger,
            "Node started";
            "address" => c.wallet.address(),
            "block_producer" => self.config.block_producer,
        );
        Ok(AppHandle { genesis, tasks })
    }
}

/// Serde adapter for durations given as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
