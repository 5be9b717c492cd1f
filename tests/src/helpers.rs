//! Shared fixtures: test logger, in-process nodes and polling.

use std::{str::FromStr, sync::Arc, time::Duration};

use chain::{
    Block,
    app::{App, AppConfig, AppHandle, Components},
    chainhead::Chainhead,
    crypto::wallet::Wallet,
    storage::MemoryDatabase,
    traits::{Consumer, Publisher, TransactionsInput},
};
use slog::{Drain, Level, Logger, o};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Upper bound for any scenario to settle.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Block time used by producer nodes in scenarios.
pub const TEST_BLOCK_TIME: Duration = Duration::from_millis(200);

/// Terminal logger honouring `RUST_LOG`, discarding below `warn` by default.
pub fn create_test_logger() -> Logger {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| Level::from_str(&s).ok())
        .unwrap_or(Level::Warning);

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .build()
        .fuse()
        .filter_level(level)
        .fuse();

    Logger::root(drain, o!())
}

pub fn producer_config() -> AppConfig {
    AppConfig {
        block_producer: true,
        block_time: TEST_BLOCK_TIME,
        monitor_interval: Duration::from_millis(100),
        ..AppConfig::default()
    }
}

pub fn follower_config() -> AppConfig {
    AppConfig {
        block_producer: false,
        monitor_interval: Duration::from_millis(100),
        ..AppConfig::default()
    }
}

/// Local input fed by the test.
pub struct ChannelInput(mpsc::Receiver<String>);

impl TransactionsInput for ChannelInput {
    fn input_channel(self: Box<Self>, _cancel: CancellationToken) -> mpsc::Receiver<String> {
        self.0
    }
}

/// A running node on an in-memory database.
pub struct TestNode {
    pub components: Components,
    input: mpsc::Sender<String>,
    handle: AppHandle,
}

impl TestNode {
    pub fn spawn(
        name: &str,
        publisher: Arc<dyn Publisher>,
        consumer: Arc<dyn Consumer>,
        config: AppConfig,
        cancel: CancellationToken,
        logger: &Logger,
    ) -> Self {
        let logger = logger.new(o!("node" => name.to_string()));
        let components = Components::new(
            Arc::new(MemoryDatabase::new()),
            Wallet::generate(&mut rand::rngs::OsRng),
            publisher,
            consumer,
            &config,
            logger,
        );
        let (input, receiver) = mpsc::channel(16);
        let handle = App::new(components.clone(), config)
            .start(vec![Box::new(ChannelInput(receiver))], cancel)
            .expect("genesis initialization");
        Self {
            components,
            input,
            handle,
        }
    }

    /// Types `message` into this node, as a user would.
    pub async fn submit(&self, message: &str) {
        self.input
            .send(message.to_string())
            .await
            .expect("node input closed");
    }

    pub fn head(&self) -> Block {
        self.components.chainhead.get_head().expect("chain head")
    }

    pub fn pending(&self) -> usize {
        self.components.mempool.len()
    }

    /// Waits for the node tasks; the node's cancellation token must have
    /// fired.
    pub async fn stop(self) {
        drop(self.input);
        self.handle.join().await;
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
