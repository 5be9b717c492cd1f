use std::sync::Arc;

use anyhow::{Context, Result};
use chain::{
    app::{App, Components},
    crypto::wallet::Wallet,
    storage::open_database,
    traits::{Consumer, Publisher, TransactionsInput},
};
use p2p::NetworkService;
use slog::{Logger, o};
use tokio_util::sync::CancellationToken;

use crate::{
    config::NodeConfig,
    input::{HttpInput, StdinInput},
};

/// Runs a node until `cancel` fires.
///
/// Startup failures (key loading, storage, listener binds, genesis) are
/// returned before any task is spawned; after that the node only stops on
/// cancellation.
pub async fn run(config: NodeConfig, logger: Logger, cancel: CancellationToken) -> Result<()> {
    let wallet = Wallet::load_from_file(&config.node.key_path).with_context(|| {
        format!("failed to load key from {}", config.node.key_path.display())
    })?;

    let db = open_database(&config.storage).context("failed to open storage")?;

    let network = NetworkService::start(
        config.p2p.clone(),
        cancel.clone(),
        logger.new(o!("component" => "p2p")),
    )
    .await
    .context("failed to start p2p network")?;

    let mut inputs: Vec<Box<dyn TransactionsInput>> = Vec::new();
    if config.node.stdin {
        inputs.push(Box::new(StdinInput::new(logger.new(o!("input" => "stdin")))));
    }
    if let Some(addr) = config.http.listen_addr {
        let http = HttpInput::bind(addr, logger.new(o!("input" => "http"))).await?;
        inputs.push(Box::new(http));
    }

    let publisher: Arc<dyn Publisher> = network.clone();
    let consumer: Arc<dyn Consumer> = network;
    let components = Components::new(
        Arc::clone(&db),
        wallet,
        publisher,
        consumer,
        &config.node.app,
        logger.clone(),
    );
    let handle = App::new(components, config.node.app.clone())
        .start(inputs, cancel.clone())
        .context("genesis initialization failed")?;
    slog::info!(logger, "Genesis ready"; "outcome" => ?handle.genesis);

    handle.join().await;

    slog::info!(logger, "Shutting down");
    db.close().context("failed to close storage")?;
    Ok(())
}
