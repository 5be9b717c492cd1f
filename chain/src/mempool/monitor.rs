use std::{sync::Arc, time::Duration};

use slog::Logger;
use tokio_util::sync::CancellationToken;

use super::Mempool;

/// Logs the pool size every `interval`, but only when it changed since the
/// previous tick. Pending transactions are dumped at debug level.
pub async fn run_monitor(
    mempool: Arc<Mempool>,
    interval: Duration,
    cancel: CancellationToken,
    logger: Logger,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut last_size = 0usize;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let stats = mempool.stats();
                if last_size != stats.current_size {
                    slog::info!(
                        logger,
                        "Mempool size changed";
                        "size" => stats.current_size,
                        "total_added" => stats.total_added,
                        "total_pruned" => stats.total_pruned,
                        "total_rejected" => stats.total_rejected,
                    );
                    for tx in mempool.list() {
                        slog::debug!(logger, "Pending transaction"; "tx" => tx.pretty());
                    }
                    last_size = stats.current_size;
                }
            }
        }
    }

    slog::debug!(logger, "Mempool monitor stopped");
}
