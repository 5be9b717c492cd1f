//! Transaction Processing Service
//!
//! Two independent loops:
//!
//! - **Outbound**: messages from every local input source are fanned into one
//!   channel, signed with the node wallet and published. They are not added
//!   to the local mempool here; the transport loops them back.
//! - **Inbound**: transactions from the consumer are submitted to the mempool,
//!   which verifies and deduplicates them.

use std::sync::Arc;

use slog::Logger;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    crypto::wallet::Wallet,
    mempool::{Mempool, SubmitOutcome},
    traits::{Consumer, NetworkError, Publisher, TransactionsInput},
};

/// Capacity of the fanned-in user message channel.
pub const INPUT_CHANNEL_CAPACITY: usize = 256;

pub struct TransactionProcessingService {
    wallet: Arc<Wallet>,
    mempool: Arc<Mempool>,
    publisher: Arc<dyn Publisher>,
    consumer: Arc<dyn Consumer>,
    logger: Logger,
}

impl TransactionProcessingService {
    pub fn new(
        wallet: Arc<Wallet>,
        mempool: Arc<Mempool>,
        publisher: Arc<dyn Publisher>,
        consumer: Arc<dyn Consumer>,
        logger: Logger,
    ) -> Self {
        Self {
            wallet,
            mempool,
            publisher,
            consumer,
            logger,
        }
    }

    /// Spawns the inbound loop and the outbound loop fed by `inputs`.
    pub fn spawn(
        self: Arc<Self>,
        inputs: Vec<Box<dyn TransactionsInput>>,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let messages = fan_in(inputs, cancel.clone());
        vec![
            tokio::spawn(Arc::clone(&self).run_inbound(cancel.clone())),
            tokio::spawn(self.run_outbound(messages, cancel)),
        ]
    }

    /// Signs and publishes every message until the channel closes or
    /// `cancel` fires.
    pub async fn run_outbound(
        self: Arc<Self>,
        mut messages: mpsc::Receiver<String>,
        cancel: CancellationToken,
    ) {
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = messages.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            self.publish_message(&message).await;
        }
        slog::debug!(self.logger, "Outbound transaction loop stopped");
    }

    /// Signs `message` with the node wallet and publishes the transaction.
    pub async fn publish_message(&self, message: &str) -> bool {
        let tx = self.wallet.sign(message);
        match self.publisher.publish_transaction(&tx).await {
            Ok(()) => {
                slog::info!(self.logger, "Published transaction"; "from" => &tx.from, "data" => message);
                true
            }
            Err(e) => {
                slog::warn!(self.logger, "Failed to publish transaction"; "error" => %e);
                false
            }
        }
    }

    /// Submits every consumed transaction to the mempool until the consumer
    /// closes or `cancel` fires.
    pub async fn run_inbound(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = self.consumer.consume_transaction() => received,
            };
            match received {
                Ok(tx) => {
                    if let SubmitOutcome::Rejected(reason) = self.mempool.submit(tx) {
                        slog::debug!(self.logger, "Dropped inbound transaction"; "reason" => ?reason);
                    }
                }
                Err(NetworkError::Closed) => {
                    slog::info!(self.logger, "Transaction consumer closed");
                    break;
                }
                Err(e) => {
                    slog::warn!(self.logger, "Failed to consume transaction"; "error" => %e);
                }
            }
        }
        slog::debug!(self.logger, "Inbound transaction loop stopped");
    }
}

/// Merges every input source into one bounded channel. One forwarding task is
/// spawned per source; the merged channel closes once all sources are done.
pub fn fan_in(
    inputs: Vec<Box<dyn TransactionsInput>>,
    cancel: CancellationToken,
) -> mpsc::Receiver<String> {
    let (sender, receiver) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    for input in inputs {
        let mut source = input.input_channel(cancel.clone());
        let sender = sender.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    _ = cancel.cancelled() => break,
                    message = source.recv() => match message {
                        Some(message) => message,
                        None => break,
                    },
                };
                if sender.send(message).await.is_err() {
                    break;
                }
            }
        });
    }
    receiver
}
