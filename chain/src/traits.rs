//! Seams between the lifecycle engine and its collaborators.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::state::{block::Block, transaction::Transaction};

#[derive(Debug, Error)]
pub enum NetworkError {
    /// The transport is gone; consuming loops should stop.
    #[error("network channel closed")]
    Closed,

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Outbound side of the gossip layer.
///
/// Blocks and transactions travel on separate topics.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_block(&self, block: &Block) -> Result<(), NetworkError>;

    async fn publish_transaction(&self, tx: &Transaction) -> Result<(), NetworkError>;
}

/// Inbound side of the gossip layer.
///
/// Both calls wait until a message arrives. Malformed frames are dropped by
/// the transport and never returned here.
#[async_trait]
pub trait Consumer: Send + Sync {
    async fn consume_transaction(&self) -> Result<Transaction, NetworkError>;

    async fn consume_block(&self) -> Result<Block, NetworkError>;
}

/// A source of plaintext messages authored by the local user.
pub trait TransactionsInput: Send {
    /// Starts the source. Messages arrive on the returned channel until the
    /// source is exhausted or `cancel` fires.
    fn input_channel(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<String>;
}
