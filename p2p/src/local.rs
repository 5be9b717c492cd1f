//! In-process gossip bus.

use async_trait::async_trait;
use chain::{
    Block, Transaction,
    traits::{Consumer, NetworkError, Publisher},
};
use tokio::sync::{Mutex, broadcast};

/// Pub/sub bus connecting any number of in-process endpoints.
///
/// Every endpoint receives every publish made after it was created, its own
/// included, per topic in publish order.
#[derive(Clone)]
pub struct LocalBus {
    transactions: broadcast::Sender<Transaction>,
    blocks: broadcast::Sender<Block>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (transactions, _) = broadcast::channel(capacity);
        let (blocks, _) = broadcast::channel(capacity);
        Self {
            transactions,
            blocks,
        }
    }

    /// A new node attachment to the bus.
    pub fn endpoint(&self) -> LocalEndpoint {
        LocalEndpoint {
            bus: self.clone(),
            transactions: Mutex::new(self.transactions.subscribe()),
            blocks: Mutex::new(self.blocks.subscribe()),
        }
    }
}

pub struct LocalEndpoint {
    bus: LocalBus,
    transactions: Mutex<broadcast::Receiver<Transaction>>,
    blocks: Mutex<broadcast::Receiver<Block>>,
}

/// Receives the next value, skipping over any backlog lost to lagging.
async fn recv_next<T: Clone>(receiver: &Mutex<broadcast::Receiver<T>>) -> Result<T, NetworkError> {
    let mut receiver = receiver.lock().await;
    loop {
        match receiver.recv().await {
            Ok(value) => return Ok(value),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Err(NetworkError::Closed),
        }
    }
}

#[async_trait]
impl Publisher for LocalEndpoint {
    async fn publish_block(&self, block: &Block) -> Result<(), NetworkError> {
        self.bus
            .blocks
            .send(block.clone())
            .map(|_| ())
            .map_err(|_| NetworkError::Publish("no subscribers on blocks topic".into()))
    }

    async fn publish_transaction(&self, tx: &Transaction) -> Result<(), NetworkError> {
        self.bus
            .transactions
            .send(tx.clone())
            .map(|_| ())
            .map_err(|_| NetworkError::Publish("no subscribers on transactions topic".into()))
    }
}

#[async_trait]
impl Consumer for LocalEndpoint {
    async fn consume_transaction(&self) -> Result<Transaction, NetworkError> {
        recv_next(&self.transactions).await
    }

    async fn consume_block(&self) -> Result<Block, NetworkError> {
        recv_next(&self.blocks).await
    }
}
