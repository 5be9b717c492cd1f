//! P2P node service: TCP gossip behind the chain's publisher and consumer
//! traits.

use std::{net::SocketAddr, sync::{Arc, Mutex}};

use async_trait::async_trait;
use chain::{
    Block, Transaction,
    traits::{Consumer, NetworkError, Publisher},
};
use slog::Logger;
use tokio::{
    net::TcpListener,
    sync::{Mutex as AsyncMutex, mpsc},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::P2PConfig,
    error::P2PError,
    message::{GossipMessage, encode_message},
    network::{Shared, accept_loop, dial_loop},
    peer::PeerTable,
};

/// Gossip over TCP with configured peers.
///
/// Publishing queues the frame on every live connection and loops the
/// message back to this node's own consumer. Received messages are not
/// relayed further.
pub struct NetworkService {
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    transactions: AsyncMutex<mpsc::Receiver<Transaction>>,
    blocks: AsyncMutex<mpsc::Receiver<Block>>,
}

impl NetworkService {
    /// Binds the listener, then spawns the accept loop and one dialer per
    /// configured peer. All tasks stop when `cancel` fires.
    pub async fn start(
        config: P2PConfig,
        cancel: CancellationToken,
        logger: Logger,
    ) -> Result<Arc<Self>, P2PError> {
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| P2PError::Bind {
                addr: config.listen_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (tx_sender, tx_receiver) = mpsc::channel(config.channel_capacity);
        let (block_sender, block_receiver) = mpsc::channel(config.channel_capacity);

        let peers = config.peers.clone();
        let shared = Arc::new(Shared {
            peers: Mutex::new(PeerTable::new()),
            transactions: tx_sender,
            blocks: block_sender,
            config,
            logger,
        });

        tokio::spawn(accept_loop(listener, Arc::clone(&shared), cancel.clone()));
        for peer in peers {
            tokio::spawn(dial_loop(peer, Arc::clone(&shared), cancel.clone()));
        }

        slog::info!(shared.logger, "P2P network started"; "listen_addr" => %local_addr);

        Ok(Arc::new(Self {
            shared,
            local_addr,
            transactions: AsyncMutex::new(tx_receiver),
            blocks: AsyncMutex::new(block_receiver),
        }))
    }

    /// Address the listener actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_count(&self) -> usize {
        self.shared.peers().len()
    }

    async fn broadcast(&self, message: GossipMessage) -> Result<(), NetworkError> {
        let frame = encode_message(&message)?;
        let report = self.shared.peers().broadcast(&frame);
        if report.dropped > 0 {
            slog::warn!(
                self.shared.logger,
                "Gossip frame dropped for slow peers";
                "topic" => message.topic().as_str(),
                "dropped" => report.dropped,
            );
        }
        slog::trace!(
            self.shared.logger,
            "Gossip frame published";
            "topic" => message.topic().as_str(),
            "peers" => report.delivered,
        );
        self.shared.deliver(message).await;
        Ok(())
    }
}

#[async_trait]
impl Publisher for NetworkService {
    async fn publish_block(&self, block: &Block) -> Result<(), NetworkError> {
        self.broadcast(GossipMessage::Blocks(block.clone())).await
    }

    async fn publish_transaction(&self, tx: &Transaction) -> Result<(), NetworkError> {
        self.broadcast(GossipMessage::Transactions(tx.clone())).await
    }
}

#[async_trait]
impl Consumer for NetworkService {
    async fn consume_transaction(&self) -> Result<Transaction, NetworkError> {
        self.transactions
            .lock()
            .await
            .recv()
            .await
            .ok_or(NetworkError::Closed)
    }

    async fn consume_block(&self) -> Result<Block, NetworkError> {
        self.blocks.lock().await.recv().await.ok_or(NetworkError::Closed)
    }
}
