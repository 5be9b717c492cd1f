//! Connection handling for the TCP gossip transport.
//!
//! Each connection is a [`Framed`] stream of newline-delimited JSON
//! envelopes. A writer drains the connection's outbound queue while the
//! reader decodes frames and hands them to the inbound topic queues.
//! Undecodable frames are logged and dropped; a frame over the size limit or
//! any I/O error ends the connection.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chain::{Block, Transaction};
use futures::{SinkExt, StreamExt};
use slog::Logger;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tokio_util::{
    codec::{Framed, LinesCodec},
    sync::CancellationToken,
};

use crate::{
    config::P2PConfig,
    message::{GossipMessage, decode_message},
    peer::PeerTable,
};

/// State shared by the service and every connection task.
pub(crate) struct Shared {
    pub peers: Mutex<PeerTable>,
    pub transactions: mpsc::Sender<Transaction>,
    pub blocks: mpsc::Sender<Block>,
    pub config: P2PConfig,
    pub logger: Logger,
}

impl Shared {
    pub fn peers(&self) -> std::sync::MutexGuard<'_, PeerTable> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands a decoded message to the consumer side of its topic.
    pub async fn deliver(&self, message: GossipMessage) {
        let delivered = match message {
            GossipMessage::Transactions(tx) => self.transactions.send(tx).await.is_ok(),
            GossipMessage::Blocks(block) => self.blocks.send(block).await.is_ok(),
        };
        if !delivered {
            slog::debug!(self.logger, "Inbound queue closed, message dropped");
        }
    }
}

pub(crate) async fn accept_loop(
    listener: TcpListener,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, addr)) => {
                slog::info!(shared.logger, "Peer connected"; "addr" => %addr, "direction" => "inbound");
                tokio::spawn(run_connection(
                    stream,
                    addr,
                    false,
                    Arc::clone(&shared),
                    cancel.clone(),
                ));
            }
            Err(e) => {
                slog::warn!(shared.logger, "Failed to accept connection"; "error" => %e);
            }
        }
    }
    slog::debug!(shared.logger, "Gossip listener stopped");
}

/// Keeps a connection to `addr` open, redialing after every failure or
/// disconnect until cancelled.
pub(crate) async fn dial_loop(addr: SocketAddr, shared: Arc<Shared>, cancel: CancellationToken) {
    let retry = Duration::from_millis(shared.config.dial_retry_ms);
    loop {
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            connected = TcpStream::connect(addr) => connected,
        };
        match connected {
            Ok(stream) => {
                slog::info!(shared.logger, "Peer connected"; "addr" => %addr, "direction" => "outbound");
                run_connection(stream, addr, true, Arc::clone(&shared), cancel.clone()).await;
            }
            Err(e) => {
                slog::debug!(shared.logger, "Dial failed"; "addr" => %addr, "error" => %e);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(retry) => {}
        }
    }
}

pub(crate) async fn run_connection(
    stream: TcpStream,
    addr: SocketAddr,
    outbound: bool,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) {
    let codec = LinesCodec::new_with_max_length(shared.config.max_message_size);
    let (mut sink, mut frames) = Framed::new(stream, codec).split();
    let (queue, mut queued) = mpsc::channel::<String>(shared.config.channel_capacity);
    let id = {
        let mut peers = shared.peers();
        let id = peers.register(addr, outbound, queue);
        slog::debug!(
            shared.logger,
            "Peer registered";
            "addr" => %addr,
            "peers" => peers.len(),
            "outbound" => peers.outbound_count(),
        );
        id
    };

    let writer = async {
        while let Some(frame) = queued.recv().await {
            if let Err(e) = sink.send(frame).await {
                slog::debug!(shared.logger, "Write failed"; "addr" => %addr, "error" => %e);
                break;
            }
        }
    };

    let reader = async {
        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    slog::warn!(shared.logger, "Dropping connection"; "addr" => %addr, "error" => %e);
                    break;
                }
            };
            match decode_message(&frame) {
                Ok(message) => shared.deliver(message).await,
                Err(e) => {
                    slog::warn!(shared.logger, "Dropping undecodable frame"; "addr" => %addr, "error" => %e);
                }
            }
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = writer => {}
        _ = reader => {}
    }

    shared.peers().remove(id);
    slog::info!(shared.logger, "Peer disconnected"; "addr" => %addr);
}
