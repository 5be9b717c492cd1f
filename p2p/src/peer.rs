//! Connected peer bookkeeping.

use std::{collections::HashMap, net::SocketAddr};

use tokio::sync::mpsc;

/// Local handle of one live connection.
pub type PeerId = u64;

struct PeerEntry {
    addr: SocketAddr,
    /// Whether we dialed the peer (as opposed to accepting it)
    outbound: bool,
    /// Frames queued for the connection's writer task
    sender: mpsc::Sender<String>,
}

/// Registry of live connections and their outbound queues.
///
/// Not thread-safe on its own; the network service keeps it behind a mutex
/// and never holds that mutex across an `.await`.
#[derive(Default)]
pub struct PeerTable {
    next_id: PeerId,
    peers: HashMap<PeerId, PeerEntry>,
}

/// Result of fanning one frame out to every peer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Peers whose queue was full or already closed
    pub dropped: usize,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        addr: SocketAddr,
        outbound: bool,
        sender: mpsc::Sender<String>,
    ) -> PeerId {
        let id = self.next_id;
        self.next_id += 1;
        self.peers.insert(
            id,
            PeerEntry {
                addr,
                outbound,
                sender,
            },
        );
        id
    }

    pub fn remove(&mut self, id: PeerId) -> Option<SocketAddr> {
        self.peers.remove(&id).map(|entry| entry.addr)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn outbound_count(&self) -> usize {
        self.peers.values().filter(|entry| entry.outbound).count()
    }

    /// Queues `frame` on every connection without waiting.
    pub fn broadcast(&self, frame: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for entry in self.peers.values() {
            match entry.sender.try_send(frame.to_string()) {
                Ok(()) => report.delivered += 1,
                Err(_) => report.dropped += 1,
            }
        }
        report
    }
}
