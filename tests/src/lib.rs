//! Multi-node scenarios.
//!
//! - `cluster`: several full nodes sharing an in-process [`p2p::LocalBus`]
//! - `gossip`: full nodes connected through the TCP transport

pub mod helpers;

mod cluster;
mod gossip;
