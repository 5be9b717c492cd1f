//! Gossip transports implementing the chain's `Publisher` and `Consumer`.
//!
//! - [`LocalBus`]: in-process pub/sub for tests and single-process clusters
//! - [`NetworkService`]: newline-delimited JSON gossip over TCP

pub mod config;
pub mod error;
pub mod local;
pub mod message;
pub mod network;
pub mod peer;
pub mod service;

pub use config::P2PConfig;
pub use error::P2PError;
pub use local::{LocalBus, LocalEndpoint};
pub use message::{GossipMessage, Topic};
pub use service::NetworkService;
