use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Default cap on a single encoded gossip frame.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// [`P2PConfig`] sets the transport parameters of a node.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct P2PConfig {
    /// Address the gossip listener binds to
    pub listen_addr: SocketAddr,
    /// Peers dialed at startup, redialed when the connection drops
    pub peers: Vec<SocketAddr>,
    /// Maximum length of one frame in bytes; longer frames drop the connection
    pub max_message_size: usize,
    /// Capacity of inbound topic queues and per-peer outbound queues
    pub channel_capacity: usize,
    /// Delay between dial attempts, in milliseconds
    pub dial_retry_ms: u64,
}

impl Default for P2PConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            peers: Vec::new(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            channel_capacity: 1024,
            dial_retry_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: P2PConfig = Figment::from(Serialized::defaults(P2PConfig::default()))
            .merge(Toml::string(
                r#"
                listen_addr = "127.0.0.1:4000"
                peers = ["127.0.0.1:4001", "127.0.0.1:4002"]
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(
            config.listen_addr,
            "127.0.0.1:4000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.peers.len(), 2);
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }
}
