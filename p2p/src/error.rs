use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum P2PError {
    #[error("failed to bind gossip listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame: {0}")]
    Frame(#[from] tokio_util::codec::LinesCodecError),

    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}
