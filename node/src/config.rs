//! Node configuration.
//!
//! Precedence, lowest to highest: built-in defaults, the TOML file,
//! `MINCHAIN_`-prefixed environment variables (`__` separates sections, e.g.
//! `MINCHAIN_NODE__BLOCK_PRODUCER=true`), then command-line flags.
//!
//! # Example config (TOML)
//! ```toml
//! [node]
//! block_producer = true
//! block_time = 5000
//! key_path = ".pk"
//! stdin = true
//!
//! [storage]
//! backend = "redb"
//! path = "data/chain.redb"
//!
//! [p2p]
//! listen_addr = "0.0.0.0:3000"
//! peers = ["10.0.0.2:3000"]
//!
//! [http]
//! listen_addr = "127.0.0.1:8080"
//!
//! [logging]
//! level = "debug"
//! ```

use std::{net::SocketAddr, path::{Path, PathBuf}};

use anyhow::Result;
use chain::{app::AppConfig, storage::StorageConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use p2p::P2PConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub storage: StorageConfig,
    pub p2p: P2PConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    #[serde(flatten)]
    pub app: AppConfig,
    /// Hex-encoded secp256k1 secret key file
    pub key_path: PathBuf,
    /// Read messages from standard input
    pub stdin: bool,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            key_path: PathBuf::from(".pk"),
            stdin: true,
        }
    }
}

/// HTTP input adapter; disabled when no address is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `critical`, `error`, `warn`, `info`, `debug`, `trace`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Layers defaults, the TOML file at `path` (skipped if absent) and the
    /// environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::figment(path).extract().map_err(anyhow::Error::msg)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(NodeConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MINCHAIN_").split("__"))
    }
}
