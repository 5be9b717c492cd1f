//! Process wiring for a minchain node: configuration, logging, local input
//! adapters and the [`node::run`] entry point used by the `minchain` binary.

pub mod config;
pub mod input;
pub mod logging;
pub mod node;

pub use config::NodeConfig;
