//! Wire envelope shared by every transport.
//!
//! One frame is one JSON object, `{"topic": ..., "payload": ...}`, where the
//! payload is the canonical JSON of a transaction or a block.

use chain::{Block, Transaction};
use serde::{Deserialize, Serialize};

/// Gossip topics. A block never travels on the transaction topic and vice
/// versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Transactions,
    Blocks,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Transactions => "transactions",
            Topic::Blocks => "blocks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "lowercase")]
pub enum GossipMessage {
    Transactions(Transaction),
    Blocks(Block),
}

impl GossipMessage {
    pub fn topic(&self) -> Topic {
        match self {
            GossipMessage::Transactions(_) => Topic::Transactions,
            GossipMessage::Blocks(_) => Topic::Blocks,
        }
    }
}

pub fn encode_message(message: &GossipMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

pub fn decode_message(frame: &str) -> Result<GossipMessage, serde_json::Error> {
    serde_json::from_str(frame)
}
