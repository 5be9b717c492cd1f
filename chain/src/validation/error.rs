use thiserror::Error;

use crate::{
    state::{hash::Hash, transaction::TransactionError},
    storage::StorageError,
};

/// Why an inbound block was refused.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("block {0} is already known")]
    KnownBlock(Hash),

    #[error("parent block {0} is unknown")]
    UnknownParent(Hash),

    #[error("transaction hash mismatch: header has {expected}, body hashes to {actual}")]
    IncorrectTransactionHash { expected: Hash, actual: Hash },

    #[error("transaction {hash} is invalid: {source}")]
    InvalidTransaction {
        hash: Hash,
        #[source]
        source: TransactionError,
    },

    #[error("block encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ValidationError {
    /// Rejections caused by the block itself, as opposed to local failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ValidationError::Storage(_))
    }
}
