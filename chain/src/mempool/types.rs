//! Mempool value types shared with callers.

use std::sync::Arc;

use crate::state::{hash::Hash, transaction::{Transaction, TransactionError}};

/// What happened to a submitted transaction.
///
/// Callers on the network path ignore it; it exists for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Valid and new, now pending
    Added(Hash),
    /// Valid but already pending, nothing changed
    Duplicate(Hash),
    /// Failed verification and was discarded
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, SubmitOutcome::Added(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Invalid(TransactionError),
    /// The transaction could not be serialized for hashing
    Unhashable(String),
}

/// A transaction that has passed verification, with its arrival number.
#[derive(Debug, Clone)]
pub struct PooledTransaction {
    pub tx: Arc<Transaction>,
    pub hash: Hash,
    /// Monotonic arrival number, defines `list()` order
    pub seq: u64,
}

/// Statistics about the transaction pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Current number of transactions in the pool
    pub current_size: usize,
    /// Total transactions ever added
    pub total_added: u64,
    /// Valid resubmissions of an already pending transaction
    pub total_duplicates: u64,
    /// Submissions discarded by verification
    pub total_rejected: u64,
    /// Transactions removed by pruning
    pub total_pruned: u64,
}
