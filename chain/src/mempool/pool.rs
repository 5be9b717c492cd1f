//! Transaction Pool - Hash-Indexed FIFO Store
//!
//! ## Features
//!
//! - **O(1) lookup**: By transaction hash via `HashMap`
//! - **Arrival ordering**: `BTreeMap` keyed by a monotonic sequence number, so
//!   snapshots come out oldest first
//! - **Cheap snapshots**: Uses `Arc<Transaction>` for O(1) cloning
//!
//! There is no capacity limit and nothing expires: a transaction only leaves
//! the pool when it is pruned after inclusion in a block.
//!
//! ## Thread Safety
//!
//! `TransactionPool` is **not** thread-safe. The [`Mempool`](super::Mempool)
//! service owns it behind a single mutex.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use super::types::{PoolStats, PooledTransaction};
use crate::state::{hash::Hash, transaction::Transaction};

#[derive(Default)]
pub struct TransactionPool {
    /// All transactions indexed by hash
    by_hash: HashMap<Hash, PooledTransaction>,
    /// Arrival order, sequence number to hash
    by_arrival: BTreeMap<u64, Hash>,
    next_seq: u64,
    stats: PoolStats,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Adds an already verified transaction under `hash`.
    ///
    /// Returns `false` (and changes nothing) if the hash is already pending.
    pub fn try_add(&mut self, hash: Hash, tx: Arc<Transaction>) -> bool {
        if self.by_hash.contains_key(&hash) {
            self.stats.total_duplicates += 1;
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.by_arrival.insert(seq, hash);
        self.by_hash.insert(
            hash,
            PooledTransaction { tx, hash, seq },
        );
        self.stats.total_added += 1;
        true
    }

    /// Removes a transaction by its hash.
    ///
    /// Returns the removed entry, if it existed.
    pub fn remove(&mut self, hash: &Hash) -> Option<PooledTransaction> {
        let pooled = self.by_hash.remove(hash)?;
        self.by_arrival.remove(&pooled.seq);
        self.stats.total_pruned += 1;
        Some(pooled)
    }

    /// Iterates pending transactions oldest first.
    pub fn iter_by_arrival(&self) -> impl Iterator<Item = &PooledTransaction> + '_ {
        self.by_arrival
            .values()
            .filter_map(|hash| self.by_hash.get(hash))
    }

    /// Snapshot of all pending transactions, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<Transaction>> {
        self.iter_by_arrival().map(|p| Arc::clone(&p.tx)).collect()
    }

    pub fn record_rejected(&mut self) {
        self.stats.total_rejected += 1;
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            current_size: self.by_hash.len(),
            ..self.stats
        }
    }
}
