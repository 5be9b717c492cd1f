//! Mempool Service - Shared, Verifying Front of the Pool
//!
//! Every network path that touches pending transactions goes through
//! [`Mempool`]: the inbound transaction loop submits, the block producer
//! lists and prunes, the block processing service prunes after a commit.
//!
//! ## Locking
//!
//! One mutex guards the [`TransactionPool`]. Signature verification and
//! hashing happen before the lock is taken, so only the map mutation is
//! serialized. The guard is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use slog::Logger;

use super::{
    pool::TransactionPool,
    types::{PoolStats, RejectReason, SubmitOutcome},
};
use crate::state::transaction::Transaction;

pub struct Mempool {
    pool: Mutex<TransactionPool>,
    logger: Logger,
}

impl Mempool {
    pub fn new(logger: Logger) -> Self {
        Self {
            pool: Mutex::new(TransactionPool::new()),
            logger,
        }
    }

    fn pool(&self) -> MutexGuard<'_, TransactionPool> {
        // the pool stays consistent even if a holder panicked mid-call
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Verifies `tx` and, if valid and new, adds it to the pool.
    ///
    /// Invalid transactions are logged and dropped; nothing is propagated.
    pub fn submit(&self, tx: Transaction) -> SubmitOutcome {
        if let Err(e) = tx.verify() {
            self.pool().record_rejected();
            slog::debug!(
                self.logger,
                "Transaction rejected";
                "from" => &tx.from,
                "reason" => %e,
            );
            return SubmitOutcome::Rejected(RejectReason::Invalid(e));
        }

        let hash = match tx.hash() {
            Ok(hash) => hash,
            Err(e) => {
                self.pool().record_rejected();
                slog::warn!(self.logger, "Transaction could not be hashed"; "error" => %e);
                return SubmitOutcome::Rejected(RejectReason::Unhashable(e.to_string()));
            }
        };

        let (added, pool_size) = {
            let mut pool = self.pool();
            let added = pool.try_add(hash, Arc::new(tx));
            (added, pool.len())
        };

        if added {
            slog::debug!(
                self.logger,
                "Transaction added to pool";
                "tx_hash" => hash.short(),
                "pool_size" => pool_size,
            );
            SubmitOutcome::Added(hash)
        } else {
            slog::trace!(self.logger, "Duplicate transaction ignored"; "tx_hash" => hash.short());
            SubmitOutcome::Duplicate(hash)
        }
    }

    /// Snapshot copy of all pending transactions, oldest first.
    pub fn list(&self) -> Vec<Transaction> {
        let snapshot = self.pool().snapshot();
        snapshot.iter().map(|tx| Transaction::clone(tx)).collect()
    }

    /// Removes each of `txs` by recomputed hash, returning how many were
    /// actually pending. Absent entries are no-ops.
    pub fn prune(&self, txs: &[Transaction]) -> usize {
        let hashes: Vec<_> = txs
            .iter()
            .filter_map(|tx| match tx.hash() {
                Ok(hash) => Some(hash),
                Err(e) => {
                    slog::warn!(self.logger, "Skipping unhashable transaction in prune"; "error" => %e);
                    None
                }
            })
            .collect();

        let (removed, pool_size) = {
            let mut pool = self.pool();
            let removed = hashes.iter().filter(|h| pool.remove(h).is_some()).count();
            (removed, pool.len())
        };

        if removed > 0 {
            slog::debug!(
                self.logger,
                "Pruned transactions";
                "removed_count" => removed,
                "pool_size" => pool_size,
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.pool().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool().is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::wallet::Wallet, mempool::TransactionError};
    use slog::{Discard, o};

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn mempool() -> Mempool {
        Mempool::new(Logger::root(Discard, o!()))
    }

    fn wallet() -> Wallet {
        Wallet::from_hex(TEST_KEY).unwrap()
    }

    #[test]
    fn test_valid_transaction_is_pooled() {
        let mempool = mempool();
        let tx = wallet().sign("hello");
        let outcome = mempool.submit(tx.clone());

        assert_eq!(outcome, SubmitOutcome::Added(tx.hash().unwrap()));
        assert_eq!(mempool.list(), vec![tx]);
    }

    #[test]
    fn test_resubmission_is_noop() {
        let mempool = mempool();
        let tx = wallet().sign("hello");
        mempool.submit(tx.clone());
        assert!(matches!(mempool.submit(tx), SubmitOutcome::Duplicate(_)));
        assert_eq!(mempool.len(), 1);
    }

    #[test]
    fn test_invalid_transactions_rejected() {
        let mempool = mempool();

        let mut short_sig = wallet().sign("hello");
        short_sig.signature.truncate(64);
        assert_eq!(
            mempool.submit(short_sig),
            SubmitOutcome::Rejected(RejectReason::Invalid(TransactionError::SignatureLength(64)))
        );

        let blank = wallet().sign("   ");
        assert_eq!(
            mempool.submit(blank),
            SubmitOutcome::Rejected(RejectReason::Invalid(TransactionError::EmptyPayload))
        );

        // recovery ids above 3 do not exist
        let mut forged = wallet().sign("hello");
        forged.signature[64] = 4;
        assert!(matches!(
            mempool.submit(forged),
            SubmitOutcome::Rejected(RejectReason::Invalid(TransactionError::MalformedSignature(_)))
        ));

        assert!(mempool.is_empty());
        assert_eq!(mempool.stats().total_rejected, 3);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mempool = mempool();
        let wallet = wallet();
        let a = wallet.sign("a");
        let b = wallet.sign("b");
        mempool.submit(a.clone());
        mempool.submit(b.clone());

        assert_eq!(mempool.prune(std::slice::from_ref(&a)), 1);
        assert_eq!(mempool.prune(std::slice::from_ref(&a)), 0);
        assert_eq!(mempool.list(), vec![b.clone()]);

        let never_pooled = wallet.sign("c");
        assert_eq!(mempool.prune(&[never_pooled, b]), 1);
        assert!(mempool.is_empty());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mempool = mempool();
        mempool.submit(wallet().sign("a"));
        let snapshot = mempool.list();
        mempool.submit(wallet().sign("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(mempool.len(), 2);
    }

    #[test]
    fn test_concurrent_submissions() {
        let mempool = Arc::new(mempool());
        let wallet = Arc::new(wallet());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let mempool = Arc::clone(&mempool);
                let wallet = Arc::clone(&wallet);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        // every thread also submits the shared message
                        mempool.submit(wallet.sign("shared"));
                        mempool.submit(wallet.sign(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(mempool.len(), 101);
        let stats = mempool.stats();
        assert_eq!(stats.total_added, 101);
        assert_eq!(stats.total_duplicates, 99);
    }
}
