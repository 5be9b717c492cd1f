//! Mempool - Verified Pending Transactions
//!
//! Transactions arrive from the network (including this node's own publishes,
//! looped back), are verified and stored until a block containing them is
//! produced or committed.
//!
//! ## Data Flow
//!
//! 1. Ingestion: the inbound transaction loop calls [`Mempool::submit`]
//! 2. Validation: payload, signature length and recovered-key verification
//! 3. Storage: hash-keyed, FIFO-ordered [`TransactionPool`]
//! 4. Block building: the producer takes a [`Mempool::list`] snapshot
//! 5. Cleanup: [`Mempool::prune`] after production or commit

mod monitor;
mod pool;
mod service;
mod types;

pub use monitor::run_monitor;
pub use pool::TransactionPool;
pub use service::Mempool;
pub use types::{PoolStats, PooledTransaction, RejectReason, SubmitOutcome};

pub use crate::state::transaction::TransactionError;
