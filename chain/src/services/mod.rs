pub mod blocks;
pub mod transactions;

pub use blocks::{BlockProcessingError, BlockProcessingService, CommitOutcome};
pub use transactions::{TransactionProcessingService, fan_in};
