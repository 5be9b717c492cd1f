pub mod app;
pub mod chainhead;
pub mod crypto;
pub mod diagnostics;
pub mod genesis;
pub mod mempool;
pub mod producer;
pub mod services;
pub mod state;
pub mod storage;
pub mod traits;
pub mod validation;


pub use state::{block::Block, hash::Hash, transaction::Transaction};
