//! Sources of locally authored messages.
//!
//! Each adapter implements [`chain::traits::TransactionsInput`]; the
//! transaction service signs whatever they yield.

pub mod http;
pub mod stdin;

pub use http::HttpInput;
pub use stdin::{StdinInput, normalize_line};
