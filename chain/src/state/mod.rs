pub mod address;
pub mod block;
pub mod hash;
pub mod transaction;
