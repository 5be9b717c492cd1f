pub mod signature;
pub mod wallet;
