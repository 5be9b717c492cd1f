use redb::TableDefinition;

/// Encoded blocks keyed by the 32 raw bytes of the block hash.
pub const BLOCKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("blocks");
/// Small named values, currently only the chain head.
pub const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Key of the chain head inside [`META`].
pub const CHAIN_HEAD_KEY: &str = "chain_head";
