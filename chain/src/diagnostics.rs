use crate::{
    genesis::GENESIS_HASH,
    storage::{Database, StorageError},
};

/// Printed when no head has been stored yet.
pub const NO_HEAD_MESSAGE: &str = "[No head]";

/// Renders the stored chain as `head -> ... -> genesis`.
///
/// Walks parent links from the persisted head until the genesis hash. A
/// broken link surfaces as [`StorageError::BlockNotFound`].
pub fn print_block_hashes(db: &dyn Database) -> Result<String, StorageError> {
    let Some(mut hash) = db.try_get_head()? else {
        return Ok(NO_HEAD_MESSAGE.to_string());
    };

    let mut hashes = Vec::new();
    loop {
        hashes.push(hash.to_hex());
        if hash == GENESIS_HASH {
            break;
        }
        hash = db.get_block_by_hash(&hash)?.parent_hash();
    }
    Ok(hashes.join(" -> "))
}
