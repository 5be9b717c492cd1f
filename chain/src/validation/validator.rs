use std::sync::Arc;

use super::error::ValidationError;
use crate::{
    state::block::{Block, combined_hash},
    storage::Database,
};

/// Acceptance rules for inbound blocks.
pub trait Validator: Send + Sync {
    fn validate(&self, block: &Block) -> Result<(), ValidationError>;
}

/// Checks an inbound block against the stored chain.
///
/// Rules, first failure wins:
/// 1. the block is not already stored
/// 2. its parent is stored
/// 3. the header's transaction hash matches the body
/// 4. optionally, every transaction verifies
pub struct BlockValidator {
    db: Arc<dyn Database>,
    verify_transactions: bool,
}

impl BlockValidator {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            verify_transactions: false,
        }
    }

    /// Also re-verify each transaction signature after the hash checks.
    pub fn with_transaction_verification(mut self, enabled: bool) -> Self {
        self.verify_transactions = enabled;
        self
    }
}

impl Validator for BlockValidator {
    fn validate(&self, block: &Block) -> Result<(), ValidationError> {
        let hash = block.hash()?;
        if self.db.contains_block(&hash)? {
            return Err(ValidationError::KnownBlock(hash));
        }

        let parent = block.parent_hash();
        if !self.db.contains_block(&parent)? {
            return Err(ValidationError::UnknownParent(parent));
        }

        let actual = combined_hash(&block.transactions)?;
        if actual != block.header.transaction_hash {
            return Err(ValidationError::IncorrectTransactionHash {
                expected: block.header.transaction_hash,
                actual,
            });
        }

        if self.verify_transactions {
            for tx in &block.transactions {
                if let Err(source) = tx.verify() {
                    return Err(ValidationError::InvalidTransaction {
                        hash: tx.hash()?,
                        source,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::wallet::Wallet,
        genesis::{GENESIS_HASH, genesis_block},
        state::{hash::keccak256, transaction::Transaction},
        storage::MemoryDatabase,
    };

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn seeded_db() -> Arc<MemoryDatabase> {
        let db = Arc::new(MemoryDatabase::new());
        db.put_block(&genesis_block()).unwrap();
        db
    }

    fn signed(data: &str) -> Transaction {
        Wallet::from_hex(TEST_KEY).unwrap().sign(data)
    }

    #[test]
    fn accepts_child_of_stored_block() {
        let validator = BlockValidator::new(seeded_db());
        let block = Block::new(GENESIS_HASH, 1, vec![signed("a")]).unwrap();
        assert!(validator.validate(&block).is_ok());
    }

    #[test]
    fn known_block_wins_over_everything() {
        let db = seeded_db();
        let validator = BlockValidator::new(db.clone());
        let block = Block::new(GENESIS_HASH, 1, vec![signed("a")]).unwrap();
        db.put_block(&block).unwrap();

        assert!(matches!(
            validator.validate(&block),
            Err(ValidationError::KnownBlock(h)) if h == block.hash().unwrap()
        ));
        // genesis itself is known as well
        assert!(matches!(
            validator.validate(&genesis_block()),
            Err(ValidationError::KnownBlock(_))
        ));
    }

    #[test]
    fn unknown_parent_checked_before_body() {
        let validator = BlockValidator::new(seeded_db());
        let orphan_parent = keccak256(b"nowhere");
        let mut block = Block::new(orphan_parent, 1, vec![signed("a")]).unwrap();
        // a bad body must not mask the missing parent
        block.transactions.push(signed("b"));

        assert!(matches!(
            validator.validate(&block),
            Err(ValidationError::UnknownParent(h)) if h == orphan_parent
        ));
    }

    #[test]
    fn tampered_body_rejected() {
        let validator = BlockValidator::new(seeded_db());
        let mut block = Block::new(GENESIS_HASH, 1, vec![signed("a"), signed("b")]).unwrap();
        block.transactions.swap(0, 1);

        assert!(matches!(
            validator.validate(&block),
            Err(ValidationError::IncorrectTransactionHash { .. })
        ));
    }

    #[test]
    fn transaction_verification_is_opt_in() {
        let forged = Transaction::new("0x01".into(), "forged".into(), vec![9u8; 65]);
        let block = Block::new(GENESIS_HASH, 1, vec![forged]).unwrap();

        let lenient = BlockValidator::new(seeded_db());
        assert!(lenient.validate(&block).is_ok());

        let strict = BlockValidator::new(seeded_db()).with_transaction_verification(true);
        assert!(matches!(
            strict.validate(&block),
            Err(ValidationError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn storage_failure_propagates() {
        let db = seeded_db();
        let validator = BlockValidator::new(db.clone());
        db.close().unwrap();

        let err = validator
            .validate(&Block::new(GENESIS_HASH, 1, vec![]).unwrap())
            .unwrap_err();
        assert!(matches!(err, ValidationError::Storage(_)));
        assert!(!err.is_rejection());
    }
}
