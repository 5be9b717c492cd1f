//! Signing identity of a node.

use std::path::Path;

use libsecp256k1::{PublicKey, SecretKey};
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use crate::{
    crypto::signature::sign_recoverable,
    state::{address::address_from_public_key, hash::keccak256, transaction::Transaction},
};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid secret key: {0:?}")]
    InvalidKey(libsecp256k1::Error),

    #[error("invalid key encoding: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("key file I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// [`Wallet`] holds a secp256k1 secret key and turns plaintext messages into
/// signed [`Transaction`]s.
pub struct Wallet {
    secret_key: SecretKey,
    address: String,
}

impl Wallet {
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&secret_key);
        Self {
            address: address_from_public_key(&public_key),
            secret_key,
        }
    }

    /// Generate a new random wallet.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // zero and values above the curve order are rejected, retry
            if let Ok(secret_key) = SecretKey::parse(&bytes) {
                return Self::new(secret_key);
            }
        }
    }

    /// Parses a hex-encoded 32-byte secret, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let s = s.trim();
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        let secret_key = SecretKey::parse_slice(&bytes).map_err(WalletError::InvalidKey)?;
        Ok(Self::new(secret_key))
    }

    /// Load a wallet from a key file holding the hex-encoded secret.
    pub fn load_from_file(path: &Path) -> Result<Self, WalletError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_hex(&contents)
    }

    /// Save the secret to a file (hex-encoded).
    ///
    /// # Security
    /// The file will contain the private key material. Ensure proper file permissions.
    pub fn save_to_file(&self, path: &Path) -> Result<(), WalletError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{}\n", self.secret_hex()))?;
        Ok(())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.serialize())
    }

    /// Signs `message`, producing a transaction whose signature commits to
    /// `keccak256(message)`.
    pub fn sign(&self, message: &str) -> Transaction {
        let digest = keccak256(message.as_bytes());
        let signature = sign_recoverable(&digest, &self.secret_key);
        Transaction::new(self.address.clone(), message.to_string(), signature.to_vec())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn sign_hello_world_with_known_key() {
        let wallet = Wallet::from_hex(TEST_KEY).unwrap();
        let tx = wallet.sign("hello world");

        assert_eq!(tx.from, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(tx.data, "hello world");
        assert_eq!(tx.signature.len(), 65);
        assert_eq!(tx.verify(), Ok(()));
    }

    #[test]
    fn signing_is_deterministic() {
        let wallet = Wallet::from_hex(TEST_KEY).unwrap();
        assert_eq!(wallet.sign("abc"), wallet.sign("abc"));
    }

    #[test]
    fn key_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join(".pk");

        let wallet = Wallet::generate(&mut OsRng);
        wallet.save_to_file(&path).unwrap();

        let loaded = Wallet::load_from_file(&path).unwrap();
        assert_eq!(loaded.address(), wallet.address());
        assert_eq!(loaded.secret_hex(), wallet.secret_hex());
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(matches!(Wallet::from_hex("zz"), Err(WalletError::Hex(_))));
        assert!(matches!(
            Wallet::from_hex(&"00".repeat(32)),
            Err(WalletError::InvalidKey(_))
        ));
        assert!(matches!(
            Wallet::from_hex("abcd"),
            Err(WalletError::InvalidKey(_))
        ));
        assert!(matches!(
            Wallet::load_from_file(Path::new("/nonexistent/.pk")),
            Err(WalletError::Io(_))
        ));
    }
}
