use libsecp256k1::{Message, PublicKey, RecoveryId, SecretKey, Signature};

use crate::state::{hash::Hash, transaction::TransactionError};

/// Length of a recoverable signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Signs `digest` and returns the 65-byte recoverable encoding.
///
/// The produced `s` is always in the lower half of the curve order and `v`
/// is the raw recovery id (0 or 1).
pub fn sign_recoverable(digest: &Hash, secret_key: &SecretKey) -> [u8; SIGNATURE_LENGTH] {
    let message = Message::parse(digest.as_bytes());
    let (signature, recovery_id) = libsecp256k1::sign(&message, secret_key);

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&signature.serialize());
    out[64] = recovery_id.serialize();
    out
}

/// Recovers the signer of `digest` and checks that the `(r, s)` part of the
/// signature verifies against it.
///
/// Malleable signatures (high `s`) are refused.
pub fn verify_recoverable(digest: &Hash, signature: &[u8]) -> Result<PublicKey, TransactionError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(TransactionError::SignatureLength(signature.len()));
    }

    let message = Message::parse(digest.as_bytes());
    let parsed = Signature::parse_standard_slice(&signature[..64])
        .map_err(TransactionError::MalformedSignature)?;
    let recovery_id =
        RecoveryId::parse(signature[64]).map_err(TransactionError::MalformedSignature)?;

    let public_key =
        libsecp256k1::recover(&message, &parsed, &recovery_id).map_err(TransactionError::Recovery)?;

    if parsed.s.is_high() || !libsecp256k1::verify(&message, &parsed, &public_key) {
        return Err(TransactionError::InvalidSignature);
    }
    Ok(public_key)
}
