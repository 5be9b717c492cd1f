use libsecp256k1::PublicKey;

use crate::state::hash::keccak256;

/// Number of trailing digest bytes that form an address.
pub const ADDRESS_LENGTH: usize = 20;

/// Derives the textual account address of a secp256k1 public key.
///
/// The address is `0x` followed by the lowercase hex of the last 20 bytes of
/// keccak256 over the 64-byte uncompressed key (without the `0x04` tag).
pub fn address_from_public_key(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize();
    let digest = keccak256(&uncompressed[1..]);
    format!("0x{}", hex::encode(&digest.as_bytes()[32 - ADDRESS_LENGTH..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsecp256k1::SecretKey;

    #[test]
    fn known_key_address() {
        let secret = hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap();
        let secret = SecretKey::parse_slice(&secret).unwrap();
        let public = PublicKey::from_secret_key(&secret);
        assert_eq!(
            address_from_public_key(&public),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }
}
