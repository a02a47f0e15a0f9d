//! Deterministic ECDSA over secp256k1, grounded on
//! `ethers-core/src/types/crypto/keys.rs`'s `sign_with_eip155`/`to_eip155_v`.
//! RFC 6979 nonce generation and low-`s` normalization are handled inside
//! `k256`; this module only shapes the result into this crate's
//! [`Signature`](ethers_lite_core::types::Signature) and EIP-155 `v`.

use ethers_lite_core::types::{Address, Hash, Signature};
use k256::ecdsa::SigningKey;

/// Signs `digest` with `scalar`, encoding `v` per legacy (`chain_id = None`)
/// or EIP-155 (`chain_id = Some(_)`) rules.
pub fn sign_prehash(scalar: &SigningKey, digest: &Hash, chain_id: Option<u64>) -> Signature {
    let (signature, recovery_id) = scalar
        .sign_prehash_recoverable(digest.as_bytes())
        .expect("32-byte prehash is always a valid ECDSA input");

    let bytes = signature.to_bytes();
    let mut r_bytes = [0u8; 32];
    let mut s_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&bytes[..32]);
    s_bytes.copy_from_slice(&bytes[32..]);

    let v = to_eip155_v(recovery_id.to_byte(), chain_id);
    Signature { r: r_bytes, s: s_bytes, v }
}

/// Applies EIP-155 `v` encoding: `35 + 2*chainId + recId` when a chain id is
/// given, else the legacy `27 + recId`.
fn to_eip155_v(recovery_id: u8, chain_id: Option<u64>) -> u64 {
    let standard_v = recovery_id as u64;
    match chain_id {
        Some(chain_id) => standard_v + 35 + chain_id * 2,
        None => standard_v + 27,
    }
}

/// Derives the Ethereum address for a signing key's public point, grounded on
/// `ethers-core/src/utils/mod.rs::secret_key_to_address`.
pub fn address_from_signing_key(scalar: &SigningKey) -> Address {
    ethers_lite_core::types::signature::address_from_verifying_key(scalar.verifying_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_lite_core::crypto::hash::keccak256;

    #[test]
    fn recover_round_trips_through_sign() {
        let scalar = SigningKey::from_bytes(&[7u8; 32].into()).unwrap();
        let digest = Hash::from_bytes(keccak256(b"round trip"));
        let signature = sign_prehash(&scalar, &digest, None);
        assert!(signature.is_canonical());
        let recovered = signature.recover(digest, None).unwrap();
        assert_eq!(recovered, address_from_signing_key(&scalar));
    }

    #[test]
    fn eip155_v_is_chain_bound() {
        let scalar = SigningKey::from_bytes(&[9u8; 32].into()).unwrap();
        let digest = Hash::from_bytes(keccak256(b"chain bound"));
        let mainnet = sign_prehash(&scalar, &digest, Some(1));
        let other = sign_prehash(&scalar, &digest, Some(2));
        assert_ne!(mainnet.v, other.v);
    }
}
