//! Hashing primitives used throughout the key-custody and serialization cores.
//!
//! `keccak256` is grounded directly on `ethers-core/src/utils/hash.rs` (same
//! `tiny-keccak` dependency, same pre-standard Keccak-f\[1600\] padding — *not*
//! NIST SHA-3). The remaining primitives (SHA-256, SHA-1, HMAC-SHA-512) back BIP-32/
//! BIP-39 derivation in the `signers` crate and are exposed here so they are
//! available as first-class, independently testable primitives per the
//! specification's component table.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 as used throughout Ethereum (pre-standardization padding).
pub fn keccak256(bytes: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(bytes.as_ref());
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// A streaming Keccak-256 hasher for large or incrementally-produced inputs.
pub struct Keccak256Hasher(Keccak);

impl Default for Keccak256Hasher {
    fn default() -> Self {
        Self(Keccak::v256())
    }
}

impl Keccak256Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    pub fn finalize(self) -> [u8; 32] {
        let mut output = [0u8; 32];
        self.0.finalize(&mut output);
        output
    }
}

pub fn sha256(bytes: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    hasher.finalize().into()
}

pub fn sha1(bytes: impl AsRef<[u8]>) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(bytes.as_ref());
    hasher.finalize().into()
}

/// HMAC-SHA-512, used by BIP-32 for master-key and child-key derivation.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_matches_known_vector() {
        let digest = keccak256(b"");
        assert_eq!(
            hex::encode(digest),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn streaming_matches_oneshot() {
        let mut h = Keccak256Hasher::new();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finalize(), keccak256(b"hello world"));
    }
}
