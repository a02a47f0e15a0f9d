//! Ambient utilities: the personal-sign message digest, ether unit
//! formatting/parsing, and the `ethereum:` payment URI.

pub mod units;

use crate::{crypto::hash::keccak256, types::hash::Hash};

const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// `Keccak256("\x19Ethereum Signed Message:\n" || len10(m) || m)`, grounded on
/// `ethers-core/src/utils/hash.rs::hash_message`.
pub fn hash_message(message: impl AsRef<[u8]>) -> Hash {
    let message = message.as_ref();
    let mut prefixed = format!("{PERSONAL_SIGN_PREFIX}{}", message.len()).into_bytes();
    prefixed.extend_from_slice(message);
    Hash::from_bytes(keccak256(&prefixed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_message_matches_known_vector() {
        let hash = hash_message("Hello World");
        assert_eq!(
            hash.to_hex_string(),
            "0xa1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2"
        );
    }
}
