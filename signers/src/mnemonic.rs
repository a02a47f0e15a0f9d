//! BIP-39 mnemonic phrases and BIP-32 hierarchical-deterministic derivation.
//!
//! Wraps `coins-bip39`/`coins-bip32` the same way
//! `ethers-signers/src/wallet/mnemonic.rs`'s `MnemonicBuilder` does, but returns
//! a raw 32-byte scalar in a [`SecureBytes`] rather than a `k256::SigningKey`
//! directly, since [`crate::account::Account`] never lets an unwrapped scalar
//! touch unsecured storage.

use crate::error::{Result, SignerError};
use coins_bip32::path::DerivationPath;
use coins_bip39::{English, Mnemonic};
use ethers_lite_core::crypto::SecureBytes;
use rand::rngs::OsRng;
use std::str::FromStr;

/// The account derivation path fixed by spec §4.6: `m/44'/60'/0'/0/0`.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Entropy sizes the BIP-39 wordlist supports, and the word count each yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordCount {
    Twelve,
    Fifteen,
    Eighteen,
    TwentyOne,
    TwentyFour,
}

impl WordCount {
    fn count(self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::Fifteen => 15,
            WordCount::Eighteen => 18,
            WordCount::TwentyOne => 21,
            WordCount::TwentyFour => 24,
        }
    }

    /// Entropy size in bits backing this word count (`32 * words / 3`).
    pub fn entropy_bits(self) -> usize {
        self.count() * 32 / 3
    }
}

/// A freshly generated phrase, paired with its raw entropy for callers that
/// want to display or re-derive from the entropy directly.
pub struct GeneratedMnemonic {
    pub phrase: String,
    pub entropy: SecureBytes,
}

/// Generates a random mnemonic phrase at the given word count.
pub fn generate(word_count: WordCount) -> Result<GeneratedMnemonic> {
    let mnemonic = Mnemonic::<English>::new_with_count(&mut OsRng, word_count.count())
        .map_err(|e| SignerError::BadMnemonic(e.to_string()))?;
    let entropy = SecureBytes::new(mnemonic.to_entropy());
    Ok(GeneratedMnemonic { phrase: mnemonic.to_phrase(), entropy })
}

/// Validates a phrase against the BIP-39 wordlist and checksum without
/// deriving any key material.
pub fn validate(phrase: &str) -> Result<()> {
    Mnemonic::<English>::new_from_phrase(phrase)
        .map_err(|e| SignerError::BadMnemonic(e.to_string()))?;
    Ok(())
}

/// Derives the 32-byte private scalar at `path` from `phrase`/`passphrase`,
/// via PBKDF2-HMAC-SHA512 seed derivation (inside `coins-bip39`) followed by
/// BIP-32 child-key derivation (inside `coins-bip32`).
pub fn derive_key(phrase: &str, passphrase: Option<&str>, path: &str) -> Result<SecureBytes> {
    let mnemonic = Mnemonic::<English>::new_from_phrase(phrase)
        .map_err(|e| SignerError::BadMnemonic(e.to_string()))?;
    let derivation_path =
        DerivationPath::from_str(path).map_err(|e| SignerError::Bip32(e.to_string()))?;
    let derived = mnemonic
        .derive_key(&derivation_path, passphrase)
        .map_err(|e| SignerError::Bip32(e.to_string()))?;
    let signing_key: &coins_bip32::prelude::SigningKey = derived.as_ref();
    Ok(SecureBytes::new(signing_key.to_bytes().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_test_vector_derives_expected_address() {
        let key = derive_key(
            "test test test test test test test test test test test junk",
            None,
            DEFAULT_DERIVATION_PATH,
        )
        .unwrap();
        let account = crate::account::Account::from_private_key_bytes(key.as_slice()).unwrap();
        assert_eq!(
            account.address().checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cfFFb92266"
        );
    }

    #[test]
    fn invalid_phrase_is_rejected() {
        assert!(validate("not a real bip39 phrase at all").is_err());
    }

    #[test]
    fn generated_phrase_round_trips_through_entropy() {
        let generated = generate(WordCount::Twelve).unwrap();
        assert_eq!(generated.entropy.len() * 8, WordCount::Twelve.entropy_bits());
        validate(&generated.phrase).unwrap();
    }
}
