//! A private scalar held in secure memory, plus its derived address and
//! optional retained mnemonic — grounded on `ethers-signers/src/wallet/mod.rs`'s
//! `Wallet<SigningKey>`, restructured around [`SecureBytes`] since the spec
//! requires the scalar to live only in zero-on-release storage (§3 "Account").

use crate::{
    ecdsa,
    error::{Result, SignerError},
    keystore::{self, Cancellable, KdfParams, Keystore},
    mnemonic,
};
use ethers_lite_core::{
    crypto::SecureBytes,
    types::{Address, Hash, Signature, Transaction},
    utils::hash_message,
};
use k256::ecdsa::SigningKey;
use rand::{rngs::OsRng, RngCore};

/// A private scalar plus its derived address. The scalar lives only inside
/// [`SecureBytes`]; signing reconstructs an ephemeral `SigningKey` on the
/// stack for the duration of the call and never stores it.
pub struct Account {
    scalar: SecureBytes,
    address: Address,
    mnemonic: Option<String>,
}

impl Account {
    /// Generates a new random account.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self::from_private_key_bytes(&bytes)
    }

    /// Constructs an account directly from a 32-byte private scalar.
    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| SignerError::InvalidParameter("private key".into()))?;
        let address = ecdsa::address_from_signing_key(&signing_key);
        Ok(Self { scalar: SecureBytes::new(bytes.to_vec()), address, mnemonic: None })
    }

    /// Derives an account from a BIP-39 phrase at the given derivation path
    /// (`mnemonic::DEFAULT_DERIVATION_PATH` for the canonical `m/44'/60'/0'/0/0`).
    pub fn from_mnemonic(phrase: &str, passphrase: Option<&str>, path: &str) -> Result<Self> {
        let scalar = mnemonic::derive_key(phrase, passphrase, path)?;
        let mut account = Self::from_private_key_bytes(scalar.as_slice())?;
        account.mnemonic = Some(phrase.to_string());
        Ok(account)
    }

    /// Verifies that `phrase` (at `passphrase`/`path`) derives this account's
    /// address, as when recovering an account and confirming a user-supplied
    /// mnemonic actually matches the key material already on file. Returns
    /// [`SignerError::MnemonicMismatch`] rather than silently accepting an
    /// unrelated phrase.
    pub fn verify_mnemonic(&self, phrase: &str, passphrase: Option<&str>, path: &str) -> Result<()> {
        let scalar = mnemonic::derive_key(phrase, passphrase, path)?;
        let address = ecdsa::address_from_signing_key(
            &SigningKey::from_slice(scalar.as_slice())
                .map_err(|_| SignerError::InvalidParameter("derived key".into()))?,
        );
        if address == self.address {
            Ok(())
        } else {
            Err(SignerError::MnemonicMismatch)
        }
    }

    /// Generates a new random mnemonic and the account at its default path.
    pub fn from_new_mnemonic(word_count: mnemonic::WordCount) -> Result<(Self, String)> {
        let generated = mnemonic::generate(word_count)?;
        let account = Self::from_mnemonic(&generated.phrase, None, mnemonic::DEFAULT_DERIVATION_PATH)?;
        Ok((account, generated.phrase))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The retained mnemonic phrase, if this account was constructed via
    /// [`Account::from_mnemonic`]/[`Account::from_new_mnemonic`].
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_deref()
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_slice(self.scalar.as_slice()).expect("scalar was validated at construction")
    }

    /// Signs `message` under the personal-sign prefix (spec §4.10), always as
    /// a legacy (non-EIP-155) signature.
    pub fn sign_message(&self, message: impl AsRef<[u8]>) -> Signature {
        let digest = hash_message(message);
        ecdsa::sign_prehash(&self.signing_key(), &digest, None)
    }

    /// Recovers the signer of `message` against `signature` and compares to
    /// `self.address()`.
    pub fn verify_message(&self, message: impl AsRef<[u8]>, signature: &Signature) -> Result<bool> {
        let digest = hash_message(message);
        let recovered = signature.recover(digest, None)?;
        Ok(recovered == self.address)
    }

    /// Signs `tx`'s EIP-155 digest (or legacy digest if `tx.chain_id == 0`),
    /// returning a copy of `tx` with `signature` populated.
    pub fn sign_transaction(&self, tx: &Transaction) -> Transaction {
        let digest = tx.signing_digest();
        let chain_id = if tx.chain_id == 0 { None } else { Some(tx.chain_id) };
        let signature = ecdsa::sign_prehash(&self.signing_key(), &digest, chain_id);
        let mut signed = tx.clone();
        signed.signature = Some(signature);
        signed
    }

    /// Signs an arbitrary 32-byte digest directly (used by callers that
    /// already hashed their payload, e.g. typed-data signing outside scope).
    pub fn sign_digest(&self, digest: Hash, chain_id: Option<u64>) -> Signature {
        ecdsa::sign_prehash(&self.signing_key(), &digest, chain_id)
    }

    /// Encrypts this account's scalar into a Web3 Secret Storage v3 keystore.
    pub fn encrypt_keystore(&self, password: &[u8], params: KdfParams) -> Result<Keystore> {
        keystore::encrypt(self.scalar.as_slice(), password, params, self.address)
    }

    /// Same as [`Account::encrypt_keystore`] but cancellable: the scrypt/
    /// pbkdf2 KDF runs on a background thread and observes the returned
    /// handle's cancellation flag.
    pub fn encrypt_keystore_cancellable(
        &self,
        password: Vec<u8>,
        params: KdfParams,
    ) -> Cancellable<Keystore> {
        keystore::encrypt_cancellable(self.scalar.as_slice().to_vec(), password, params, self.address)
    }

    /// Decrypts a keystore document into an `Account`.
    pub fn from_keystore(keystore: &Keystore, password: &[u8]) -> Result<Self> {
        let scalar = keystore::decrypt(keystore, password)?;
        Self::from_private_key_bytes(&scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_signature_round_trips() {
        let account = Account::random().unwrap();
        let signature = account.sign_message("Hello World");
        assert!(account.verify_message("Hello World", &signature).unwrap());
    }

    #[test]
    fn personal_sign_known_vector_recovers_same_address() {
        let account = Account::from_private_key_bytes(&[0x42u8; 32]).unwrap();
        let signature = account.sign_message("Hello World");
        let recovered = signature.recover(hash_message("Hello World"), None).unwrap();
        assert_eq!(recovered, account.address());
    }

    #[test]
    fn eip155_transaction_signing_vector_recovers_expected_from() {
        // https://eips.ethereum.org/EIPS/eip-155
        let key = hex::decode("4646464646464646464646464646464646464646464646464646464646464646")
            .unwrap();
        let account = Account::from_private_key_bytes(&key).unwrap();

        let mut tx = Transaction::new(1);
        tx.nonce = 9u64.into();
        tx.gas_price = ethers_lite_core::types::BigInt256::from_u64(20_000_000_000);
        tx.gas_limit = ethers_lite_core::types::BigInt256::from_u64(21_000);
        tx.to_address = Some(Address::parse("0x3535353535353535353535353535353535353535").unwrap());
        tx.value = ethers_lite_core::types::BigInt256::from_u64(1_000_000_000_000_000_000);

        let signed = account.sign_transaction(&tx);
        let from = signed.from_address().unwrap();
        assert_eq!(from, account.address());
        assert_eq!(account.address().checksum(), "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");
    }

    #[test]
    fn keystore_round_trip_recovers_same_account() {
        let account = Account::random().unwrap();
        let params = KdfParams::Scrypt { n: 16, r: 1, p: 1, dklen: 32, salt: vec![5u8; 32] };
        let keystore = account.encrypt_keystore(b"hunter2", params).unwrap();
        let recovered = Account::from_keystore(&keystore, b"hunter2").unwrap();
        assert_eq!(recovered.address(), account.address());
    }

    #[test]
    fn verify_mnemonic_accepts_matching_phrase_and_rejects_others() {
        let phrase = "test test test test test test test test test test test junk";
        let account = Account::from_mnemonic(phrase, None, mnemonic::DEFAULT_DERIVATION_PATH).unwrap();
        assert!(account.verify_mnemonic(phrase, None, mnemonic::DEFAULT_DERIVATION_PATH).is_ok());

        let other = "legal winner thank year wave sausage worth useful legal winner thank yellow";
        assert!(matches!(
            account.verify_mnemonic(other, None, mnemonic::DEFAULT_DERIVATION_PATH),
            Err(SignerError::MnemonicMismatch)
        ));
    }
}
