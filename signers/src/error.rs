use thiserror::Error;

/// Error taxonomy for mnemonic/HD derivation, keystore handling, and ECDSA
/// signing, grounded on `ethers-signers/src/wallet/private_key.rs`'s
/// `WalletError` (one variant per failing subsystem, `#[error(transparent)]`
/// where a lower crate already has a descriptive error).
#[derive(Error, Debug)]
pub enum SignerError {
    /// A mnemonic phrase contained an unknown word or failed its BIP-39 checksum.
    #[error("bad mnemonic: {0}")]
    BadMnemonic(String),

    /// A BIP-32 derivation path or child-key derivation failed.
    #[error("hd derivation failed: {0}")]
    Bip32(String),

    /// `r == 0`, `s == 0`, or a signature otherwise failed to reach canonical form.
    #[error("bad signature")]
    BadSignature,

    /// Keystore `version` field was not `3`.
    #[error("unsupported keystore version")]
    UnsupportedVersion,

    /// Keystore `crypto.kdf` was neither `scrypt` nor `pbkdf2`.
    #[error("unsupported kdf")]
    UnsupportedKDF,

    /// Keystore `crypto.cipher` was not `aes-128-ctr`.
    #[error("unsupported cipher")]
    UnsupportedCipher,

    /// A keystore parameter (salt length, dklen, iv length, ...) was malformed.
    #[error("invalid keystore parameter: {0}")]
    InvalidParameter(String),

    /// MAC mismatch on decrypt: the supplied password is wrong.
    #[error("wrong password")]
    WrongPassword,

    /// A cancellable operation observed its cancellation flag.
    #[error("cancelled")]
    Cancelled,

    /// JSON (de)serialization of the keystore document failed.
    #[error("malformed keystore json: {0}")]
    Json(#[from] serde_json::Error),

    /// A hex field in the keystore document did not decode.
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    /// A mnemonic phrase derives a different address than the account it was
    /// presented to recover, per `Account.h`'s `kAccountErrorMnemonicMismatch`.
    #[error("mnemonic does not match this account")]
    MnemonicMismatch,

    /// A primitive type from the serialization core rejected its input.
    #[error(transparent)]
    Core(ethers_lite_core::Error),
}

/// `core::Error::BadSignature` maps onto this crate's own `BadSignature`
/// variant rather than riding along inside the catch-all `Core(_)` wrapper,
/// so callers can match on it directly.
impl From<ethers_lite_core::Error> for SignerError {
    fn from(error: ethers_lite_core::Error) -> Self {
        match error {
            ethers_lite_core::Error::BadSignature => SignerError::BadSignature,
            other => SignerError::Core(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignerError>;
