use thiserror::Error;

/// Error taxonomy shared by the primitive types and serialization layer.
///
/// Provider-facing errors live in `ethers-lite-providers::ProviderError`; keystore
/// and mnemonic errors live in `ethers-lite-signers::SignerError`. This enum covers
/// the primitives that are common to both: big integers, addresses, hashing-derived
/// encodings and RLP.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A decimal/hex/base-36 string did not parse, or overflowed 256 bits.
    #[error("invalid format")]
    InvalidFormat,

    /// A mixed-case address failed EIP-55 checksum validation, or an ICAP address
    /// failed its ISO 7064 mod-97-10 check digits.
    #[error("bad checksum")]
    BadChecksum,

    /// RLP or JSON input was structurally invalid (non-canonical length prefix,
    /// wrong element count, etc).
    #[error("malformed encoding")]
    Malformed,

    /// Division or modulus by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A signature's `r` or `s` component was zero.
    #[error("bad signature")]
    BadSignature,
}

pub type Result<T> = std::result::Result<T, Error>;
