#![deny(unused_crate_dependencies)]

//! Primitive serialization and crypto layer: the signed 256-bit integer
//! ([`types::BigInt256`]), addresses, hashes, RLP, the legacy/EIP-155
//! transaction model, hashing primitives, and zero-on-drop secure memory
//! ([`crypto::SecureBytes`]).
//!
//! Key derivation, signing, and the async provider surface live in the
//! sibling `ethers-lite-signers` and `ethers-lite-providers` crates.

pub mod crypto;
pub mod error;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

// re-export k256, mirroring the teacher's re-export so downstream crates don't
// have to pin a second copy to recover/verify signatures against this crate's
// `Signature` type.
pub use k256;
