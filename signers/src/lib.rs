#![deny(unused_crate_dependencies)]

//! Key custody and signing: BIP-39/32 mnemonic-to-key derivation, ECDSA
//! signing and recovery, the cancellable Web3 Secret Storage v3 keystore, and
//! the [`Account`] type tying a private scalar to its address.

pub mod account;
pub mod ecdsa;
pub mod error;
pub mod keystore;
pub mod mnemonic;

pub use account::Account;
pub use error::{Result, SignerError};
