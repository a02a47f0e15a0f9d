//! Hashing primitives and secure-memory handling shared by the serialization
//! and signing layers.

pub mod hash;
pub mod secure_bytes;

pub use secure_bytes::{SecureBytes, SecureString};
