//! Wire types: the signed 256-bit integer, addresses, hashes, RLP items,
//! signatures, transactions, and the `ethereum:` payment URI.

pub mod address;
pub mod bigint;
pub mod hash;
pub mod payment;
pub mod rlp;
pub mod signature;
pub mod transaction;

pub use address::Address;
pub use bigint::{BigInt256, Sign};
pub use hash::Hash;
pub use payment::Payment;
pub use rlp::Item;
pub use signature::Signature;
pub use transaction::Transaction;
