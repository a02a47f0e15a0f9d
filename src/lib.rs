//! Facade crate re-exporting the three layers of the wallet library:
//! key custody & signing ([`signers`]), serialization ([`core`]), and the
//! asynchronous provider surface ([`providers`]).

pub use ethers_lite_core as core;
pub use ethers_lite_providers as providers;
pub use ethers_lite_signers as signers;
