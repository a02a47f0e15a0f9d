#![deny(unused_crate_dependencies)]

//! Provider-side core: a deferred-delivery [`promise::Promise`] standing in
//! for `async`/`.await`, the [`provider::Provider`] trait with a polling
//! block-tip notifier, a JSON path-query coercion layer for heterogeneous
//! RPC shapes, and `Fallback`/`RoundRobin` provider composition.
//!
//! This crate defines no HTTP transport: per this workspace's design, the
//! wire layer is an external collaborator that implements [`provider::Provider`]
//! directly (as, e.g., a JSON-RPC client would).

pub mod composite;
pub mod error;
pub mod json_path;
pub mod polling;
pub mod promise;
pub mod provider;

pub use composite::{FallbackProvider, RoundRobinProvider};
pub use error::{ProviderError, Result};
pub use json_path::{query_path, Coerced, Coercion, Segment};
pub use polling::PollingNotifier;
pub use promise::{all, timer, MainExecutor, Promise, PromiseError, Resolver, ThreadExecutor};
pub use provider::{BlockTag, Provider};
