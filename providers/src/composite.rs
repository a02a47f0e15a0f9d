//! `Fallback` and `RoundRobin`: two ways to compose a list of child
//! providers behind the single [`Provider`] trait.
//!
//! Grounded on `ethers-providers`'s middleware-composition idiom
//! (`Middleware::inner`, wrapping one provider in another), rebuilt against
//! this crate's `Provider`/`Promise` pair rather than `async fn` middleware.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use ethers_lite_core::types::{Address, BigInt256, Hash, Transaction};

use crate::{
    error::ProviderError,
    promise::{MainExecutor, Promise},
    provider::{
        AddressPromise, BigIntPromise, BlockPromise, BlockTag, BytesPromise, FloatPromise,
        HashPromise, Provider, StringPromise, TransactionListPromise, TransactionPromise,
        U64Promise,
    },
};

fn require_matching_chain_ids(children: &[Arc<dyn Provider>]) -> Result<u64, ProviderError> {
    let first = children
        .first()
        .ok_or_else(|| ProviderError::InvalidParameters("no child providers".into()))?
        .chain_id();
    if children.iter().any(|child| child.chain_id() != first) {
        return Err(ProviderError::InvalidParameters("child chain ids disagree".into()))
    }
    Ok(first)
}

/// Round-robins across children with no retry: call `i = counter mod N`,
/// surface that child's result (success or failure) verbatim.
pub struct RoundRobinProvider {
    children: Vec<Arc<dyn Provider>>,
    chain_id: u64,
    counter: AtomicUsize,
}

impl RoundRobinProvider {
    pub fn new(children: Vec<Arc<dyn Provider>>) -> Result<Arc<Self>, ProviderError> {
        let chain_id = require_matching_chain_ids(&children)?;
        Ok(Arc::new(Self { children, chain_id, counter: AtomicUsize::new(0) }))
    }

    fn next_child(&self) -> &Arc<dyn Provider> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.children.len();
        &self.children[index]
    }
}

macro_rules! round_robin_method {
    ($name:ident, $promise:ty $(, $arg:ident: $arg_ty:ty)*) => {
        fn $name(&self, $($arg: $arg_ty),*) -> $promise {
            self.next_child().$name($($arg),*)
        }
    };
}

impl Provider for RoundRobinProvider {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn executor(&self) -> Arc<dyn MainExecutor> {
        self.children[0].executor()
    }

    round_robin_method!(get_balance, BigIntPromise, address: Address, tag: BlockTag);
    round_robin_method!(get_transaction_count, U64Promise, address: Address, tag: BlockTag);
    round_robin_method!(get_code, BytesPromise, address: Address);
    round_robin_method!(get_storage_at, Promise<[u8; 32]>, address: Address, position: BigInt256);
    round_robin_method!(get_block_number, U64Promise);
    round_robin_method!(get_gas_price, BigIntPromise);
    round_robin_method!(send_transaction, HashPromise, signed_bytes: &[u8]);
    round_robin_method!(get_block_by_hash, BlockPromise, hash: Hash);
    round_robin_method!(get_block_by_tag, BlockPromise, tag: BlockTag);
    round_robin_method!(get_transaction, TransactionPromise, hash: Hash);
    round_robin_method!(get_transactions, TransactionListPromise, address: Address, start_tag: BlockTag);
    round_robin_method!(get_ether_price, FloatPromise);
    round_robin_method!(lookup_address, StringPromise, address: Address);

    fn call(&self, tx: &Transaction) -> BytesPromise {
        self.next_child().call(tx)
    }

    fn estimate_gas(&self, tx: &Transaction) -> BigIntPromise {
        self.next_child().estimate_gas(tx)
    }

    fn lookup_name(&self, name: &str) -> AddressPromise {
        self.next_child().lookup_name(name)
    }
}

/// Tries children in order. A child's failure only advances to the next
/// child when it is *not* `InvalidParameters`/`NotFound` — those are
/// considered definitive answers about the request itself, not the backend.
pub struct FallbackProvider {
    children: Vec<Arc<dyn Provider>>,
    chain_id: u64,
    weak_self: std::sync::Weak<FallbackProvider>,
}

impl FallbackProvider {
    pub fn new(children: Vec<Arc<dyn Provider>>) -> Result<Arc<Self>, ProviderError> {
        let chain_id = require_matching_chain_ids(&children)?;
        Ok(Arc::new_cyclic(|weak_self| Self {
            children,
            chain_id,
            weak_self: weak_self.clone(),
        }))
    }

    fn is_definitive(error: &ProviderError) -> bool {
        matches!(error, ProviderError::InvalidParameters(_) | ProviderError::NotFound)
    }

    /// Runs `attempt` against each child in order, short-circuiting on the
    /// first success or the first definitive failure; returns the last error
    /// if every child is exhausted.
    fn try_children<T: Clone + Send + 'static>(
        self: &Arc<Self>,
        attempt: impl Fn(&Arc<dyn Provider>) -> Promise<T> + Send + Sync + 'static,
    ) -> Promise<T> {
        let executor = self.executor();
        let this = self.clone();
        let attempt = Arc::new(attempt);
        Promise::new(executor, move |resolver| {
            try_from_index(this, attempt, 0, resolver);
        })
    }
}

fn try_from_index<T: Clone + Send + 'static>(
    provider: Arc<FallbackProvider>,
    attempt: Arc<dyn Fn(&Arc<dyn Provider>) -> Promise<T> + Send + Sync>,
    index: usize,
    resolver: crate::promise::Resolver<T>,
) {
    let child = &provider.children[index];
    let is_last = index + 1 == provider.children.len();
    tracing::trace!(child = index, "fallback dispatch");
    attempt(child).on_completion(move |result| match result {
        Ok(value) => resolver.resolve(value),
        Err(err) => {
            let is_definitive = match err.downcast_cause::<ProviderError>() {
                Some(provider_error) => FallbackProvider::is_definitive(provider_error),
                None => false,
            };
            if is_last || is_definitive {
                tracing::warn!(child = index, %err, "fallback exhausted");
                resolver.reject(err)
            } else {
                tracing::debug!(child = index, %err, "fallback child failed, trying next");
                try_from_index(provider, attempt, index + 1, resolver)
            }
        }
    });
}

impl Provider for FallbackProvider {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn executor(&self) -> Arc<dyn MainExecutor> {
        self.children[0].executor()
    }

    fn get_balance(&self, address: Address, tag: BlockTag) -> BigIntPromise {
        let arc = self.self_arc();
        arc.try_children(move |child| child.get_balance(address, tag))
    }

    fn get_transaction_count(&self, address: Address, tag: BlockTag) -> U64Promise {
        self.self_arc().try_children(move |child| child.get_transaction_count(address, tag))
    }

    fn get_code(&self, address: Address) -> BytesPromise {
        self.self_arc().try_children(move |child| child.get_code(address))
    }

    fn get_storage_at(&self, address: Address, position: BigInt256) -> Promise<[u8; 32]> {
        self.self_arc().try_children(move |child| child.get_storage_at(address, position))
    }

    fn get_block_number(&self) -> U64Promise {
        self.self_arc().try_children(move |child| child.get_block_number())
    }

    fn get_gas_price(&self) -> BigIntPromise {
        self.self_arc().try_children(move |child| child.get_gas_price())
    }

    fn call(&self, tx: &Transaction) -> BytesPromise {
        let tx = tx.clone();
        self.self_arc().try_children(move |child| child.call(&tx))
    }

    fn estimate_gas(&self, tx: &Transaction) -> BigIntPromise {
        let tx = tx.clone();
        self.self_arc().try_children(move |child| child.estimate_gas(&tx))
    }

    /// Broadcasts to every child in parallel; the first success wins, and a
    /// later rejection from a slower child is ignored once a success has
    /// already been delivered (spec §4.14).
    fn send_transaction(&self, signed_bytes: &[u8]) -> HashPromise {
        let executor = self.executor();
        let children = self.children.clone();
        let bytes = signed_bytes.to_vec();
        Promise::new(executor, move |resolver| {
            let resolver = Arc::new(resolver);
            let settled = Arc::new(std::sync::atomic::AtomicBool::new(false));
            let remaining = Arc::new(AtomicUsize::new(children.len()));
            let last_error = Arc::new(Mutex::new(None));
            for child in children {
                let resolver = resolver.clone();
                let settled = settled.clone();
                let remaining = remaining.clone();
                let last_error = last_error.clone();
                child.send_transaction(&bytes).on_completion(move |result| match result {
                    Ok(hash) => {
                        if !settled.swap(true, Ordering::SeqCst) {
                            resolver.resolve(hash);
                        }
                    }
                    Err(err) => {
                        *last_error.lock().unwrap() = Some(err);
                        if remaining.fetch_sub(1, Ordering::SeqCst) == 1
                            && !settled.swap(true, Ordering::SeqCst)
                        {
                            let error = last_error.lock().unwrap().clone().unwrap();
                            resolver.reject(error);
                        }
                    }
                });
            }
        })
    }

    fn get_block_by_hash(&self, hash: Hash) -> BlockPromise {
        self.self_arc().try_children(move |child| child.get_block_by_hash(hash))
    }

    fn get_block_by_tag(&self, tag: BlockTag) -> BlockPromise {
        self.self_arc().try_children(move |child| child.get_block_by_tag(tag))
    }

    fn get_transaction(&self, hash: Hash) -> TransactionPromise {
        self.self_arc().try_children(move |child| child.get_transaction(hash))
    }

    fn get_transactions(&self, address: Address, start_tag: BlockTag) -> TransactionListPromise {
        self.self_arc().try_children(move |child| child.get_transactions(address, start_tag))
    }

    fn get_ether_price(&self) -> FloatPromise {
        self.self_arc().try_children(move |_child| _child.get_ether_price())
    }

    fn lookup_name(&self, name: &str) -> AddressPromise {
        let name = name.to_string();
        self.self_arc().try_children(move |child| child.lookup_name(&name))
    }

    fn lookup_address(&self, address: Address) -> StringPromise {
        self.self_arc().try_children(move |child| child.lookup_address(address))
    }
}

impl FallbackProvider {
    /// `try_children` needs an owned `Arc<Self>` to recurse across
    /// `on_completion` callbacks; trait methods only hand us `&self`. `new`
    /// always constructs through `Arc::new_cyclic`, so `weak_self` is live
    /// for as long as any `&self` reference is.
    fn self_arc(&self) -> Arc<FallbackProvider> {
        self.weak_self.upgrade().expect("FallbackProvider is always held behind an Arc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::{Promise as P, ThreadExecutor};

    struct StubProvider {
        executor: Arc<dyn MainExecutor>,
        chain_id: u64,
        balance: BigInt256,
        fail_with: Option<ProviderError>,
    }

    impl Provider for StubProvider {
        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        fn executor(&self) -> Arc<dyn MainExecutor> {
            self.executor.clone()
        }

        fn get_balance(&self, _address: Address, _tag: BlockTag) -> BigIntPromise {
            match &self.fail_with {
                Some(err) => P::rejected(self.executor(), crate::promise::PromiseError::with_cause(err.clone())),
                None => P::resolved(self.executor(), self.balance),
            }
        }
        fn get_transaction_count(&self, _address: Address, _tag: BlockTag) -> U64Promise {
            P::resolved(self.executor(), 0)
        }
        fn get_code(&self, _address: Address) -> BytesPromise {
            P::resolved(self.executor(), Vec::new())
        }
        fn get_storage_at(&self, _address: Address, _position: BigInt256) -> Promise<[u8; 32]> {
            P::resolved(self.executor(), [0u8; 32])
        }
        fn get_block_number(&self) -> U64Promise {
            P::resolved(self.executor(), 0)
        }
        fn get_gas_price(&self) -> BigIntPromise {
            P::resolved(self.executor(), BigInt256::ZERO)
        }
        fn call(&self, _tx: &Transaction) -> BytesPromise {
            P::resolved(self.executor(), Vec::new())
        }
        fn estimate_gas(&self, _tx: &Transaction) -> BigIntPromise {
            P::resolved(self.executor(), BigInt256::ZERO)
        }
        fn send_transaction(&self, _signed_bytes: &[u8]) -> HashPromise {
            match &self.fail_with {
                Some(err) => P::rejected(self.executor(), crate::promise::PromiseError::with_cause(err.clone())),
                None => P::resolved(self.executor(), Hash::from_bytes([1u8; 32])),
            }
        }
        fn get_block_by_hash(&self, _hash: Hash) -> BlockPromise {
            P::rejected(self.executor(), ProviderError::NotImplemented.into())
        }
        fn get_block_by_tag(&self, _tag: BlockTag) -> BlockPromise {
            P::rejected(self.executor(), ProviderError::NotImplemented.into())
        }
        fn get_transaction(&self, _hash: Hash) -> TransactionPromise {
            P::rejected(self.executor(), ProviderError::NotImplemented.into())
        }
        fn get_transactions(&self, _address: Address, _start_tag: BlockTag) -> TransactionListPromise {
            P::resolved(self.executor(), Vec::new())
        }
        fn get_ether_price(&self) -> FloatPromise {
            P::resolved(self.executor(), 0.0)
        }
        fn lookup_name(&self, _name: &str) -> AddressPromise {
            P::rejected(self.executor(), ProviderError::NotImplemented.into())
        }
        fn lookup_address(&self, _address: Address) -> StringPromise {
            P::rejected(self.executor(), ProviderError::NotImplemented.into())
        }
    }

    fn stub(chain_id: u64, balance: u64, fail_with: Option<ProviderError>) -> Arc<dyn Provider> {
        Arc::new(StubProvider {
            executor: ThreadExecutor::new(),
            chain_id,
            balance: BigInt256::from_u64(balance),
            fail_with,
        })
    }

    #[test]
    fn mismatched_chain_ids_reject_construction() {
        let children = vec![stub(1, 0, None), stub(2, 0, None)];
        assert!(RoundRobinProvider::new(children.clone()).is_err());
        assert!(FallbackProvider::new(children).is_err());
    }

    #[test]
    fn round_robin_cycles_through_children() {
        let children = vec![stub(1, 10, None), stub(1, 20, None)];
        let provider = RoundRobinProvider::new(children).unwrap();
        let first = provider.get_balance(Address::ZERO, BlockTag::Latest).wait().unwrap();
        let second = provider.get_balance(Address::ZERO, BlockTag::Latest).wait().unwrap();
        let third = provider.get_balance(Address::ZERO, BlockTag::Latest).wait().unwrap();
        assert_eq!(first, BigInt256::from_u64(10));
        assert_eq!(second, BigInt256::from_u64(20));
        assert_eq!(third, BigInt256::from_u64(10));
    }

    #[test]
    fn fallback_skips_non_definitive_failures() {
        let children = vec![
            stub(1, 0, Some(ProviderError::Timeout)),
            stub(1, 99, None),
        ];
        let provider = FallbackProvider::new(children).unwrap();
        let balance = provider.get_balance(Address::ZERO, BlockTag::Latest).wait().unwrap();
        assert_eq!(balance, BigInt256::from_u64(99));
    }

    #[test]
    fn fallback_stops_at_definitive_failure() {
        let children = vec![
            stub(1, 0, Some(ProviderError::InvalidParameters("bad".into()))),
            stub(1, 99, None),
        ];
        let provider = FallbackProvider::new(children).unwrap();
        let result = provider.get_balance(Address::ZERO, BlockTag::Latest).wait();
        assert!(result.is_err());
    }

    #[test]
    fn fallback_broadcast_send_transaction_takes_first_success() {
        let children = vec![
            stub(1, 0, Some(ProviderError::Timeout)),
            stub(1, 0, None),
        ];
        let provider = FallbackProvider::new(children).unwrap();
        let hash = provider.send_transaction(&[]).wait().unwrap();
        assert_eq!(hash, Hash::from_bytes([1u8; 32]));
    }
}
