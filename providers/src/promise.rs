//! A single-producer future with ordered, deferred, main-thread delivery.
//!
//! Not `async`/`.await`: grounded directly on `Utilities/Promise.h`'s contract
//! rather than adapted from the teacher, since the teacher (`ethers-providers`)
//! uses native `async fn` throughout and has no equivalent type (per this
//! specification's Design Notes #1/#2). The mutex-protected shared state and
//! atomic settle-once guard are grounded in *pattern* on the teacher's
//! `std::sync::atomic` request-id counters (`ethers-providers::provider`).

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Condvar, Mutex,
    },
    thread,
    time::Duration,
};

/// A generic promise-rejection error. Rejecting with no specific cause
/// constructs this sentinel, per spec §4.11 ("Reject with a nil error
/// constructs a generic `PromiseError`"). Carries an optional typed `cause`
/// so a rejection originating from, e.g., a [`crate::error::ProviderError`]
/// can still be inspected by composition logic (`Fallback`) that needs to
/// distinguish error kinds, without widening every promise to a specific
/// error type.
#[derive(Clone, Debug)]
pub struct PromiseError {
    pub message: String,
    cause: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl PromiseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), cause: None }
    }

    pub fn with_cause(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self { message: cause.to_string(), cause: Some(Arc::new(cause)) }
    }

    /// Recovers the original typed error, if this rejection carries one and
    /// it matches `E`.
    pub fn downcast_cause<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause.as_ref().and_then(|cause| cause.downcast_ref::<E>())
    }
}

impl PartialEq for PromiseError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for PromiseError {}

impl fmt::Display for PromiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PromiseError {}

/// Posts deferred work one event-turn later, FIFO, on a single logical
/// thread — the "UI-like main loop" the host is required to provide (Design
/// Note: "require the host to provide a `MainExecutor` abstraction").
pub trait MainExecutor: Send + Sync {
    fn post(&self, job: Box<dyn FnOnce() + Send>);
}

/// Default `MainExecutor`: a dedicated thread draining an `mpsc` channel.
pub struct ThreadExecutor {
    sender: mpsc::Sender<Box<dyn FnOnce() + Send>>,
}

impl ThreadExecutor {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = mpsc::channel::<Box<dyn FnOnce() + Send>>();
        thread::Builder::new()
            .name("ethers-lite-main".into())
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })
            .expect("failed to spawn main executor thread");
        Arc::new(Self { sender })
    }
}

impl MainExecutor for ThreadExecutor {
    fn post(&self, job: Box<dyn FnOnce() + Send>) {
        // the receiving end only ever disconnects when every `ThreadExecutor`
        // (and thus every sender) has been dropped, at which point there is
        // nothing left to observe a dropped job anyway.
        let _ = self.sender.send(job);
    }
}

#[derive(Clone)]
enum State<T> {
    Pending,
    Resolved(T),
    Rejected(PromiseError),
}

type Callback<T> = Box<dyn FnOnce(Result<T, PromiseError>) + Send>;

struct Inner<T> {
    state: Mutex<State<T>>,
    callbacks: Mutex<Vec<Callback<T>>>,
    settled: AtomicBool,
    settle_signal: Condvar,
    settle_lock: Mutex<bool>,
    executor: Arc<dyn MainExecutor>,
}

/// Exactly one of `{pending, resolved(T), rejected(PromiseError)}`; settles at
/// most once (spec §3 "Promise<T>").
pub struct Promise<T> {
    inner: Arc<Inner<T>>,
}

/// The producer-side handle (Design Note #2's replacement for "a callback that
/// must call resolve or reject exactly once"): `resolve`/`reject` may each be
/// called at most once across the pair, enforced at runtime by panicking on a
/// second settle attempt.
pub struct Resolver<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Invokes `setup` synchronously on the caller's thread with a
    /// [`Resolver`] the setup closure must settle exactly once.
    pub fn new(executor: Arc<dyn MainExecutor>, setup: impl FnOnce(Resolver<T>)) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(State::Pending),
            callbacks: Mutex::new(Vec::new()),
            settled: AtomicBool::new(false),
            settle_signal: Condvar::new(),
            settle_lock: Mutex::new(false),
            executor,
        });
        setup(Resolver { inner: inner.clone() });
        Self { inner }
    }

    /// Constructs an already-resolved promise.
    pub fn resolved(executor: Arc<dyn MainExecutor>, value: T) -> Self {
        Self::new(executor, |resolver| resolver.resolve(value))
    }

    /// Constructs an already-rejected promise.
    pub fn rejected(executor: Arc<dyn MainExecutor>, error: PromiseError) -> Self {
        Self::new(executor, |resolver| resolver.reject(error))
    }

    /// Registers a completion callback. Per spec §4.11/§5: callbacks are
    /// retained FIFO and each one is dispatched through the `MainExecutor`
    /// exactly one event-turn later, even if the promise has already settled.
    pub fn on_completion(&self, callback: impl FnOnce(Result<T, PromiseError>) + Send + 'static) {
        let state = self.inner.state.lock().unwrap();
        match &*state {
            State::Pending => {
                self.inner.callbacks.lock().unwrap().push(Box::new(callback));
            }
            State::Resolved(value) => {
                let value = value.clone();
                let executor = self.inner.executor.clone();
                drop(state);
                executor.post(Box::new(move || callback(Ok(value))));
            }
            State::Rejected(err) => {
                let err = err.clone();
                let executor = self.inner.executor.clone();
                drop(state);
                executor.post(Box::new(move || callback(Err(err))));
            }
        }
    }

    /// Blocks the calling thread until the promise settles. Not part of the
    /// spec's callback contract; provided as the synchronous entry point test
    /// harnesses and non-reactive callers need to observe a result at all.
    pub fn wait(&self) -> Result<T, PromiseError> {
        let pair = Arc::new((Mutex::new(None::<Result<T, PromiseError>>), Condvar::new()));
        let pair2 = pair.clone();
        self.on_completion(move |result| {
            let (lock, cvar) = &*pair2;
            *lock.lock().unwrap() = Some(result);
            cvar.notify_one();
        });
        let (lock, cvar) = &*pair;
        let mut guard = lock.lock().unwrap();
        while guard.is_none() {
            guard = cvar.wait(guard).unwrap();
        }
        guard.take().unwrap()
    }

    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::SeqCst)
    }

    /// Projects a settled value through `f`, e.g. `BigIntPromise` from a raw
    /// JSON promise — the typed-subclass pattern from `Promise.h`, adapted as
    /// a generic map rather than a family of ObjC subclasses.
    pub fn map<U: Clone + Send + 'static>(
        &self,
        executor: Arc<dyn MainExecutor>,
        f: impl FnOnce(T) -> U + Send + 'static,
    ) -> Promise<U> {
        let source = self.clone();
        Promise::new(executor, move |resolver| {
            source.on_completion(move |result| match result {
                Ok(value) => resolver.resolve(f(value)),
                Err(err) => resolver.reject(err),
            });
        })
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    fn settle(&self, state: State<T>) {
        let mut guard = self.inner.settle_lock.lock().unwrap();
        assert!(!*guard, "Promise settled more than once");
        *guard = true;
        self.inner.settled.store(true, Ordering::SeqCst);
        self.inner.settle_signal.notify_all();
        drop(guard);

        *self.inner.state.lock().unwrap() = state.clone();

        let callbacks = std::mem::take(&mut *self.inner.callbacks.lock().unwrap());
        for callback in callbacks {
            let executor = self.inner.executor.clone();
            let value = state.clone();
            executor.post(Box::new(move || {
                let result = match value {
                    State::Resolved(v) => Ok(v),
                    State::Rejected(e) => Err(e),
                    State::Pending => unreachable!("settled state is never Pending"),
                };
                callback(result);
            }));
        }
    }

    /// Resolves with `value`. Panics if this promise already settled.
    pub fn resolve(&self, value: T) {
        self.settle(State::Resolved(value));
    }

    /// Rejects with `error`. Panics if this promise already settled.
    pub fn reject(&self, error: PromiseError) {
        self.settle(State::Rejected(error));
    }
}

/// Fulfills with the ordered list of successful results when every child
/// resolves; rejects with the first rejection observed (spec §4.11 `all`).
pub fn all<T: Clone + Send + 'static>(
    executor: Arc<dyn MainExecutor>,
    promises: Vec<Promise<T>>,
) -> Promise<Vec<T>> {
    let count = promises.len();
    Promise::new(executor, move |resolver| {
        if count == 0 {
            resolver.resolve(Vec::new());
            return
        }

        let results: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; count]));
        let remaining = Arc::new(AtomicBool::new(true));
        let resolver = Arc::new(resolver);

        for (index, promise) in promises.into_iter().enumerate() {
            let results = results.clone();
            let remaining = remaining.clone();
            let resolver = resolver.clone();
            promise.on_completion(move |result| {
                if !remaining.load(Ordering::SeqCst) {
                    return
                }
                match result {
                    Ok(value) => {
                        let mut guard = results.lock().unwrap();
                        guard[index] = Some(value);
                        if guard.iter().all(Option::is_some) {
                            let values = guard.drain(..).map(|v| v.unwrap()).collect();
                            drop(guard);
                            remaining.store(false, Ordering::SeqCst);
                            resolver.resolve(values);
                        }
                    }
                    Err(err) => {
                        if remaining.swap(false, Ordering::SeqCst) {
                            resolver.reject(err);
                        }
                    }
                }
            });
        }
    })
}

/// Resolves with `()` after `duration`, via a background timer thread — one
/// of the spec's three suspension points inside the core (§5: "polling timer
/// ticks").
pub fn timer(executor: Arc<dyn MainExecutor>, duration: Duration) -> Promise<()> {
    Promise::new(executor, move |resolver| {
        thread::spawn(move || {
            thread::sleep(duration);
            resolver.resolve(());
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_delivers_to_callback_after_settle() {
        let executor = ThreadExecutor::new();
        let promise = Promise::resolved(executor, 42);
        assert_eq!(promise.wait(), Ok(42));
    }

    #[test]
    fn reject_delivers_error_to_callback() {
        let executor = ThreadExecutor::new();
        let promise: Promise<i32> =
            Promise::rejected(executor, PromiseError::new("boom"));
        assert_eq!(promise.wait(), Err(PromiseError::new("boom")));
    }

    #[test]
    fn callbacks_fire_in_insertion_order() {
        let executor = ThreadExecutor::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let promise = Promise::resolved(executor, ());

        for i in 0..5 {
            let order = order.clone();
            promise.on_completion(move |_| order.lock().unwrap().push(i));
        }
        // drain via wait() on one more callback registered last, to block
        // until all prior callbacks (registered earlier, thus dispatched
        // earlier on the FIFO executor) have run.
        promise.wait().unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "settled more than once")]
    fn double_settle_panics() {
        let executor = ThreadExecutor::new();
        let promise: Promise<i32> = Promise::new(executor, |resolver| {
            resolver.resolve(1);
            resolver.resolve(2);
        });
        let _ = promise.wait();
    }

    #[test]
    fn all_resolves_in_order() {
        let executor = ThreadExecutor::new();
        let children = vec![
            Promise::resolved(executor.clone(), 1),
            Promise::resolved(executor.clone(), 2),
            Promise::resolved(executor.clone(), 3),
        ];
        let combined = all(executor, children);
        assert_eq!(combined.wait(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn all_rejects_with_first_rejection() {
        let executor = ThreadExecutor::new();
        let children = vec![
            Promise::resolved(executor.clone(), 1),
            Promise::rejected(executor.clone(), PromiseError::new("nope")),
        ];
        let combined = all(executor, children);
        assert_eq!(combined.wait(), Err(PromiseError::new("nope")));
    }

    #[test]
    fn timer_resolves_after_duration() {
        let executor = ThreadExecutor::new();
        let t = timer(executor, Duration::from_millis(10));
        assert_eq!(t.wait(), Ok(()));
    }
}
