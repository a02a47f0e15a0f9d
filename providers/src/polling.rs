//! A polling block-tip notifier built on [`Promise`]/[`MainExecutor`] rather
//! than a `futures::Stream`, per this specification's no-async-runtime design.
//!
//! Grounded on `ethers-providers/src/stream.rs`'s `interval`/
//! `DEFAULT_POLL_INTERVAL` polling pattern; the truncated exponential backoff
//! is new logic (the teacher's polling stream has no backoff) specified
//! directly for this crate.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crate::{
    promise::{timer, MainExecutor},
    provider::Provider,
};

const INITIAL_BACKOFF: Duration = Duration::from_secs(4);
const MAX_BACKOFF: Duration = Duration::from_secs(120);
/// Sentinel meaning "no block observed yet" — real block numbers start at 0
/// but are represented internally as `number + 1` so this sentinel never
/// collides with a genuine tip.
const NO_BLOCK: u64 = 0;

/// Polls a provider's `getBlockNumber` on a timer, calling `on_new_block` on
/// the provider's [`MainExecutor`] whenever the observed tip strictly
/// increases, and backing off geometrically on repeated failures.
pub struct PollingNotifier {
    provider: Arc<dyn Provider>,
    poll_interval: Duration,
    last_seen: AtomicU64,
    stopped: Arc<AtomicBool>,
    on_new_block: Mutex<Option<Box<dyn Fn(u64) + Send + Sync>>>,
}

impl PollingNotifier {
    pub fn new(provider: Arc<dyn Provider>, poll_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            provider,
            poll_interval,
            last_seen: AtomicU64::new(NO_BLOCK),
            stopped: Arc::new(AtomicBool::new(false)),
            on_new_block: Mutex::new(None),
        })
    }

    /// Registers the `NewBlock` callback, invoked with the new block number.
    pub fn set_on_new_block(&self, callback: impl Fn(u64) + Send + Sync + 'static) {
        *self.on_new_block.lock().unwrap() = Some(Box::new(callback));
    }

    /// Clears the cached block number, so the next poll's result — even if
    /// unchanged from the last externally-observed tip — is reported again.
    pub fn reset(&self) {
        self.last_seen.store(NO_BLOCK, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Starts the polling loop. Each tick schedules the next tick itself
    /// (via [`timer`]) rather than running on a fixed-rate ticker, so a slow
    /// `getBlockNumber` response can't cause overlapping polls.
    pub fn start(self: &Arc<Self>) {
        self.schedule_next(self.poll_interval, self.poll_interval);
    }

    fn schedule_next(self: &Arc<Self>, delay: Duration, current_backoff: Duration) {
        if self.stopped.load(Ordering::SeqCst) {
            return
        }
        let this = self.clone();
        let executor = self.provider.executor();
        timer(executor, delay).on_completion(move |_| this.tick(current_backoff));
    }

    fn tick(self: &Arc<Self>, current_backoff: Duration) {
        if self.stopped.load(Ordering::SeqCst) {
            return
        }
        let this = self.clone();
        self.provider.get_block_number().on_completion(move |result| {
            match result {
                Ok(number) => {
                    let encoded = number.saturating_add(1);
                    let previous = this.last_seen.swap(encoded, Ordering::SeqCst);
                    if encoded > previous {
                        if let Some(callback) = this.on_new_block.lock().unwrap().as_ref() {
                            callback(number);
                        }
                    }
                    this.schedule_next(this.poll_interval, INITIAL_BACKOFF);
                }
                Err(_) => {
                    let next_backoff = (current_backoff * 2).min(MAX_BACKOFF);
                    this.schedule_next(current_backoff, next_backoff);
                }
            }
        });
    }
}
