use std::collections::HashSet;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;
use tracing::trace;

use super::ItemExponentialFailureRateLimiter;
use super::RateLimiter;
use crate::QueueConfig;

/// Bound on the keys a queue can hold.
pub trait QueueKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> QueueKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

struct QueueState<K> {
    /// Keys ready to be handed out, in arrival order
    queue: VecDeque<K>,
    /// Keys that need processing (queued, or re-added while processing)
    dirty: HashSet<K>,
    /// Keys currently held by a consumer
    processing: HashSet<K>,
    /// Keys scheduled for a later add, with their ready time
    waiting: Vec<(Instant, K)>,
    shutting_down: bool,
}

impl<K: QueueKey> QueueState<K> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            dirty: HashSet::new(),
            processing: HashSet::new(),
            waiting: Vec::new(),
            shutting_down: false,
        }
    }

    /// Returns true if the key was pushed to the ready queue.
    fn insert(
        &mut self,
        key: K,
    ) -> bool {
        if self.dirty.contains(&key) {
            trace!(?key, "key already pending, coalesced");
            return false;
        }
        self.dirty.insert(key.clone());
        if self.processing.contains(&key) {
            trace!(?key, "key is being processed, marked dirty");
            return false;
        }
        self.queue.push_back(key);
        true
    }

    /// Moves every waiting key whose ready time has passed into the queue.
    fn promote_ready(
        &mut self,
        now: Instant,
    ) {
        if self.waiting.is_empty() {
            return;
        }
        let (ready, pending): (Vec<_>, Vec<_>) = self.waiting.drain(..).partition(|(at, _)| *at <= now);
        self.waiting = pending;
        for (_, key) in ready {
            self.insert(key);
        }
    }

    fn next_ready_at(&self) -> Option<Instant> {
        self.waiting.iter().map(|(at, _)| *at).min()
    }

    fn schedule(
        &mut self,
        key: K,
        ready_at: Instant,
    ) {
        // Keep only the earliest ready time per key
        if let Some(entry) = self.waiting.iter_mut().find(|(_, k)| *k == key) {
            if ready_at < entry.0 {
                entry.0 = ready_at;
            }
            return;
        }
        self.waiting.push((ready_at, key));
    }
}

struct WorkQueueInner<K> {
    state: Mutex<QueueState<K>>,
    notify: Notify,
    rate_limiter: Box<dyn RateLimiter<K>>,
}

/// Cloneable handle to a shared work queue.
pub struct WorkQueue<K> {
    inner: Arc<WorkQueueInner<K>>,
}

impl<K> Clone for WorkQueue<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: QueueKey> Debug for WorkQueue<K> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WorkQueue")
            .field("queued", &state.queue.len())
            .field("processing", &state.processing.len())
            .field("waiting", &state.waiting.len())
            .field("shutting_down", &state.shutting_down)
            .finish()
    }
}

impl<K: QueueKey> WorkQueue<K> {
    pub fn new(rate_limiter: Box<dyn RateLimiter<K>>) -> Self {
        Self {
            inner: Arc::new(WorkQueueInner {
                state: Mutex::new(QueueState::new()),
                notify: Notify::new(),
                rate_limiter,
            }),
        }
    }

    /// Queue with the per-key exponential failure backoff from `config`.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(Box::new(ItemExponentialFailureRateLimiter::from_config(config)))
    }

    /// Enqueues `key` unless it is already pending. Ignored after shutdown.
    pub fn add(
        &self,
        key: K,
    ) {
        let pushed = {
            let mut state = self.inner.state.lock();
            if state.shutting_down {
                trace!(?key, "queue shutting down, add ignored");
                return;
            }
            state.insert(key)
        };
        if pushed {
            self.inner.notify.notify_one();
        }
    }

    /// Enqueues `key` once `delay` has elapsed.
    pub fn add_after(
        &self,
        key: K,
        delay: Duration,
    ) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        {
            let mut state = self.inner.state.lock();
            if state.shutting_down {
                return;
            }
            state.schedule(key, Instant::now() + delay);
        }
        // Wake a consumer so it re-arms its timer for the new deadline
        self.inner.notify.notify_one();
    }

    /// Re-enqueues `key` after its rate-limited backoff delay.
    pub fn add_rate_limited(
        &self,
        key: K,
    ) {
        let delay = self.inner.rate_limiter.when(&key);
        debug!(?key, ?delay, "requeue with backoff");
        self.add_after(key, delay);
    }

    /// Waits for the next key. Returns `None` once the queue is shut down.
    ///
    /// The caller owns the key until it calls [`WorkQueue::done`].
    pub async fn get(&self) -> Option<K> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_ready_at = {
                let mut state = self.inner.state.lock();
                if state.shutting_down {
                    return None;
                }
                state.promote_ready(Instant::now());
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                state.next_ready_at()
            };

            match next_ready_at {
                Some(at) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(at) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Marks `key` as no longer processing, re-queueing it if it was added
    /// again in the meantime.
    pub fn done(
        &self,
        key: &K,
    ) {
        let requeued = {
            let mut state = self.inner.state.lock();
            state.processing.remove(key);
            if state.dirty.contains(key) && !state.shutting_down {
                state.queue.push_back(key.clone());
                true
            } else {
                false
            }
        };
        if requeued {
            self.inner.notify.notify_one();
        }
    }

    /// Clears the retry backoff of `key`.
    pub fn forget(
        &self,
        key: &K,
    ) {
        self.inner.rate_limiter.forget(key);
    }

    pub fn num_requeues(
        &self,
        key: &K,
    ) -> u32 {
        self.inner.rate_limiter.num_requeues(key)
    }

    /// Number of keys ready to be handed out.
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unblocks every current and future `get` with `None`. Idempotent.
    pub fn shut_down(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.shutting_down {
                return;
            }
            state.shutting_down = true;
            state.waiting.clear();
        }
        debug!("work queue shut down");
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.state.lock().shutting_down
    }
}
