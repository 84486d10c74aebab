use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;

use crate::config::exponential_delay;
use crate::QueueConfig;

/// Decides how long a key waits before it is retried.
pub trait RateLimiter<K>: Send + Sync {
    /// Delay for the next retry of `item`. Each call counts as one failure.
    fn when(
        &self,
        item: &K,
    ) -> Duration;

    /// Clears the failure history of `item`.
    fn forget(
        &self,
        item: &K,
    );

    /// Number of failures recorded for `item` since it was last forgotten.
    fn num_requeues(
        &self,
        item: &K,
    ) -> u32;
}

/// `base * 2^failures`, capped at `max`, tracked per key.
#[derive(Debug)]
pub struct ItemExponentialFailureRateLimiter<K: Eq + Hash> {
    failures: DashMap<K, u32>,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl<K: Eq + Hash> ItemExponentialFailureRateLimiter<K> {
    pub fn new(
        base_delay_ms: u64,
        max_delay_ms: u64,
    ) -> Self {
        Self {
            failures: DashMap::new(),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }
}

impl<K> RateLimiter<K> for ItemExponentialFailureRateLimiter<K>
where
    K: Eq + Hash + Clone + Send + Sync,
{
    fn when(
        &self,
        item: &K,
    ) -> Duration {
        let mut failures = self.failures.entry(item.clone()).or_insert(0);
        let exp = *failures;
        *failures = failures.saturating_add(1);
        exponential_delay(self.base_delay_ms, self.max_delay_ms, exp)
    }

    fn forget(
        &self,
        item: &K,
    ) {
        self.failures.remove(item);
    }

    fn num_requeues(
        &self,
        item: &K,
    ) -> u32 {
        self.failures.get(item).map(|f| *f).unwrap_or(0)
    }
}
