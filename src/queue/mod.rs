//! Deduplicating, rate-limited change queue.
//!
//! Keys are coalesced while pending: adding a key that is already queued is a
//! no-op. A key handed out by [`WorkQueue::get`] is tracked as *processing*
//! until [`WorkQueue::done`]; if it is added again meanwhile it is parked as
//! *dirty* and re-queued on `done`, so one key is never processed twice at the
//! same time.
//!
//! Failed keys are retried through [`WorkQueue::add_rate_limited`], which
//! asks the [`RateLimiter`] for a per-key exponential delay. A successful pass
//! calls [`WorkQueue::forget`] to reset that key's backoff.

mod rate_limiter;
mod work_queue;

pub use rate_limiter::*;
pub use work_queue::*;

#[cfg(test)]
mod work_queue_test;
