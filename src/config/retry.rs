use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Exponential backoff policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts (0 means unlimited)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single attempt timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_ms: default_op_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl BackoffPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::InvalidConfig("backoff base_delay_ms must be greater than 0".into()));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "backoff max_delay_ms ({}) must not be smaller than base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig("backoff timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }

    /// Delay before attempt number `attempt + 1`, doubling from the base and
    /// capped at the maximum.
    pub fn delay_for(
        &self,
        attempt: u32,
    ) -> Duration {
        exponential_delay(self.base_delay_ms, self.max_delay_ms, attempt)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `base * 2^exp` milliseconds, saturating, capped at `max`.
pub(crate) fn exponential_delay(
    base_ms: u64,
    max_ms: u64,
    exp: u32,
) -> Duration {
    let factor = 1u64.checked_shl(exp.min(63)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

fn default_max_retries() -> usize {
    0
}
fn default_op_timeout_ms() -> u64 {
    10_000
}
fn default_base_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    30_000
}
