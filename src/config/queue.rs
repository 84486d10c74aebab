use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Per-item exponential failure backoff of the change queue
///
/// The n-th consecutive failure of one key is retried after
/// `base_delay_ms * 2^(n-1)`, capped at `max_delay_ms`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::InvalidConfig("queue.base_delay_ms must be greater than 0".into()));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "queue.max_delay_ms ({}) must not be smaller than queue.base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }
}

fn default_base_delay_ms() -> u64 {
    5
}
// 1000 seconds
fn default_max_delay_ms() -> u64 {
    1_000_000
}
