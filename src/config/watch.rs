use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::BackoffPolicy;
use crate::Error;
use crate::ObjectKey;
use crate::Result;

/// Settings of the watched gateway resource collection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Resource collection in `resource.version.group` form
    #[serde(default = "default_resource")]
    pub resource: String,

    /// Namespace to watch; empty means all namespaces
    #[serde(default)]
    pub namespace: String,

    /// Period of full cache redelivery in milliseconds (0 disables resync)
    #[serde(default)]
    pub resync_period_ms: u64,

    /// Backoff applied while re-establishing a broken watch
    #[serde(default)]
    pub relist_backoff: BackoffPolicy,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            resource: default_resource(),
            namespace: String::new(),
            resync_period_ms: 0,
            relist_backoff: BackoffPolicy::default(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resource.trim().is_empty() {
            return Err(Error::InvalidConfig("watch.resource cannot be empty".into()));
        }
        self.relist_backoff.validate()
    }

    /// Whether an object with `key` belongs to the watched namespace.
    pub fn includes(
        &self,
        key: &ObjectKey,
    ) -> bool {
        self.namespace.is_empty() || key.namespace == self.namespace
    }

    pub fn resync_period(&self) -> Option<Duration> {
        (self.resync_period_ms > 0).then(|| Duration::from_millis(self.resync_period_ms))
    }
}

fn default_resource() -> String {
    "gateways.v1.submariner.io".to_string()
}
