use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// How a cluster id that disappears from the active gateway's connection
/// list is treated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AbsentConnectionPolicy {
    /// Keep the previously published reachability until the gateway reports
    /// the cluster explicitly as not connected.
    #[default]
    Retain,

    /// Drop every cluster id the active gateway no longer lists.
    Prune,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub absent_connection_policy: AbsentConnectionPolicy,
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}
