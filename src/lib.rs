//! # gateway-status
//!
//! Tracks which remote clusters of a multi-cluster mesh are reachable through
//! the currently active gateway, and serves that as a lock-free lookup for the
//! service-discovery answering path.
//!
//! ## Data flow
//!
//! ```text
//! ListWatch ─▶ Informer ─▶ WorkQueue ─▶ worker/Reconciler ─▶ StatusTable ◀─ is_reachable()
//! ```
//!
//! - [`Informer`] turns the external list/watch transport into add, update
//!   and delete callbacks and keeps a local [`ObjectCache`].
//! - [`WorkQueue`] coalesces pending object keys and retries transient cache
//!   failures with per-key exponential backoff.
//! - A single worker drains the queue; the [`Reconciler`] derives reachability
//!   from the active gateway's connections and publishes a new [`Snapshot`]
//!   only when something changed.
//! - [`StatusTable`] swaps snapshots atomically; readers never block and never
//!   observe a partially applied update.
//!
//! ## Example
//!
//! ```ignore
//! let table = Arc::new(StatusTable::new());
//! let config = ControllerConfig::new()?.validate()?;
//! let mut controller = GatewayController::new(config, table.clone(), Arc::new(my_list_watch));
//! controller.start().await?;
//!
//! if table.is_reachable("cluster-east") {
//!     // answer with the remote cluster's service IPs
//! }
//!
//! controller.stop();
//! ```

mod config;
mod controller;
mod errors;
mod gateway;
mod queue;
mod reconciler;
mod status_table;
mod utils;
pub mod watch;

pub use config::*;
pub use controller::*;
pub use errors::*;
pub use gateway::*;
pub use queue::*;
pub use reconciler::*;
pub use status_table::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
