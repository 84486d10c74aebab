//! Published cluster reachability.
//!
//! The table is a single [`ArcSwap`] slot holding an immutable [`Snapshot`].
//! Readers load the current `Arc` without locking and keep a consistent view
//! for as long as they hold it. The reconciler builds a new snapshot off to the
//! side and swaps it in whole, so no reader ever observes a table under
//! construction.
//!
//! Writes are not synchronised here: the controller runs exactly one
//! reconcile worker, which orders all `store`/`reset` calls.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;

use crate::ObjectKey;


/// Immutable clusterId → reachable mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    clusters: HashMap<String, bool>,
    source: Option<ObjectKey>,
}

impl Snapshot {
    pub fn new(
        clusters: HashMap<String, bool>,
        source: Option<ObjectKey>,
    ) -> Self {
        Self { clusters, source }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` only when the cluster is present and marked reachable.
    pub fn is_reachable(
        &self,
        cluster_id: &str,
    ) -> bool {
        self.clusters.get(cluster_id).copied().unwrap_or(false)
    }

    pub fn contains(
        &self,
        cluster_id: &str,
    ) -> bool {
        self.clusters.contains_key(cluster_id)
    }

    pub fn clusters(&self) -> &HashMap<String, bool> {
        &self.clusters
    }

    /// The active gateway object whose connections produced this snapshot.
    pub fn source(&self) -> Option<&ObjectKey> {
        self.source.as_ref()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Sorted ids of the reachable clusters, mostly for logging.
    pub fn reachable_clusters(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .clusters
            .iter()
            .filter(|(_, reachable)| **reachable)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Synchronous, non-blocking reachability lookup used by consumers such as
/// the DNS answering path.
pub trait ClusterReachability: Send + Sync {
    fn is_reachable(
        &self,
        cluster_id: &str,
    ) -> bool;
}

/// Copy-on-write snapshot store.
#[derive(Debug)]
pub struct StatusTable {
    current: ArcSwap<Snapshot>,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTable {
    /// Creates a table holding the empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// Current snapshot. Never blocks.
    pub fn get(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Atomically replaces the current snapshot.
    pub fn store(
        &self,
        snapshot: Snapshot,
    ) {
        trace!(clusters = snapshot.len(), "storing status table snapshot");
        self.current.store(Arc::new(snapshot));
    }

    /// Publishes the empty snapshot.
    pub fn reset(&self) {
        self.store(Snapshot::empty());
    }
}

impl ClusterReachability for StatusTable {
    fn is_reachable(
        &self,
        cluster_id: &str,
    ) -> bool {
        self.current.load().is_reachable(cluster_id)
    }
}
