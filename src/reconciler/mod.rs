//! Derives cluster reachability from the active gateway's status.
//!
//! A reconcile pass reads one gateway object and compares each of its
//! connection entries with the published [`Snapshot`]. The snapshot is copied
//! only when the first real change is found; an unchanged object publishes
//! nothing, so redelivered notifications are free.
//!
//! Only an object reporting `haStatus: active` is authoritative. Passive or
//! unknown instances, and objects whose status cannot be read, never touch the
//! table.
//!
//! [`Snapshot`]: crate::Snapshot

mod last_known;

pub use last_known::*;


use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::gateway::ha_status;
use crate::watch::DeletedObject;
use crate::AbsentConnectionPolicy;
use crate::Connection;
use crate::GatewayObject;
use crate::GatewayStatus;
use crate::ObjectKey;
use crate::ReconcileConfig;
use crate::Snapshot;
use crate::StatusTable;

/// Result of one reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The object is not the active gateway instance
    Inactive,
    /// `haStatus` or `connections` could not be read
    Malformed,
    /// Nothing to publish
    Unchanged,
    /// A new snapshot was published
    Published { added: usize, removed: usize },
}

pub struct Reconciler {
    table: Arc<StatusTable>,
    last_known: LastKnownState,
    absent_policy: AbsentConnectionPolicy,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("tracked", &self.last_known.len())
            .field("absent_policy", &self.absent_policy)
            .finish()
    }
}

impl Reconciler {
    pub fn new(
        table: Arc<StatusTable>,
        config: &ReconcileConfig,
    ) -> Self {
        Self {
            table,
            last_known: LastKnownState::new(),
            absent_policy: config.absent_connection_policy,
        }
    }

    pub fn table(&self) -> &Arc<StatusTable> {
        &self.table
    }

    /// Records the latest observed state of an object.
    pub fn observe(
        &self,
        obj: &GatewayObject,
    ) {
        self.last_known.record(obj);
    }

    /// Resolves a delete notification to the object's final known state and
    /// reports whether that state was the active gateway.
    ///
    /// The last-known entry is consumed: it is consulted exactly once.
    pub fn deleted_was_active(
        &self,
        deleted: DeletedObject,
    ) -> bool {
        let key = deleted.key().clone();
        let remembered = self.last_known.take(&key);
        let Some(last) = deleted.into_object().or(remembered) else {
            warn!(gateway = %key, "no last known state for deleted gateway");
            return false;
        };

        match ha_status(&last) {
            Ok(status) if status.is_active() => true,
            Ok(status) => {
                debug!(gateway = %key, ha_status = %status, "non-active gateway deleted, table untouched");
                false
            }
            Err(e) => {
                warn!(gateway = %key, error = %e, "haStatus unavailable on deleted gateway");
                false
            }
        }
    }

    /// Clears the table after the active gateway `key` went away. No remote
    /// cluster is assumed reachable until a new active gateway reports in.
    ///
    /// Only a table published by `key` itself is cleared: once another
    /// gateway object has taken over, its snapshot is left alone. Returns
    /// whether the table was reset.
    pub fn reset(
        &self,
        key: &ObjectKey,
    ) -> bool {
        match self.table.get().source() {
            Some(source) if source == key => {}
            Some(source) => {
                trace!(gateway = %key, current = %source, "table owned by another gateway, reset skipped");
                return false;
            }
            None => {
                trace!(gateway = %key, "table already empty, reset skipped");
                return false;
            }
        }
        self.table.reset();
        info!(gateway = %key, "active gateway deleted, cleared cluster reachability");
        true
    }

    /// Applies one gateway object to the status table.
    pub fn reconcile(
        &self,
        obj: &GatewayObject,
    ) -> ReconcileOutcome {
        let key = &obj.key;
        match ha_status(obj) {
            Ok(status) if status.is_active() => {}
            Ok(status) => {
                trace!(gateway = %key, ha_status = %status, "ignoring non-active gateway");
                return ReconcileOutcome::Inactive;
            }
            Err(e) => {
                warn!(gateway = %key, error = %e, "haStatus unavailable, skipping gateway");
                return ReconcileOutcome::Malformed;
            }
        }

        let status = match GatewayStatus::extract(obj) {
            Ok(status) => status,
            Err(e) => {
                warn!(gateway = %key, error = %e, "connections unavailable, skipping gateway");
                return ReconcileOutcome::Malformed;
            }
        };

        let current = self.table.get();
        // Another gateway object produced the current table: start over
        // instead of merging its entries.
        let takeover = current.source().is_some_and(|source| source != key);
        let empty = HashMap::new();
        let base = if takeover { &empty } else { current.clusters() };

        let mut working: Option<HashMap<String, bool>> = takeover.then(HashMap::new);
        let mut seen: HashSet<String> = HashSet::new();
        let mut added = 0;
        let mut removed = 0;

        for (index, entry) in status.connections.iter().enumerate() {
            let connection = match Connection::extract(entry) {
                Ok(c) => c,
                Err(e) => {
                    warn!(gateway = %key, index, error = %e, "skipping malformed connection entry");
                    continue;
                }
            };

            let present = working
                .as_ref()
                .map_or_else(|| base.contains_key(&connection.cluster_id), |w| {
                    w.contains_key(&connection.cluster_id)
                });

            if connection.status.is_connected() {
                if !present {
                    working
                        .get_or_insert_with(|| base.clone())
                        .insert(connection.cluster_id.clone(), true);
                    added += 1;
                }
            } else if present {
                working.get_or_insert_with(|| base.clone()).remove(&connection.cluster_id);
                removed += 1;
            }
            seen.insert(connection.cluster_id);
        }

        if self.absent_policy == AbsentConnectionPolicy::Prune {
            let stale: Vec<String> = working
                .as_ref()
                .unwrap_or(base)
                .keys()
                .filter(|id| !seen.contains(*id))
                .cloned()
                .collect();
            if !stale.is_empty() {
                let table = working.get_or_insert_with(|| base.clone());
                for id in stale {
                    debug!(gateway = %key, cluster = %id, "cluster no longer listed, pruning");
                    table.remove(&id);
                    removed += 1;
                }
            }
        }

        let Some(clusters) = working else {
            trace!(gateway = %key, "no reachability change");
            return ReconcileOutcome::Unchanged;
        };

        let snapshot = Snapshot::new(clusters, Some(key.clone()));
        info!(
            gateway = %key,
            added,
            removed,
            reachable = ?snapshot.reachable_clusters(),
            "updating the gateway status table"
        );
        self.table.store(snapshot);
        ReconcileOutcome::Published { added, removed }
    }
}
