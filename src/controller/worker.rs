use std::fmt;
use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;

use crate::watch::ObjectStore;
use crate::ObjectKey;
use crate::Reconciler;
use crate::WorkQueue;

/// Unit of work drained by the reconcile worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkItem {
    /// Re-read the object from the cache and reconcile it
    Reconcile(ObjectKey),
    /// The active gateway object was deleted; clear the table
    Reset(ObjectKey),
}

impl fmt::Display for WorkItem {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            WorkItem::Reconcile(key) => write!(f, "reconcile {key}"),
            WorkItem::Reset(key) => write!(f, "reset {key}"),
        }
    }
}

/// Drains the queue until it is shut down.
///
/// Exactly one worker runs per controller, which makes it the only writer of
/// the status table.
pub async fn run_worker(
    queue: WorkQueue<WorkItem>,
    store: Arc<dyn ObjectStore>,
    reconciler: Arc<Reconciler>,
) {
    while process_next_item(&queue, store.as_ref(), &reconciler).await {}
    info!("Watcher for Gateways stopped");
}

/// Processes one item. Returns `false` once the queue has shut down.
pub async fn process_next_item(
    queue: &WorkQueue<WorkItem>,
    store: &dyn ObjectStore,
    reconciler: &Reconciler,
) -> bool {
    let Some(item) = queue.get().await else {
        return false;
    };

    match &item {
        WorkItem::Reconcile(key) => match store.get_by_key(key) {
            Ok(Some(obj)) => {
                let outcome = reconciler.reconcile(&obj);
                debug!(gateway = %key, ?outcome, "reconciled");
                queue.forget(&item);
            }
            Ok(None) => {
                // Deletions arrive through the delete notification
                debug!(gateway = %key, "gateway no longer in cache");
                queue.forget(&item);
            }
            Err(e) => {
                error!(gateway = %key, error = %e, "Error retrieving gateway from the cache");
                queue.add_rate_limited(item.clone());
            }
        },
        WorkItem::Reset(key) => {
            reconciler.reset(key);
            // Re-created under the same key: its reconcile may already have
            // run ahead of this reset
            if !matches!(store.get_by_key(key), Ok(None)) {
                debug!(gateway = %key, "gateway present again after deletion, reconciling");
                queue.add(WorkItem::Reconcile(key.clone()));
            }
            queue.forget(&item);
        }
    }

    queue.done(&item);
    true
}
