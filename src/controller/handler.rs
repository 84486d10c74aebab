use std::sync::Arc;

use tracing::debug;
use tracing::trace;

use super::WorkItem;
use crate::watch::DeletedObject;
use crate::watch::ResourceEventHandler;
use crate::GatewayObject;
use crate::Reconciler;
use crate::WorkQueue;

/// Informer callbacks of the controller.
///
/// Adds and updates only enqueue the object's key; the worker reads the
/// current object from the cache when it gets to it. Deletions are resolved
/// here, while the final state is still at hand, and only a confirmed active
/// deletion is handed to the worker as a table reset.
pub(crate) struct GatewayEventHandler {
    queue: WorkQueue<WorkItem>,
    reconciler: Arc<Reconciler>,
}

impl GatewayEventHandler {
    pub(crate) fn new(
        queue: WorkQueue<WorkItem>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self { queue, reconciler }
    }
}

impl ResourceEventHandler for GatewayEventHandler {
    fn on_add(
        &self,
        obj: &GatewayObject,
    ) {
        trace!(gateway = %obj.key, "GatewayStatus added");
        self.reconciler.observe(obj);
        self.queue.add(WorkItem::Reconcile(obj.key.clone()));
    }

    fn on_update(
        &self,
        old: &GatewayObject,
        new: &GatewayObject,
    ) {
        if old == new {
            trace!(gateway = %new.key, "GatewayStatus update without changes");
        } else {
            debug!(gateway = %new.key, "GatewayStatus updated");
        }
        self.reconciler.observe(new);
        self.queue.add(WorkItem::Reconcile(new.key.clone()));
    }

    fn on_delete(
        &self,
        obj: DeletedObject,
    ) {
        let key = obj.key().clone();
        debug!(gateway = %key, "GatewayStatus deleted");
        if self.reconciler.deleted_was_active(obj) {
            self.queue.add(WorkItem::Reset(key));
        }
    }
}
