//! Controller lifecycle: wires the informer, the change queue and the single
//! reconcile worker around a shared [`StatusTable`].
//!
//! ```text
//! Created ──start()──▶ Running ──stop()──▶ Stopped
//!    │                    │                   ▲
//!    │             relist gives up            │
//!    │                    ▼                   │
//!    │                 Failed ─────stop()─────┤
//!    └────────────────stop()──────────────────┘
//! ```
//!
//! `start` fails, leaving the controller in `Created`, when the initial
//! listing of the gateway collection cannot be obtained. A running
//! controller becomes `Failed` when the informer exhausts its relist
//! retries; the worker is shut down and the table keeps its last snapshot.
//! `Stopped` is terminal; construct a new controller to run again.

mod handler;
mod worker;

pub(crate) use handler::*;
pub use worker::*;


use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::utils::async_task::spawn_task;
use crate::watch::Informer;
use crate::watch::ListWatch;
use crate::watch::ObjectStore;
use crate::ClusterReachability;
use crate::ControllerConfig;
use crate::LifecycleError;
use crate::Reconciler;
use crate::Result;
use crate::StatusTable;
use crate::WorkQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Created,
    Running,
    /// The informer stopped delivering; see [`GatewayController::failure`]
    Failed,
    Stopped,
}

/// Watches gateway status objects and keeps a [`StatusTable`] current.
pub struct GatewayController<L: ListWatch> {
    config: ControllerConfig,
    list_watch: Arc<L>,
    table: Arc<StatusTable>,
    queue: WorkQueue<WorkItem>,
    reconciler: Arc<Reconciler>,
    cancel: CancellationToken,
    state: ControllerState,
    failure: Arc<Mutex<Option<String>>>,
    handles: Vec<JoinHandle<()>>,
}

impl<L: ListWatch> std::fmt::Debug for GatewayController<L> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("GatewayController")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl<L: ListWatch> GatewayController<L> {
    /// `table` is owned by the hosting process and may be shared with readers
    /// before the controller starts.
    pub fn new(
        config: ControllerConfig,
        table: Arc<StatusTable>,
        list_watch: Arc<L>,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(table.clone(), &config.reconcile));
        Self {
            queue: WorkQueue::from_config(&config.queue),
            config,
            list_watch,
            table,
            reconciler,
            cancel: CancellationToken::new(),
            state: ControllerState::Created,
            failure: Arc::new(Mutex::new(None)),
            handles: Vec::new(),
        }
    }

    /// Lists the gateway collection, then spawns the informer delivery loop
    /// and the reconcile worker.
    ///
    /// # Errors
    /// - `LifecycleError` if the controller is not in `Created`
    /// - `WatchError::ListFailed` if the initial listing fails
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            ControllerState::Created => {}
            ControllerState::Running | ControllerState::Failed => {
                return Err(LifecycleError::AlreadyStarted.into())
            }
            ControllerState::Stopped => return Err(LifecycleError::Stopped.into()),
        }
        info!(resource = %self.config.watch.resource, "Starting gateway status controller");

        let handler = Arc::new(GatewayEventHandler::new(self.queue.clone(), self.reconciler.clone()));
        let informer = Informer::new(self.list_watch.clone(), handler, self.config.watch.clone());
        informer.list_and_sync().await?;

        let store: Arc<dyn ObjectStore> = informer.cache();
        let cancel = self.cancel.child_token();
        let failure = self.failure.clone();
        let worker_queue = self.queue.clone();
        self.handles.push(spawn_task("gateway informer", async move {
            let result = informer.run(cancel).await;
            if let Err(e) = &result {
                error!(error = %e, "gateway informer gave up, status table is no longer updated");
                *failure.lock() = Some(e.to_string());
                worker_queue.shut_down();
            }
            result
        }));

        let queue = self.queue.clone();
        let reconciler = self.reconciler.clone();
        self.handles.push(spawn_task("gateway status worker", async move {
            run_worker(queue, store, reconciler).await;
            Ok(())
        }));

        self.state = ControllerState::Running;
        Ok(())
    }

    /// Signals the informer and the worker to exit. Does not wait for them;
    /// see [`GatewayController::join`]. Idempotent.
    pub fn stop(&mut self) {
        if self.state == ControllerState::Stopped {
            return;
        }
        self.cancel.cancel();
        self.queue.shut_down();
        self.state = ControllerState::Stopped;
        info!("Gateway status controller stopped");
    }

    /// Waits for the spawned tasks to finish after [`GatewayController::stop`].
    pub async fn join(&mut self) {
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "controller task did not finish cleanly");
            }
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.state == ControllerState::Running && self.failure.lock().is_some() {
            return ControllerState::Failed;
        }
        self.state
    }

    /// Why the controller entered [`ControllerState::Failed`].
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    pub fn status_table(&self) -> Arc<StatusTable> {
        self.table.clone()
    }

    pub fn is_cluster_reachable(
        &self,
        cluster_id: &str,
    ) -> bool {
        self.table.is_reachable(cluster_id)
    }
}

impl<L: ListWatch> ClusterReachability for GatewayController<L> {
    fn is_reachable(
        &self,
        cluster_id: &str,
    ) -> bool {
        self.is_cluster_reachable(cluster_id)
    }
}

impl<L: ListWatch> Drop for GatewayController<L> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.queue.shut_down();
    }
}
