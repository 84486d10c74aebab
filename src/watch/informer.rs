use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use tokio::time::Instant;
use tokio::time::Interval;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::DeletedObject;
use super::EventStream;
use super::ListWatch;
use super::ObjectCache;
use super::ResourceEventHandler;
use super::WatchEvent;
use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::Error;
use crate::GatewayObject;
use crate::ObjectKey;
use crate::Result;
use crate::WatchConfig;
use crate::WatchError;

/// Why a watch stream stopped being consumed.
#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    Cancelled,
    Broken,
}

/// Keeps an [`ObjectCache`] in sync with a [`ListWatch`] and dispatches
/// change callbacks.
pub struct Informer<L: ListWatch> {
    list_watch: Arc<L>,
    cache: Arc<ObjectCache>,
    handler: Arc<dyn ResourceEventHandler>,
    config: WatchConfig,
}

impl<L: ListWatch> std::fmt::Debug for Informer<L> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Informer")
            .field("resource", &self.config.resource)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl<L: ListWatch> Informer<L> {
    pub fn new(
        list_watch: Arc<L>,
        handler: Arc<dyn ResourceEventHandler>,
        config: WatchConfig,
    ) -> Self {
        Self {
            list_watch,
            cache: Arc::new(ObjectCache::new()),
            handler,
            config,
        }
    }

    pub fn cache(&self) -> Arc<ObjectCache> {
        self.cache.clone()
    }

    /// Performs the initial listing and marks the cache as synced.
    ///
    /// Failure here is fatal to the caller: nothing has been delivered yet and
    /// the collection may not exist or may not be accessible.
    pub async fn list_and_sync(&self) -> Result<()> {
        let objects = match tokio::time::timeout(self.config.relist_backoff.timeout(), self.list_watch.list()).await {
            Ok(Ok(objects)) => objects,
            Ok(Err(e)) => {
                return Err(WatchError::ListFailed {
                    resource: self.config.resource.clone(),
                    reason: e.to_string(),
                }
                .into())
            }
            Err(_) => {
                return Err(WatchError::ListFailed {
                    resource: self.config.resource.clone(),
                    reason: format!("timed out after {:?}", self.config.relist_backoff.timeout()),
                }
                .into())
            }
        };

        info!(resource = %self.config.resource, objects = objects.len(), "initial list completed");
        self.replace(objects);
        self.cache.mark_synced();
        Ok(())
    }

    /// Delivery loop. Runs until `cancel` fires or relisting gives up.
    pub async fn run(
        self,
        cancel: CancellationToken,
    ) -> Result<()> {
        loop {
            let opened = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.list_watch.watch() => r,
            };

            match opened {
                Ok(stream) => {
                    if self.consume(stream, &cancel).await == StreamEnd::Cancelled {
                        break;
                    }
                }
                Err(e) => warn!(resource = %self.config.resource, error = %e, "failed to open watch"),
            }

            if !self.relist(&cancel).await? {
                break;
            }
        }

        debug!(resource = %self.config.resource, "informer stopped");
        Ok(())
    }

    async fn consume(
        &self,
        mut stream: EventStream,
        cancel: &CancellationToken,
    ) -> StreamEnd {
        let mut resync = self
            .config
            .resync_period()
            .map(|period| tokio::time::interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return StreamEnd::Cancelled,
                _ = tick(&mut resync) => self.resync(),
                item = stream.next() => match item {
                    Some(Ok(event)) => self.apply(event),
                    Some(Err(e)) => {
                        warn!(resource = %self.config.resource, error = %e, "watch stream error, relisting");
                        return StreamEnd::Broken;
                    }
                    None => {
                        debug!(resource = %self.config.resource, "watch stream closed, relisting");
                        return StreamEnd::Broken;
                    }
                },
            }
        }
    }

    /// Relists with backoff. Returns `Ok(false)` when cancelled.
    async fn relist(
        &self,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let listed = task_with_timeout_and_exponential_backoff(
            "relist",
            || self.list_watch.list(),
            self.config.relist_backoff,
            cancel,
        )
        .await
        .map_err(|e| {
            Error::from(WatchError::ListFailed {
                resource: self.config.resource.clone(),
                reason: e.to_string(),
            })
        })?;

        match listed {
            Some(objects) => {
                debug!(resource = %self.config.resource, objects = objects.len(), "relist completed");
                self.replace(objects);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply(
        &self,
        event: WatchEvent,
    ) {
        let key = match &event {
            WatchEvent::Applied(obj) | WatchEvent::Deleted(obj) => &obj.key,
        };
        if !self.config.includes(key) {
            trace!(gateway = %key, namespace = %self.config.namespace, "event outside watched namespace");
            return;
        }
        match event {
            WatchEvent::Applied(obj) => self.upsert(obj),
            WatchEvent::Deleted(obj) => {
                self.cache.remove(&obj.key);
                trace!(gateway = %obj.key, "object deleted");
                self.handler.on_delete(DeletedObject::Object(obj));
            }
        }
    }

    fn upsert(
        &self,
        obj: GatewayObject,
    ) {
        match self.cache.upsert(obj.clone()) {
            Some(old) => self.handler.on_update(&old, &obj),
            None => self.handler.on_add(&obj),
        }
    }

    /// Makes the cache match a full listing. Objects that vanished are
    /// reported as tombstones carrying their last cached state. Objects
    /// outside the watched namespace are dropped.
    fn replace(
        &self,
        objects: Vec<GatewayObject>,
    ) {
        let objects: Vec<GatewayObject> = objects.into_iter().filter(|o| self.config.includes(&o.key)).collect();
        let listed: HashSet<ObjectKey> = objects.iter().map(|o| o.key.clone()).collect();

        for key in self.cache.keys() {
            if listed.contains(&key) {
                continue;
            }
            let last_known = self.cache.remove(&key);
            debug!(gateway = %key, "object missing from listing, delivering tombstone");
            self.handler.on_delete(DeletedObject::Tombstone { key, last_known });
        }

        for obj in objects {
            self.upsert(obj);
        }
    }

    /// Redelivers every cached object as an add.
    fn resync(&self) {
        let objects = self.cache.list();
        trace!(objects = objects.len(), "resync");
        for obj in &objects {
            self.handler.on_add(obj);
        }
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
