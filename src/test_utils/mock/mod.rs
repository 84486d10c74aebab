use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::watch::DeletedObject;
use crate::watch::EventStream;
use crate::watch::ListWatch;
use crate::watch::ResourceEventHandler;
use crate::watch::WatchEvent;
use crate::Error;
use crate::GatewayObject;
use crate::ObjectKey;
use crate::Result;
use crate::WatchError;

/// In-memory list/watch transport driven by the test.
#[derive(Default)]
pub(crate) struct FakeListWatch {
    objects: Mutex<Vec<GatewayObject>>,
    sender: Mutex<Option<mpsc::UnboundedSender<Result<WatchEvent>>>>,
    failing_lists: AtomicUsize,
    list_calls: AtomicUsize,
    watch_calls: AtomicUsize,
}

impl FakeListWatch {
    pub(crate) fn new(objects: Vec<GatewayObject>) -> Self {
        Self {
            objects: Mutex::new(objects),
            ..Default::default()
        }
    }

    /// Contents returned by subsequent `list` calls.
    pub(crate) fn set_objects(
        &self,
        objects: Vec<GatewayObject>,
    ) {
        *self.objects.lock() = objects;
    }

    /// Makes the next `n` `list` calls fail.
    pub(crate) fn fail_next_lists(
        &self,
        n: usize,
    ) {
        self.failing_lists.store(n, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    /// Pushes an event on the open watch stream.
    pub(crate) fn send(
        &self,
        event: WatchEvent,
    ) -> bool {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.send(Ok(event)).is_ok(),
            None => false,
        }
    }

    /// Ends the open watch stream with an error.
    pub(crate) fn break_watch(&self) {
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(Err(WatchError::StreamError("connection reset".into()).into()));
        }
    }

    /// Waits until the informer has opened `n` watch streams in total.
    pub(crate) async fn wait_for_watch(
        &self,
        n: usize,
    ) {
        for _ in 0..1000 {
            if self.watch_calls() >= n && self.sender.lock().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("watch #{n} was never opened");
    }
}

#[async_trait]
impl ListWatch for FakeListWatch {
    async fn list(&self) -> Result<Vec<GatewayObject>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_lists.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_lists.store(failing - 1, Ordering::SeqCst);
            return Err(Error::Fatal("apiserver unavailable".to_string()));
        }
        Ok(self.objects.lock().clone())
    }

    async fn watch(&self) -> Result<EventStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock() = Some(tx);
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        let stream = futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });
        Ok(stream.boxed())
    }
}

/// Callback observed by [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Add(ObjectKey),
    Update(ObjectKey),
    Delete(DeletedObject),
}

#[derive(Default)]
pub(crate) struct RecordingHandler {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingHandler {
    pub(crate) fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    pub(crate) fn take(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl ResourceEventHandler for RecordingHandler {
    fn on_add(
        &self,
        obj: &GatewayObject,
    ) {
        self.events.lock().push(Recorded::Add(obj.key.clone()));
    }

    fn on_update(
        &self,
        _old: &GatewayObject,
        new: &GatewayObject,
    ) {
        self.events.lock().push(Recorded::Update(new.key.clone()));
    }

    fn on_delete(
        &self,
        obj: DeletedObject,
    ) {
        self.events.lock().push(Recorded::Delete(obj));
    }
}
