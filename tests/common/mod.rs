#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use gateway_status::ControllerConfig;
use gateway_status::EventStream;
use gateway_status::GatewayController;
use gateway_status::GatewayObject;
use gateway_status::ListWatch;
use gateway_status::Result;
use gateway_status::StatusTable;
use gateway_status::WatchEvent;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

/// Watch transport backed by a channel the test writes to.
#[derive(Default)]
pub struct ChannelListWatch {
    objects: Mutex<Vec<GatewayObject>>,
    sender: Mutex<Option<mpsc::UnboundedSender<Result<WatchEvent>>>>,
}

impl ChannelListWatch {
    pub fn new(objects: Vec<GatewayObject>) -> Self {
        Self {
            objects: Mutex::new(objects),
            sender: Mutex::new(None),
        }
    }

    pub fn apply(
        &self,
        obj: GatewayObject,
    ) {
        self.send(WatchEvent::Applied(obj));
    }

    pub fn delete(
        &self,
        obj: GatewayObject,
    ) {
        self.send(WatchEvent::Deleted(obj));
    }

    fn send(
        &self,
        event: WatchEvent,
    ) {
        let sender = self.sender.lock();
        let tx = sender.as_ref().expect("watch not open");
        tx.send(Ok(event)).expect("informer dropped the watch");
    }

    pub async fn wait_for_watch(&self) {
        for _ in 0..1000 {
            if self.sender.lock().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("watch was never opened");
    }
}

#[async_trait]
impl ListWatch for ChannelListWatch {
    async fn list(&self) -> Result<Vec<GatewayObject>> {
        Ok(self.objects.lock().clone())
    }

    async fn watch(&self) -> Result<EventStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock() = Some(tx);
        Ok(futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed())
    }
}

pub fn gateway(
    name: &str,
    ha_status: &str,
    connections: &[(&str, &str)],
) -> GatewayObject {
    let connections: Vec<Value> = connections
        .iter()
        .map(|(status, cluster_id)| json!({ "status": status, "endpoint": { "cluster_id": cluster_id } }))
        .collect();
    GatewayObject::from_body(json!({
        "apiVersion": "submariner.io/v1",
        "kind": "Gateway",
        "metadata": { "namespace": "submariner-operator", "name": name },
        "status": { "haStatus": ha_status, "connections": connections },
    }))
    .expect("valid gateway body")
}

pub async fn start_controller(
    config: ControllerConfig,
    initial: Vec<GatewayObject>,
) -> (
    GatewayController<ChannelListWatch>,
    Arc<ChannelListWatch>,
    Arc<StatusTable>,
) {
    enable_logger();
    let list_watch = Arc::new(ChannelListWatch::new(initial));
    let table = Arc::new(StatusTable::new());
    let mut controller = GatewayController::new(config, table.clone(), list_watch.clone());
    controller.start().await.expect("controller should start");
    list_watch.wait_for_watch().await;
    (controller, list_watch, table)
}

/// Polls `condition` until it holds, failing the test after about a second.
pub async fn eventually<F>(
    what: &str,
    condition: F,
) where
    F: Fn() -> bool,
{
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition never held: {what}");
}
