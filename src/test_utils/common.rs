use serde_json::json;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::GatewayObject;
use crate::ObjectKey;

pub(crate) const TEST_NAMESPACE: &str = "submariner-operator";

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

pub(crate) fn key(name: &str) -> ObjectKey {
    ObjectKey::new(TEST_NAMESPACE, name)
}

/// Builds a gateway status object with `(status, cluster_id)` connections.
pub(crate) fn gateway(
    name: &str,
    ha_status: &str,
    connections: &[(&str, &str)],
) -> GatewayObject {
    let connections: Vec<Value> = connections
        .iter()
        .map(|(status, cluster_id)| {
            json!({
                "status": status,
                "endpoint": { "cluster_id": cluster_id, "hostname": "gw-node" },
            })
        })
        .collect();
    gateway_with_status(
        name,
        json!({
            "haStatus": ha_status,
            "connections": connections,
        }),
    )
}

pub(crate) fn active_gateway(
    name: &str,
    connections: &[(&str, &str)],
) -> GatewayObject {
    gateway(name, "active", connections)
}

/// Gateway object with an arbitrary (possibly malformed) `status`.
pub(crate) fn gateway_with_status(
    name: &str,
    status: Value,
) -> GatewayObject {
    GatewayObject::new(
        key(name),
        json!({
            "apiVersion": "submariner.io/v1",
            "kind": "Gateway",
            "metadata": { "namespace": TEST_NAMESPACE, "name": name },
            "status": status,
        }),
    )
}

/// Polls `condition` until it holds, failing the test after about a second.
pub(crate) async fn eventually<F>(
    what: &str,
    condition: F,
) where
    F: Fn() -> bool,
{
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    panic!("condition never held: {what}");
}
