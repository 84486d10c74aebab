use dashmap::DashMap;

use crate::GatewayObject;
use crate::ObjectKey;

/// Most recently observed state of every gateway object, kept so that a
/// delete notification without a payload can still be resolved.
#[derive(Debug, Default)]
pub struct LastKnownState {
    objects: DashMap<ObjectKey, GatewayObject>,
}

impl LastKnownState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        obj: &GatewayObject,
    ) {
        self.objects.insert(obj.key.clone(), obj.clone());
    }

    /// Removes and returns the state recorded for `key`.
    pub fn take(
        &self,
        key: &ObjectKey,
    ) -> Option<GatewayObject> {
        self.objects.remove(key).map(|(_, obj)| obj)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
