use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
#[cfg(test)]
use mockall::automock;

use crate::CacheError;
use crate::GatewayObject;
use crate::ObjectKey;

/// Read-through lookup of the latest known object by identity.
#[cfg_attr(test, automock)]
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when the object no longer exists; `Err` for transient
    /// failures that warrant a retry.
    fn get_by_key(
        &self,
        key: &ObjectKey,
    ) -> std::result::Result<Option<GatewayObject>, CacheError>;
}

/// Informer-maintained object cache.
#[derive(Debug, Default)]
pub struct ObjectCache {
    objects: DashMap<ObjectKey, GatewayObject>,
    synced: AtomicBool,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an object, returning the previous version.
    pub fn upsert(
        &self,
        obj: GatewayObject,
    ) -> Option<GatewayObject> {
        self.objects.insert(obj.key.clone(), obj)
    }

    pub fn remove(
        &self,
        key: &ObjectKey,
    ) -> Option<GatewayObject> {
        self.objects.remove(key).map(|(_, obj)| obj)
    }

    pub fn keys(&self) -> Vec<ObjectKey> {
        self.objects.iter().map(|e| e.key().clone()).collect()
    }

    pub fn list(&self) -> Vec<GatewayObject> {
        self.objects.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }

    /// Whether the initial listing has been loaded.
    pub fn has_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }
}

impl ObjectStore for ObjectCache {
    fn get_by_key(
        &self,
        key: &ObjectKey,
    ) -> std::result::Result<Option<GatewayObject>, CacheError> {
        if !self.has_synced() {
            return Err(CacheError::NotSynced);
        }
        Ok(self.objects.get(key).map(|e| e.value().clone()))
    }
}
