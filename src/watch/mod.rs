//! Watch source contract and the in-process informer.
//!
//! The transport that lists and watches gateway objects is external and is
//! consumed through [`ListWatch`]. The [`Informer`] turns its raw events into
//! add/update/delete callbacks on a [`ResourceEventHandler`] and keeps an
//! [`ObjectCache`] that reconcile workers read by [`ObjectKey`].
//!
//! ```text
//! ListWatch ──list/watch──▶ Informer ──upsert/remove──▶ ObjectCache
//!                              │                            ▲
//!                              │ on_add/on_update/on_delete │ get_by_key
//!                              ▼                            │
//!                     ResourceEventHandler ──▶ queue ──▶ worker
//! ```
//!
//! Delivery is at-least-once: a broken watch is re-established by relisting,
//! which redelivers updates for every surviving object and tombstones for
//! objects that disappeared while disconnected. Consumers must be idempotent.
//!
//! [`ObjectKey`]: crate::ObjectKey

mod cache;
mod informer;

pub use cache::*;
pub use informer::*;

#[cfg(test)]
mod cache_test;

use async_trait::async_trait;
use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;

use crate::GatewayObject;
use crate::ObjectKey;
use crate::Result;

/// Raw events produced by the watch transport.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Object created or modified
    Applied(GatewayObject),
    /// Object removed; carries its final observed state
    Deleted(GatewayObject),
}

pub type EventStream = BoxStream<'static, Result<WatchEvent>>;

/// External list/watch transport for the gateway resource collection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ListWatch: Send + Sync + 'static {
    /// Full listing of the collection.
    async fn list(&self) -> Result<Vec<GatewayObject>>;

    /// Change stream starting after the last listing.
    async fn watch(&self) -> Result<EventStream>;
}

/// Payload of a delete notification.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletedObject {
    /// The deleted object itself
    Object(GatewayObject),
    /// The deletion was inferred (e.g. missed while the watch was down); the
    /// final state may be unknown.
    Tombstone {
        key: ObjectKey,
        last_known: Option<GatewayObject>,
    },
}

impl DeletedObject {
    pub fn key(&self) -> &ObjectKey {
        match self {
            DeletedObject::Object(obj) => &obj.key,
            DeletedObject::Tombstone { key, .. } => key,
        }
    }

    /// The object payload, when the notification carries one.
    pub fn into_object(self) -> Option<GatewayObject> {
        match self {
            DeletedObject::Object(obj) => Some(obj),
            DeletedObject::Tombstone { last_known, .. } => last_known,
        }
    }
}

/// Callbacks invoked on the informer's task, in event order.
pub trait ResourceEventHandler: Send + Sync {
    fn on_add(
        &self,
        obj: &GatewayObject,
    );

    fn on_update(
        &self,
        old: &GatewayObject,
        new: &GatewayObject,
    );

    fn on_delete(
        &self,
        obj: DeletedObject,
    );
}
