//! Gateway Status Controller Error Hierarchy
//!
//! Errors are grouped by the layer that raises them: configuration, the
//! watch transport, the local object cache and the controller lifecycle.
//! Field-level extraction failures have their own type because they are
//! logged and skipped, never propagated out of a reconcile pass.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Failures of the list/watch transport
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Local object cache lookup failures
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Illegal controller state transitions
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A single attempt exceeded its deadline
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Retry policy exhausted; carries the last failure
    #[error("Task {task} failed after {attempts} attempts: {last}")]
    RetryExhausted {
        task: String,
        attempts: usize,
        last: Box<Error>,
    },

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Listing the resource collection failed
    #[error("Failed to list {resource}: {reason}")]
    ListFailed { resource: String, reason: String },

    /// Opening the watch stream failed
    #[error("Failed to watch {resource}: {reason}")]
    WatchFailed { resource: String, reason: String },

    /// The watch stream yielded an error item
    #[error("Watch stream error: {0}")]
    StreamError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The cache has not completed its initial listing yet
    #[error("Object cache has not synced yet")]
    NotSynced,

    /// Transient lookup failure reported by a cache implementation
    #[error("Object cache lookup failed: {0}")]
    Lookup(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Controller is already running")]
    AlreadyStarted,

    /// A stopped controller cannot be restarted; construct a new one
    #[error("Controller has been stopped")]
    Stopped,
}

/// Best-effort field extraction failure on a loosely-typed object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("field `{0}` not found")]
    MissingField(&'static str),

    #[error("field `{field}` has unexpected type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}
