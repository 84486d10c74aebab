//! Configuration management for the gateway status controller.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation

mod queue;
mod reconcile;
mod retry;
mod watch;

pub use queue::*;
pub use reconcile::*;
pub use retry::*;
pub use watch::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Prefix of the environment variables overriding configuration values,
/// e.g. `GATEWAY__QUEUE__BASE_DELAY_MS=10`.
pub const ENV_PREFIX: &str = "GATEWAY";

/// Main configuration container for the controller components
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ControllerConfig {
    /// Watched resource collection and informer behaviour
    #[serde(default)]
    pub watch: WatchConfig,

    /// Change queue retry behaviour
    #[serde(default)]
    pub queue: QueueConfig,

    /// Reconcile semantics
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Debug for ControllerConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("resource", &self.watch.resource)
            .field("namespace", &self.watch.namespace)
            .field("absent_connection_policy", &self.reconcile.absent_connection_policy)
            .finish_non_exhaustive()
    }
}

impl ControllerConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `GATEWAY__` prefix (highest priority)
    ///
    /// Callers MUST call `validate()` before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("GATEWAY__WATCH__NAMESPACE", "submariner-operator");
    /// let cfg = ControllerConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.watch.validate()?;
        self.queue.validate()?;
        self.reconcile.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
