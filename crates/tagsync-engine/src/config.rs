//! Configuration for tag synchronization call sites.
//!
//! Loaded from an optional TOML file plus `TAGSYNC__`-prefixed environment
//! overrides, e.g. `TAGSYNC__SERVICES__KINESIS__REMOVE_BATCH_SIZE=5`.
//!
//! ```toml
//! reserved_key_prefixes = ["aws:"]
//!
//! [services.efs]
//! remove_batch_size = 50
//! upsert_batch_size = 50
//!
//! [retry]
//! max_retries = 5
//! base_delay = 200
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tagsync_core::{KeyPrefixes, SyncError};

use crate::profile::ServiceProfile;
use crate::retry::{RetryConfig, Retrying};
use crate::sync::{TagSyncOptions, TagSynchronizer};

/// Prefix reserved by the provider for keys it manages itself.
pub const DEFAULT_RESERVED_PREFIX: &str = "aws:";

/// Settings shared by every synchronizer built at one call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSyncConfig {
    /// Keys starting with any of these prefixes are never reconciled.
    pub reserved_key_prefixes: Vec<String>,
    /// Per-service batch limits. Sizes set here override the built-in
    /// profile one field at a time.
    pub services: HashMap<String, ServiceProfile>,
    /// Retry policy for injected remote operations.
    pub retry: RetryConfig,
}

impl Default for TagSyncConfig {
    fn default() -> Self {
        Self {
            reserved_key_prefixes: vec![DEFAULT_RESERVED_PREFIX.to_string()],
            services: ServiceProfile::builtin(),
            retry: RetryConfig::default(),
        }
    }
}

impl TagSyncConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` describing the first problem.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.reserved_key_prefixes.iter().any(String::is_empty) {
            return Err(SyncError::invalid_configuration(
                "reserved_key_prefixes must not contain empty prefixes",
            ));
        }
        for (name, profile) in &self.services {
            profile.validate(name)?;
        }
        self.retry.validate()
    }

    /// Completes configured profiles from the built-in ones.
    ///
    /// A service the configuration did not mention gets its built-in profile.
    /// A mentioned service keeps the sizes it set and inherits the others.
    pub fn merge_builtin_services(&mut self) {
        for (name, builtin) in ServiceProfile::builtin() {
            self.services
                .entry(name)
                .and_modify(|configured| *configured = configured.or(builtin))
                .or_insert(builtin);
        }
    }

    /// Reserved-key predicate built from the configured prefixes.
    #[must_use]
    pub fn reserved_predicate(&self) -> KeyPrefixes {
        KeyPrefixes::new(self.reserved_key_prefixes.iter().cloned())
    }

    /// Synchronizer options for `service`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` for an unknown service.
    pub fn options_for(&self, service: &str) -> Result<TagSyncOptions, SyncError> {
        self.services
            .get(service)
            .map(ServiceProfile::options)
            .ok_or_else(|| {
                SyncError::invalid_configuration(format!("unknown service profile: {service}"))
            })
    }

    /// Builds a synchronizer for `service` around `ops`, with this
    /// configuration's reserved prefixes and retry policy applied.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` for an unknown service.
    pub fn synchronizer_for<O>(
        &self,
        service: &str,
        ops: O,
    ) -> Result<TagSynchronizer<Retrying<O>>, SyncError> {
        let options = self.options_for(service)?;
        Ok(
            TagSynchronizer::new(Retrying::new(ops, self.retry.clone()), options)
                .with_reserved_keys(self.reserved_predicate()),
        )
    }
}

/// Reads [`TagSyncConfig`] from a TOML file and `TAGSYNC__` environment variables.
pub mod loader {
    use std::path::Path;

    use config::{Config, Environment, File};
    use tagsync_core::SyncError;
    use tracing::debug;

    use super::TagSyncConfig;

    /// Default file looked up when no path is given.
    pub const DEFAULT_CONFIG_FILE: &str = "tagsync.toml";

    /// Loads configuration from `path` (or `tagsync.toml`), then the environment.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` if the sources cannot be
    /// parsed or the merged result fails validation.
    pub fn load_config(path: Option<&Path>) -> Result<TagSyncConfig, SyncError> {
        let mut builder = Config::builder();
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if file.exists() {
            debug!(path = %file.display(), "Loading tagsync configuration file");
            builder = builder.add_source(File::from(file));
        }
        // Environment variable overrides, e.g., TAGSYNC__RETRY__MAX_RETRIES=5
        builder = builder.add_source(
            Environment::with_prefix("TAGSYNC")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("reserved_key_prefixes"),
        );
        let cfg = builder.build().map_err(|e| {
            SyncError::invalid_configuration(format!("config build error: {e}"))
        })?;
        let mut merged: TagSyncConfig = cfg.try_deserialize().map_err(|e| {
            SyncError::invalid_configuration(format!("config deserialize error: {e}"))
        })?;
        merged.merge_builtin_services();
        merged.validate()?;
        Ok(merged)
    }
}
