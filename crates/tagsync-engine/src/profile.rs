//! Batch-limit shapes of remote tagging APIs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tagsync_core::{BatchLimit, SyncError};

use crate::sync::TagSyncOptions;

/// How one service's tagging API accepts keys and pairs.
///
/// A missing size means the API takes any number of items per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProfile {
    /// Maximum keys per removal call.
    pub remove_batch_size: Option<usize>,
    /// Maximum pairs per upsert call.
    pub upsert_batch_size: Option<usize>,
}

impl ServiceProfile {
    /// A profile that sends everything in one call per operation.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A profile with the same limit for both operations.
    #[must_use]
    pub fn limited(max_batch_size: usize) -> Self {
        Self {
            remove_batch_size: Some(max_batch_size),
            upsert_batch_size: Some(max_batch_size),
        }
    }

    /// Fills the sizes this profile leaves unset from `fallback`.
    #[must_use]
    pub fn or(self, fallback: ServiceProfile) -> Self {
        Self {
            remove_batch_size: self.remove_batch_size.or(fallback.remove_batch_size),
            upsert_batch_size: self.upsert_batch_size.or(fallback.upsert_batch_size),
        }
    }

    /// Converts the profile into synchronizer options.
    #[must_use]
    pub fn options(&self) -> TagSyncOptions {
        TagSyncOptions {
            remove_batch_limit: BatchLimit::from_size(self.remove_batch_size),
            upsert_batch_limit: BatchLimit::from_size(self.upsert_batch_size),
        }
    }

    /// Checks that neither limit is zero.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` naming the offending service.
    pub fn validate(&self, service: &str) -> Result<(), SyncError> {
        self.options().validate().map_err(|_| {
            SyncError::invalid_configuration(format!(
                "services.{service}: batch sizes must be at least 1"
            ))
        })
    }

    /// Built-in profiles for services with well-known tagging call shapes.
    #[must_use]
    pub fn builtin() -> HashMap<String, ServiceProfile> {
        HashMap::from([
            // AddTagsToStream / RemoveTagsFromStream take at most 10 per call
            ("kinesis".to_string(), Self::limited(10)),
            ("rds".to_string(), Self::unbounded()),
            ("quicksight".to_string(), Self::unbounded()),
            ("cloudfront".to_string(), Self::unbounded()),
        ])
    }
}
