//! # tagsync-engine
//!
//! Drives tag reconciliation and cursor pagination against remote APIs whose
//! operations are injected by the caller.
//!
//! ## Overview
//!
//! - [`TagSynchronizer`] converges a resource's remote tags onto a desired
//!   set: reserved keys are filtered out, the diff is split into API-sized
//!   batches, removals run before upserts and the first failure aborts.
//! - [`Paginator`] walks a cursor-paged listing lazily until the server stops
//!   returning a next token.
//! - [`retry::Retrying`] adds backoff to injected operations.
//! - [`config::TagSyncConfig`] holds reserved prefixes, per-service batch
//!   profiles and the retry policy.
//!
//! ## Example
//!
//! ```ignore
//! use tagsync_core::TagSet;
//! use tagsync_engine::config::loader::load_config;
//!
//! let config = load_config(None)?;
//! let sync = config.synchronizer_for("kinesis", KinesisTags::new(client))?;
//!
//! let desired = TagSet::new([("env", "prod"), ("team", "streaming")]);
//! sync.update_tags("orders-stream", &desired).await?;
//! ```
//!
//! ## Implementing collaborators
//!
//! ```ignore
//! use async_trait::async_trait;
//! use tagsync_core::{RemoteError, TagSet};
//! use tagsync_engine::TagOperations;
//!
//! struct KinesisTags { /* client */ }
//!
//! #[async_trait]
//! impl TagOperations for KinesisTags {
//!     async fn remove_tags(&self, stream: &str, keys: &[String]) -> Result<(), RemoteError> {
//!         // RemoveTagsFromStream
//!     }
//!     async fn upsert_tags(&self, stream: &str, tags: &TagSet) -> Result<(), RemoteError> {
//!         // AddTagsToStream
//!     }
//! }
//! ```

mod cancel;
pub mod config;
pub mod paginate;
pub mod profile;
pub mod retry;
pub mod sync;
mod traits;

pub use paginate::{PageCursor, Paginator};
pub use profile::ServiceProfile;
pub use sync::{ReconcileSummary, TagSyncOptions, TagSynchronizer, reconcile};
pub use traits::{FnPageFetcher, Page, PageFetcher, TagLister, TagOperations, page_fn};

/// Type alias for a shareable tag operations instance.
pub type DynTagOperations = std::sync::Arc<dyn TagOperations>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tagsync_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::TagSyncConfig;
    pub use crate::paginate::{PageCursor, Paginator};
    pub use crate::retry::{RetryConfig, Retrying};
    pub use crate::sync::{ReconcileSummary, TagSyncOptions, TagSynchronizer, reconcile};
    pub use crate::traits::{Page, PageFetcher, TagLister, TagOperations, page_fn};
    pub use tagsync_core::prelude::*;
}
