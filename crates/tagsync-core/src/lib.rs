//! # tagsync-core
//!
//! Pure building blocks for keeping remote resource tags in sync with a
//! declared configuration.
//!
//! This crate performs no IO. It provides:
//! - [`TagSet`] and wire-shaped [`Tag`] pairs
//! - Reserved-key filtering through [`ReservedKeyPredicate`]
//! - [`diff`], which computes the removals and upserts needed to converge
//! - [`chunks`] and [`BatchLimit`], which split work into API-sized batches
//! - The [`SyncError`] / [`RemoteError`] error model
//!
//! The engine that drives injected remote operations lives in `tagsync-engine`.
//!
//! ## Example
//!
//! ```
//! use tagsync_core::{diff, KeyPrefixes, TagSet};
//!
//! let reserved = KeyPrefixes::new(["aws:"]);
//! let current = TagSet::new([("env", "dev"), ("aws:cloudformation:stack-id", "x")]);
//! let desired = TagSet::new([("env", "prod"), ("team", "platform")]);
//!
//! let d = diff(&current.ignore_reserved(&reserved), &desired.ignore_reserved(&reserved));
//! assert!(d.to_remove.is_empty());
//! assert_eq!(d.to_upsert.len(), 2);
//! ```

mod batch;
mod diff;
mod error;
mod tags;

pub use batch::{BatchLimit, Chunks, chunks};
pub use diff::{TagDiff, diff};
pub use error::{BoxError, ErrorCategory, Phase, RemoteError, RemoteErrorKind, SyncError};
pub use tags::{KeyPrefixes, NoReservedKeys, ReservedKeyPredicate, Tag, TagSet};

/// Type alias for a synchronization result.
pub type SyncResult<T> = Result<T, SyncError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tagsync_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::{BatchLimit, chunks};
    pub use crate::diff::{TagDiff, diff};
    pub use crate::error::{ErrorCategory, Phase, RemoteError, RemoteErrorKind, SyncError};
    pub use crate::tags::{KeyPrefixes, NoReservedKeys, ReservedKeyPredicate, Tag, TagSet};
    pub use crate::SyncResult;
}
