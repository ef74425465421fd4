//! Tag reconciliation against injected remote operations.
//!
//! Reconciliation filters reserved keys out of both sides, diffs them, then
//! issues removals followed by upserts. Calls are strictly sequential and the
//! first failure aborts everything after it. No call is retried here; retries
//! belong to the injected operations (see [`crate::retry`]).

use std::sync::Arc;

use tagsync_core::{
    BatchLimit, NoReservedKeys, Phase, RemoteError, ReservedKeyPredicate, SyncError, TagDiff,
    TagSet, diff,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::run_step;
use crate::traits::{TagLister, TagOperations};

/// Per-operation batch limits for one remote tagging API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagSyncOptions {
    /// Maximum keys per removal call.
    pub remove_batch_limit: BatchLimit,
    /// Maximum pairs per upsert call.
    pub upsert_batch_limit: BatchLimit,
}

impl TagSyncOptions {
    /// Uses the same batch size for both operations.
    #[must_use]
    pub fn with_batch_size(max_batch_size: usize) -> Self {
        Self {
            remove_batch_limit: BatchLimit::Limited(max_batch_size),
            upsert_batch_limit: BatchLimit::Limited(max_batch_size),
        }
    }

    /// Checks both limits.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` if either limit is zero.
    pub fn validate(&self) -> Result<(), SyncError> {
        self.remove_batch_limit.validate()?;
        self.upsert_batch_limit.validate()
    }
}

/// What a successful reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Keys removed from the remote resource.
    pub removed: Vec<String>,
    /// Keys added or overwritten on the remote resource.
    pub upserted: Vec<String>,
    /// Number of remote calls issued.
    pub calls: usize,
}

impl ReconcileSummary {
    /// Returns `true` if the resource was already converged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.calls == 0
    }
}

/// Converges remote tags onto a desired set using injected operations.
///
/// # Example
///
/// ```ignore
/// use tagsync_core::KeyPrefixes;
/// use tagsync_engine::{TagSynchronizer, TagSyncOptions};
///
/// let sync = TagSynchronizer::new(kinesis_tags, TagSyncOptions::with_batch_size(10))
///     .with_reserved_keys(KeyPrefixes::new(["aws:"]));
///
/// sync.update_tags(&stream_name, &desired).await?;
/// ```
pub struct TagSynchronizer<O> {
    ops: O,
    options: TagSyncOptions,
    reserved: Arc<dyn ReservedKeyPredicate>,
    cancel: Option<CancellationToken>,
}

impl<O> TagSynchronizer<O> {
    /// Creates a synchronizer that treats every key as user-managed.
    pub fn new(ops: O, options: TagSyncOptions) -> Self {
        Self {
            ops,
            options,
            reserved: Arc::new(NoReservedKeys),
            cancel: None,
        }
    }

    /// Sets the reserved-key policy applied to both sides before diffing.
    #[must_use]
    pub fn with_reserved_keys(mut self, predicate: impl ReservedKeyPredicate + 'static) -> Self {
        self.reserved = Arc::new(predicate);
        self
    }

    /// Attaches a cancellation token checked around every remote call.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Get a reference to the injected operations.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Get the configured batch limits.
    pub fn options(&self) -> &TagSyncOptions {
        &self.options
    }
}

impl<O: TagOperations> TagSynchronizer<O> {
    /// Reconciles `identifier` from `current` to `desired`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` before any remote call if a
    /// batch limit is zero, otherwise the first remote failure tagged with its
    /// phase and identifier.
    pub async fn reconcile(
        &self,
        identifier: &str,
        current: &TagSet,
        desired: &TagSet,
    ) -> Result<ReconcileSummary, SyncError> {
        let current = current.ignore_reserved(self.reserved.as_ref());
        let desired = desired.ignore_reserved(self.reserved.as_ref());
        let changes = diff(&current, &desired);
        apply_diff(
            &self.ops,
            identifier,
            &changes,
            &self.options,
            self.cancel.as_ref(),
        )
        .await
    }
}

impl<O: TagOperations + TagLister> TagSynchronizer<O> {
    /// Lists the current tags of `identifier` with reserved keys stripped.
    ///
    /// # Errors
    ///
    /// Returns the listing failure tagged with `Phase::List`.
    pub async fn list_tags(&self, identifier: &str) -> Result<TagSet, SyncError> {
        let tags = run_step(self.cancel.as_ref(), self.ops.list_tags(identifier))
            .await
            .map_err(|e| SyncError::remote(Phase::List, identifier, e))?;
        Ok(tags.ignore_reserved(self.reserved.as_ref()))
    }

    /// Fetches the current tags of `identifier` and reconciles them to `desired`.
    ///
    /// # Errors
    ///
    /// See [`TagSynchronizer::reconcile`]; listing failures carry `Phase::List`.
    pub async fn update_tags(
        &self,
        identifier: &str,
        desired: &TagSet,
    ) -> Result<ReconcileSummary, SyncError> {
        self.options.validate()?;
        let current = self.list_tags(identifier).await?;
        self.reconcile(identifier, &current, desired).await
    }
}

/// Stateless reconciliation: filter, diff, then remove and upsert in batches.
///
/// # Errors
///
/// See [`TagSynchronizer::reconcile`].
pub async fn reconcile<O, P>(
    identifier: &str,
    current: &TagSet,
    desired: &TagSet,
    reserved: &P,
    ops: &O,
    options: &TagSyncOptions,
) -> Result<ReconcileSummary, SyncError>
where
    O: TagOperations + ?Sized,
    P: ReservedKeyPredicate + ?Sized,
{
    let changes = diff(
        &current.ignore_reserved(reserved),
        &desired.ignore_reserved(reserved),
    );
    apply_diff(ops, identifier, &changes, options, None).await
}

async fn apply_diff<O>(
    ops: &O,
    identifier: &str,
    changes: &TagDiff,
    options: &TagSyncOptions,
    cancel: Option<&CancellationToken>,
) -> Result<ReconcileSummary, SyncError>
where
    O: TagOperations + ?Sized,
{
    options.validate()?;

    let mut summary = ReconcileSummary::default();
    if changes.is_empty() {
        debug!(identifier = %identifier, "Tags already converged");
        return Ok(summary);
    }

    for (index, batch) in options
        .remove_batch_limit
        .chunks(&changes.to_remove)?
        .enumerate()
    {
        debug!(
            identifier = %identifier,
            batch = index,
            keys = batch.len(),
            "Removing tags"
        );
        run_step(cancel, ops.remove_tags(identifier, batch))
            .await
            .map_err(|e| abort(Phase::Remove, identifier, index, e))?;
        summary.calls += 1;
        summary.removed.extend_from_slice(batch);
    }

    let entries: Vec<(String, String)> = changes
        .to_upsert
        .iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    for (index, batch) in options.upsert_batch_limit.chunks(&entries)?.enumerate() {
        let batch = TagSet::new(batch.iter().cloned());
        debug!(
            identifier = %identifier,
            batch = index,
            tags = batch.len(),
            "Upserting tags"
        );
        run_step(cancel, ops.upsert_tags(identifier, &batch))
            .await
            .map_err(|e| abort(Phase::Upsert, identifier, index, e))?;
        summary.calls += 1;
        summary.upserted.extend(batch.keys());
    }

    info!(
        identifier = %identifier,
        removed = summary.removed.len(),
        upserted = summary.upserted.len(),
        calls = summary.calls,
        "Tags reconciled"
    );
    Ok(summary)
}

fn abort(phase: Phase, identifier: &str, batch: usize, source: RemoteError) -> SyncError {
    let err = SyncError::remote(phase, identifier, source);
    warn!(
        identifier = %identifier,
        phase = %phase,
        batch,
        category = %err.category(),
        error = %err,
        "Aborting tag reconciliation"
    );
    err
}
