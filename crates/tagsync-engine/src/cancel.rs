//! Cooperative cancellation of in-flight remote steps.

use std::future::Future;

use tagsync_core::RemoteError;
use tokio_util::sync::CancellationToken;

/// Runs one remote step, turning a triggered token into a `Cancelled` failure.
pub(crate) async fn run_step<T, F>(
    cancel: Option<&CancellationToken>,
    step: F,
) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    let Some(token) = cancel else {
        return step.await;
    };
    if token.is_cancelled() {
        return Err(RemoteError::cancelled());
    }
    tokio::select! {
        biased;
        () = token.cancelled() => Err(RemoteError::cancelled()),
        result = step => result,
    }
}
