//! Retry decorator with exponential backoff for injected remote operations.
//!
//! The synchronizer and paginator never retry on their own. Wrapping a
//! collaborator in [`Retrying`] repeats calls that fail with a retryable
//! [`RemoteError`] (throttling, temporary unavailability) before the failure
//! reaches the engine.
//!
//! ```ignore
//! use tagsync_engine::retry::{RetryConfig, Retrying};
//!
//! let policy = RetryConfig::default()
//!     .with_max_retries(5)
//!     .with_base_delay(Duration::from_millis(200));
//!
//! let sync = TagSynchronizer::new(Retrying::new(kinesis_tags, policy), options);
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagsync_core::{RemoteError, SyncError, TagSet};
use tokio::time::sleep;
use tracing::warn;

use crate::traits::{Page, PageFetcher, TagLister, TagOperations};

/// Backoff policy for throttled or unavailable remote calls.
///
/// The `[retry]` section of the configuration file:
///
/// ```toml
/// [retry]
/// max_retries = 5
/// base_delay = 200   # milliseconds
/// max_delay = 10000  # milliseconds
/// jitter = 0.25      # up to 25% added to each delay
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Repeats allowed after the first call fails.
    pub max_retries: u32,
    #[serde(with = "millis")]
    pub base_delay: Duration,
    #[serde(with = "millis")]
    pub max_delay: Duration,
    /// Fraction of each backoff added at random, in `0.0..=1.0`.
    ///
    /// Callers throttled together retry at different times.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: 0.25,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the random fraction added to each delay.
    #[must_use]
    pub fn with_jitter(mut self, ratio: f64) -> Self {
        self.jitter = ratio;
        self
    }

    /// Makes every delay exactly the computed backoff.
    #[must_use]
    pub fn without_jitter(self) -> Self {
        self.with_jitter(0.0)
    }

    /// Checks delay ordering and the jitter range.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` naming the offending field.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.base_delay > self.max_delay {
            return Err(SyncError::invalid_configuration(
                "retry.base_delay must be <= retry.max_delay",
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(SyncError::invalid_configuration(
                "retry.jitter must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }

    /// Backoff before retry number `retry` (0-based), without jitter:
    /// `base_delay * 2^retry`, capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// How long to wait before repeating a call that failed with `error`
    /// after `retries` earlier repeats, or `None` if the failure is final.
    #[must_use]
    pub fn retry_after(&self, error: &RemoteError, retries: u32) -> Option<Duration> {
        if !error.is_retryable() || retries >= self.max_retries {
            return None;
        }
        let backoff = self.backoff(retries);
        Some(backoff + backoff.mul_f64(self.jitter.clamp(0.0, 1.0) * fastrand::f64()))
    }

    /// Runs `call` until it succeeds or [`RetryConfig::retry_after`] gives up.
    ///
    /// # Errors
    ///
    /// Returns the last error observed.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut retries = 0;
        loop {
            let error = match call().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            let Some(delay) = self.retry_after(&error, retries) else {
                return Err(error);
            };
            retries += 1;
            warn!(
                operation,
                retry = retries,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                kind = %error.kind(),
                error = %error,
                "Remote call failed, backing off"
            );
            sleep(delay).await;
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A collaborator whose retryable failures are repeated per [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    policy: RetryConfig,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    /// The wrapped collaborator.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn policy(&self) -> &RetryConfig {
        &self.policy
    }
}

#[async_trait]
impl<T: TagLister> TagLister for Retrying<T> {
    async fn list_tags(&self, identifier: &str) -> Result<TagSet, RemoteError> {
        self.policy
            .run("list_tags", move || self.inner.list_tags(identifier))
            .await
    }
}

#[async_trait]
impl<T: TagOperations> TagOperations for Retrying<T> {
    async fn remove_tags(&self, identifier: &str, keys: &[String]) -> Result<(), RemoteError> {
        self.policy
            .run("remove_tags", move || self.inner.remove_tags(identifier, keys))
            .await
    }

    async fn upsert_tags(&self, identifier: &str, entries: &TagSet) -> Result<(), RemoteError> {
        self.policy
            .run("upsert_tags", move || self.inner.upsert_tags(identifier, entries))
            .await
    }
}

#[async_trait]
impl<T: PageFetcher> PageFetcher for Retrying<T> {
    type Item = T::Item;

    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<Self::Item>, RemoteError> {
        self.policy
            .run("fetch_page", move || self.inner.fetch_page(token))
            .await
    }
}
