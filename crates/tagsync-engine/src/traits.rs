//! Collaborator traits implemented by resource-specific code.
//!
//! The engine never talks to a remote API directly. Listing tags, removing
//! keys, upserting pairs and fetching pages are injected through these traits,
//! so one engine serves every service regardless of its call shapes.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tagsync_core::{RemoteError, TagSet};

/// Fetches the tags currently attached to a remote resource.
#[async_trait]
pub trait TagLister: Send + Sync {
    /// Lists the tags of `identifier`.
    ///
    /// The identifier is typically an ARN, although some services key their
    /// tagging calls by name.
    ///
    /// # Errors
    ///
    /// Returns the remote failure unchanged.
    async fn list_tags(&self, identifier: &str) -> Result<TagSet, RemoteError>;
}

/// Removes and upserts tags on a remote resource.
///
/// Each call receives at most one batch, sized according to the limits the
/// synchronizer was configured with.
#[async_trait]
pub trait TagOperations: Send + Sync {
    /// Removes `keys` from `identifier`.
    ///
    /// # Errors
    ///
    /// Returns the remote failure unchanged.
    async fn remove_tags(&self, identifier: &str, keys: &[String]) -> Result<(), RemoteError>;

    /// Adds or overwrites `entries` on `identifier`.
    ///
    /// # Errors
    ///
    /// Returns the remote failure unchanged.
    async fn upsert_tags(&self, identifier: &str, entries: &TagSet) -> Result<(), RemoteError>;
}

#[async_trait]
impl<T: TagLister + ?Sized> TagLister for Arc<T> {
    async fn list_tags(&self, identifier: &str) -> Result<TagSet, RemoteError> {
        (**self).list_tags(identifier).await
    }
}

#[async_trait]
impl<T: TagOperations + ?Sized> TagOperations for Arc<T> {
    async fn remove_tags(&self, identifier: &str, keys: &[String]) -> Result<(), RemoteError> {
        (**self).remove_tags(identifier, keys).await
    }

    async fn upsert_tags(&self, identifier: &str, entries: &TagSet) -> Result<(), RemoteError> {
        (**self).upsert_tags(identifier, entries).await
    }
}

/// One page of a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Token for the next page. `None` or empty means this was the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page that has a successor.
    #[must_use]
    pub fn new(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }

    /// Creates the final page of a listing.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Returns the next token if it is present and non-empty.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Fetches one page of a remote listing.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// The decoded item type.
    type Item: Send;

    /// Fetches the page identified by `token`; `None` requests the first page.
    ///
    /// # Errors
    ///
    /// Returns the remote failure unchanged.
    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<Self::Item>, RemoteError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    type Item = T::Item;

    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<Self::Item>, RemoteError> {
        (**self).fetch_page(token).await
    }
}

/// A [`PageFetcher`] backed by an async closure. Built with [`page_fn`].
pub struct FnPageFetcher<F> {
    f: F,
}

/// Adapts an async closure taking the cursor token into a [`PageFetcher`].
///
/// ```ignore
/// let fetcher = page_fn(|marker: Option<String>| async move {
///     client.describe_mount_targets(&file_system_id, marker).await
/// });
/// ```
pub fn page_fn<F, Fut, T>(f: F) -> FnPageFetcher<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page<T>, RemoteError>> + Send,
    T: Send,
{
    FnPageFetcher { f }
}

#[async_trait]
impl<F, Fut, T> PageFetcher for FnPageFetcher<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page<T>, RemoteError>> + Send,
    T: Send,
{
    type Item = T;

    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<T>, RemoteError> {
        (self.f)(token.map(str::to_owned)).await
    }
}
