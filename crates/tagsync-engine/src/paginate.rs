//! Cursor-driven pagination over an injected [`PageFetcher`].
//!
//! A [`Paginator`] fetches pages lazily, one remote call per requested page,
//! chaining the opaque token each response carries until the server returns
//! no token. It holds live cursor state and cannot be rewound: enumerate again
//! by building a new paginator, with no guarantee of identical results if the
//! remote collection changed in between.

use futures_util::Stream;
use futures_util::stream;
use tagsync_core::{Phase, SyncError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::cancel::run_step;
use crate::traits::PageFetcher;

/// Position of a paginated enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageCursor {
    /// No page fetched yet.
    #[default]
    Start,
    /// The server returned this token for the next page.
    HasNext(String),
    /// The listing is exhausted or failed.
    Done,
}

impl PageCursor {
    /// The token to send with the next fetch, `None` for the first page.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::HasNext(token) => Some(token),
            Self::Start | Self::Done => None,
        }
    }

    /// Returns `true` once no further page may be fetched.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Moves to the state implied by a response's next token.
    pub fn advance(&mut self, next_token: Option<&str>) {
        *self = match next_token {
            Some(token) if !token.is_empty() => Self::HasNext(token.to_owned()),
            _ => Self::Done,
        };
    }

    /// Terminates the cursor.
    pub fn finish(&mut self) {
        *self = Self::Done;
    }
}

/// Lazy sequence of pages from a [`PageFetcher`].
///
/// # Example
///
/// ```ignore
/// let mut pages = Paginator::new(page_fn(|marker| describe_mount_targets(&conn, &fs_id, marker)));
/// while let Some(page) = pages.next_page().await {
///     for target in page? {
///         // ...
///     }
/// }
/// ```
pub struct Paginator<F> {
    fetcher: F,
    cursor: PageCursor,
    pages_fetched: usize,
    label: String,
    cancel: Option<CancellationToken>,
}

impl<F: PageFetcher> Paginator<F> {
    /// Creates a paginator positioned before the first page.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cursor: PageCursor::Start,
            pages_fetched: 0,
            label: String::new(),
            cancel: None,
        }
    }

    /// Names the listing; used as the identifier on errors and in logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Attaches a cancellation token checked around every fetch.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current cursor state.
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Number of remote fetches issued so far.
    ///
    /// A fetch skipped because the token was already cancelled is not counted.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page.
    ///
    /// Returns `None` once the listing is exhausted. A fetch failure is
    /// returned once and terminates the paginator.
    pub async fn next_page(&mut self) -> Option<Result<Vec<F::Item>, SyncError>> {
        if self.cursor.is_done() {
            return None;
        }

        let token = self.cursor.token().map(str::to_owned);
        trace!(listing = %self.label, token = ?token, "Fetching page");
        let fetcher = &self.fetcher;
        let mut issued = false;
        let result = run_step(self.cancel.as_ref(), async {
            issued = true;
            fetcher.fetch_page(token.as_deref()).await
        })
        .await;
        if issued {
            self.pages_fetched += 1;
        }

        match result {
            Ok(page) => {
                self.cursor.advance(page.next());
                debug!(
                    listing = %self.label,
                    page = self.pages_fetched,
                    items = page.items.len(),
                    last_page = self.cursor.is_done(),
                    "Fetched page"
                );
                Some(Ok(page.items))
            }
            Err(e) => {
                self.cursor.finish();
                Some(Err(SyncError::remote(Phase::FetchPage, self.label.clone(), e)))
            }
        }
    }

    /// Drives every page through `f(items, last_page)`; `f` returns `false` to stop.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure.
    pub async fn for_each_page<C>(mut self, mut f: C) -> Result<(), SyncError>
    where
        C: FnMut(Vec<F::Item>, bool) -> bool,
    {
        while let Some(page) = self.next_page().await {
            let last_page = self.cursor.is_done();
            if !f(page?, last_page) || last_page {
                break;
            }
        }
        Ok(())
    }

    /// Drains every page into one vector.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure; items already fetched are discarded.
    pub async fn try_collect_items(mut self) -> Result<Vec<F::Item>, SyncError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await {
            items.extend(page?);
        }
        Ok(items)
    }

    /// Converts the paginator into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<F::Item>, SyncError>> {
        stream::unfold(self, |mut pages| async move {
            pages.next_page().await.map(|page| (page, pages))
        })
    }
}
