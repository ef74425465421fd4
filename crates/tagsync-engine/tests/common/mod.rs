//! Shared fakes for tagsync-engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tagsync_core::{RemoteError, RemoteErrorKind, TagSet};
use tagsync_engine::{Page, PageFetcher, TagLister, TagOperations};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once per test binary.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A remote call observed by [`FakeTagClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(String),
    Remove(String, Vec<String>),
    Upsert(String, TagSet),
}

/// In-memory tagging API that records every call.
#[derive(Default)]
pub struct FakeTagClient {
    resources: Mutex<HashMap<String, TagSet>>,
    calls: Mutex<Vec<Call>>,
    mutations: AtomicUsize,
    fail_mutation: Mutex<Option<(usize, RemoteErrorKind)>>,
    cancel_mutation: Mutex<Option<(usize, CancellationToken)>>,
    transient: Mutex<VecDeque<RemoteErrorKind>>,
}

impl FakeTagClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource with its current tags.
    pub fn with_resource(self, identifier: &str, tags: TagSet) -> Self {
        self.resources
            .lock()
            .unwrap()
            .insert(identifier.to_string(), tags);
        self
    }

    /// Fails the `n`-th (1-based) remove/upsert call with `kind`.
    pub fn fail_mutation(self, n: usize, kind: RemoteErrorKind) -> Self {
        *self.fail_mutation.lock().unwrap() = Some((n, kind));
        self
    }

    /// Fails the next calls of any kind with the given kinds, in order.
    pub fn fail_next(self, kinds: impl IntoIterator<Item = RemoteErrorKind>) -> Self {
        self.transient.lock().unwrap().extend(kinds);
        self
    }

    /// Cancels `token` while serving the `n`-th (1-based) remove/upsert call,
    /// which itself still succeeds.
    pub fn cancel_on_mutation(self, n: usize, token: CancellationToken) -> Self {
        *self.cancel_mutation.lock().unwrap() = Some((n, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List(_)))
            .collect()
    }

    pub fn remove_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(_, keys) => Some(keys),
                _ => None,
            })
            .collect()
    }

    pub fn upsert_batches(&self) -> Vec<TagSet> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upsert(_, tags) => Some(tags),
                _ => None,
            })
            .collect()
    }

    /// The tags the fake currently holds for `identifier`.
    pub fn tags(&self, identifier: &str) -> Option<TagSet> {
        self.resources.lock().unwrap().get(identifier).cloned()
    }

    fn transient_failure(&self) -> Result<(), RemoteError> {
        match self.transient.lock().unwrap().pop_front() {
            Some(kind) => Err(RemoteError::new(kind, "injected transient failure")),
            None => Ok(()),
        }
    }

    fn check_mutation(&self) -> Result<(), RemoteError> {
        let n = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, token)) = &*self.cancel_mutation.lock().unwrap() {
            if *at == n {
                token.cancel();
            }
        }
        match *self.fail_mutation.lock().unwrap() {
            Some((at, kind)) if at == n => Err(RemoteError::new(kind, format!("call {n} failed"))),
            _ => Ok(()),
        }
    }

    fn modify(
        &self,
        identifier: &str,
        f: impl FnOnce(&TagSet) -> TagSet,
    ) -> Result<(), RemoteError> {
        let mut resources = self.resources.lock().unwrap();
        let tags = resources.get_mut(identifier).ok_or_else(|| {
            RemoteError::not_found(format!("resource {identifier} not found"))
                .with_code("ResourceNotFoundException")
        })?;
        *tags = f(tags);
        Ok(())
    }
}

#[async_trait]
impl TagLister for FakeTagClient {
    async fn list_tags(&self, identifier: &str) -> Result<TagSet, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::List(identifier.to_string()));
        self.transient_failure()?;
        self.tags(identifier).ok_or_else(|| {
            RemoteError::not_found(format!("resource {identifier} not found"))
                .with_code("ResourceNotFoundException")
        })
    }
}

#[async_trait]
impl TagOperations for FakeTagClient {
    async fn remove_tags(&self, identifier: &str, keys: &[String]) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Remove(identifier.to_string(), keys.to_vec()));
        self.transient_failure()?;
        self.check_mutation()?;
        self.modify(identifier, |tags| {
            tags.iter()
                .filter(|(k, _)| !keys.iter().any(|r| r.as_str() == *k))
                .collect()
        })
    }

    async fn upsert_tags(&self, identifier: &str, entries: &TagSet) -> Result<(), RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Upsert(identifier.to_string(), entries.clone()));
        self.transient_failure()?;
        self.check_mutation()?;
        self.modify(identifier, |tags| tags.iter().chain(entries.iter()).collect())
    }
}

/// Serves a fixed sequence of pages and counts fetches.
pub struct ScriptedPages<T> {
    pages: Vec<Page<T>>,
    fetches: AtomicUsize,
    tokens: Mutex<Vec<Option<String>>>,
    failures: Mutex<VecDeque<RemoteErrorKind>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl<T: Clone + Send + Sync> ScriptedPages<T> {
    pub fn new(pages: Vec<Page<T>>) -> Self {
        Self {
            pages,
            fetches: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            cancel_after: Mutex::new(None),
        }
    }

    /// Fails the next fetches with the given kinds before serving pages again.
    pub fn fail_next(self, kinds: impl IntoIterator<Item = RemoteErrorKind>) -> Self {
        self.failures.lock().unwrap().extend(kinds);
        self
    }

    /// Cancels `token` while serving fetch number `n` (1-based).
    pub fn cancel_on_fetch(self, n: usize, token: CancellationToken) -> Self {
        *self.cancel_after.lock().unwrap() = Some((n, token));
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> PageFetcher for ScriptedPages<T> {
    type Item = T;

    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<T>, RemoteError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, cancel)) = &*self.cancel_after.lock().unwrap() {
            if *at == n {
                cancel.cancel();
            }
        }
        self.tokens.lock().unwrap().push(token.map(str::to_owned));
        if let Some(kind) = self.failures.lock().unwrap().pop_front() {
            return Err(RemoteError::new(kind, "injected page failure"));
        }
        // The first page answers no token; every later page answers the
        // previous page's next token.
        let index = match token {
            None => 0,
            Some(t) => {
                self.pages
                    .iter()
                    .position(|p| p.next_token.as_deref() == Some(t))
                    .ok_or_else(|| RemoteError::other(format!("unknown token {t}")))?
                    + 1
            }
        };
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| RemoteError::other("fetched past the last page"))
    }
}
