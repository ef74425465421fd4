//! Splitting keys and entries into API-sized batches.

use std::fmt;
use std::slice;

use crate::error::SyncError;

/// Splits `entries` into contiguous batches of at most `max_batch_size` items.
///
/// The returned iterator re-slices its input, so it can be cloned and walked
/// again.
///
/// # Errors
///
/// Returns `SyncError::InvalidConfiguration` if `max_batch_size` is zero.
pub fn chunks<T>(entries: &[T], max_batch_size: usize) -> Result<Chunks<'_, T>, SyncError> {
    if max_batch_size == 0 {
        return Err(SyncError::invalid_configuration(
            "max batch size must be at least 1",
        ));
    }
    Ok(Chunks {
        inner: entries.chunks(max_batch_size),
    })
}

/// Lazy sequence of batches produced by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a, T> {
    inner: slice::Chunks<'a, T>,
}

impl<'a, T> Iterator for Chunks<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Chunks<'_, T> {}

/// How many items one remote call may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatchLimit {
    /// At most this many items per call.
    Limited(usize),
    /// The API accepts any number of items in one call.
    #[default]
    Unbounded,
}

impl BatchLimit {
    /// Converts an optional size into a limit; `None` means unbounded.
    #[must_use]
    pub fn from_size(size: Option<usize>) -> Self {
        size.map_or(Self::Unbounded, Self::Limited)
    }

    /// Checks that a limited batch size is at least 1.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` for `Limited(0)`.
    pub fn validate(self) -> Result<(), SyncError> {
        match self {
            Self::Limited(0) => Err(SyncError::invalid_configuration(
                "max batch size must be at least 1",
            )),
            _ => Ok(()),
        }
    }

    /// Splits `entries` according to this limit.
    ///
    /// An unbounded limit yields the whole input as one batch (or nothing for
    /// empty input).
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfiguration` for `Limited(0)`.
    pub fn chunks<T>(self, entries: &[T]) -> Result<Chunks<'_, T>, SyncError> {
        match self {
            Self::Limited(n) => chunks(entries, n),
            Self::Unbounded => chunks(entries, entries.len().max(1)),
        }
    }
}

impl fmt::Display for BatchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_overflow_sizes() {
        let keys: Vec<String> = (0..25).map(|i| format!("key-{i}")).collect();
        let sizes: Vec<usize> = chunks(&keys, 10).unwrap().map(<[String]>::len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = chunks(&[1, 2, 3], 0).unwrap_err();
        assert!(err.is_invalid_configuration());
        assert!(BatchLimit::Limited(0).validate().is_err());
        assert!(BatchLimit::Limited(0).chunks(&[1]).is_err());
    }

    #[test]
    fn test_chunks_restartable() {
        let items = [1, 2, 3, 4, 5];
        let batches = chunks(&items, 2).unwrap();
        let first: Vec<_> = batches.clone().collect();
        let second: Vec<_> = batches.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![&[1, 2][..], &[3, 4][..], &[5][..]]);
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let empty: [u8; 0] = [];
        assert_eq!(chunks(&empty, 10).unwrap().count(), 0);
        assert_eq!(BatchLimit::Unbounded.chunks(&empty).unwrap().count(), 0);
    }

    #[test]
    fn test_unbounded_single_batch() {
        let items: Vec<u32> = (0..250).collect();
        let batches: Vec<_> = BatchLimit::Unbounded.chunks(&items).unwrap().collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 250);
    }
}
