//! Tag diffing.
//!
//! Computes which keys must be removed and which pairs must be upserted to
//! converge a current tag set onto a desired one. Added and changed keys are
//! not distinguished: most tagging APIs expose a single idempotent upsert.

use crate::tags::TagSet;

/// The changes needed to turn one tag set into another.
///
/// `to_remove` and the keys of `to_upsert` never overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Keys present in the current set but absent from the desired one.
    pub to_remove: Vec<String>,
    /// Desired pairs that are new or whose value changed.
    pub to_upsert: TagSet,
}

impl TagDiff {
    /// Returns `true` if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_upsert.is_empty()
    }

    /// Applies the diff to `current`, producing the converged tag set.
    #[must_use]
    pub fn apply_to(&self, current: &TagSet) -> TagSet {
        current
            .iter()
            .filter(|(k, _)| !self.to_remove.iter().any(|r| r.as_str() == *k))
            .chain(self.to_upsert.iter())
            .collect()
    }
}

/// Computes the diff between `current` and `desired`.
///
/// Keys with identical values on both sides appear in neither output.
#[must_use]
pub fn diff(current: &TagSet, desired: &TagSet) -> TagDiff {
    TagDiff {
        to_remove: current.removed(desired).keys(),
        to_upsert: current.updated(desired),
    }
}

impl TagSet {
    /// Tags present in `self` whose keys are absent from `desired`.
    #[must_use]
    pub fn removed(&self, desired: &TagSet) -> TagSet {
        self.iter()
            .filter(|(k, _)| !desired.contains_key(k))
            .collect()
    }

    /// Tags of `desired` that are missing from `self` or carry a different value.
    #[must_use]
    pub fn updated(&self, desired: &TagSet) -> TagSet {
        desired
            .iter()
            .filter(|(k, v)| self.get(k) != Some(*v))
            .collect()
    }
}
