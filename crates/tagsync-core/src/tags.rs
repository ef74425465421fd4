//! Tag sets and reserved-key filtering.
//!
//! A [`TagSet`] is built either from a resource's declared configuration
//! (desired) or from a remote listing (current). Both are folded with
//! last-write-wins semantics and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A key-value pair as it travels over most tagging APIs.
///
/// The value is optional on the wire; an absent value folds to the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// The tag key.
    pub key: String,
    /// The tag value, if the service returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Tag {
    /// Creates a new tag with a value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// A mapping of tag keys to values attached to a remote resource.
///
/// Key order follows insertion order, which makes batch assignment
/// deterministic within one call. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: IndexMap<String, String>,
}

impl TagSet {
    /// Builds a tag set from any key-value source. Later duplicates win.
    ///
    /// Pairs with an empty key are dropped; no tagging API accepts them.
    pub fn new<I, K, V>(source: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tags = IndexMap::new();
        for (key, value) in source {
            let key = key.into();
            if !key.is_empty() {
                tags.insert(key, value.into());
            }
        }
        Self { tags }
    }

    /// Creates an empty tag set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Folds wire-shaped tag pairs into a tag set. Later duplicates win.
    pub fn from_tags<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'a Tag>,
    {
        Self::new(
            tags.into_iter()
                .map(|tag| (tag.key.clone(), tag.value.clone().unwrap_or_default())),
        )
    }

    /// Converts the set back into wire-shaped pairs.
    #[must_use]
    pub fn to_tags(&self) -> Vec<Tag> {
        self.tags.iter().map(|(k, v)| Tag::new(k, v)).collect()
    }

    /// Read-only view of the key-value mapping.
    #[must_use]
    pub fn map(&self) -> &IndexMap<String, String> {
        &self.tags
    }

    /// The keys of the set in map order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    /// Iterates over key-value pairs in map order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Number of tags in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the set holds no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns a new set with every key matching `predicate` removed.
    #[must_use]
    pub fn ignore_reserved<P>(&self, predicate: &P) -> Self
    where
        P: ReservedKeyPredicate + ?Sized,
    {
        Self {
            tags: self
                .tags
                .iter()
                .filter(|(k, _)| !predicate.is_reserved(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TagSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Classifies a tag key as system-reserved.
///
/// Reserved keys are injected by the provider and are never pushed to or
/// pulled from the remote API during reconciliation.
pub trait ReservedKeyPredicate: Send + Sync {
    /// Returns `true` if `key` must be excluded from reconciliation.
    fn is_reserved(&self, key: &str) -> bool;
}

impl<F> ReservedKeyPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_reserved(&self, key: &str) -> bool {
        self(key)
    }
}

/// Treats every key as user-managed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReservedKeys;

impl ReservedKeyPredicate for NoReservedKeys {
    fn is_reserved(&self, _key: &str) -> bool {
        false
    }
}

/// Reserves every key starting with one of the configured prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPrefixes {
    prefixes: Vec<String>,
}

impl KeyPrefixes {
    /// Creates a predicate from a list of prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The configured prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl ReservedKeyPredicate for KeyPrefixes {
    fn is_reserved(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }
}
