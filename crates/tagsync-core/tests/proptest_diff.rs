//! Property-based tests for diffing, batching and reserved-key filtering.
//!
//! - Removals are exactly the keys dropped from the desired set
//! - Upserts are exactly the new or changed pairs
//! - Applying a diff converges onto the desired set
//! - Batches are bounded, disjoint and concatenate back to the input

use proptest::prelude::*;
use tagsync_core::{KeyPrefixes, TagSet, chunks, diff};

// ============================================================================
// Strategies
// ============================================================================

/// Small key alphabet so that generated sets overlap often.
fn arb_tag_set() -> impl Strategy<Value = TagSet> {
    prop::collection::vec(("(aws:)?[a-e]{1,2}", "[xyz]{0,2}"), 0..12).prop_map(TagSet::new)
}

// ============================================================================
// Diff properties
// ============================================================================

proptest! {
    #[test]
    fn removals_are_keys_missing_from_desired(current in arb_tag_set(), desired in arb_tag_set()) {
        let d = diff(&current, &desired);
        let expected: Vec<String> = current
            .keys()
            .into_iter()
            .filter(|k| !desired.contains_key(k))
            .collect();
        prop_assert_eq!(d.to_remove, expected);
    }

    #[test]
    fn upserts_are_new_or_changed(current in arb_tag_set(), desired in arb_tag_set()) {
        let d = diff(&current, &desired);
        for (k, v) in d.to_upsert.iter() {
            prop_assert_eq!(desired.get(k), Some(v));
            prop_assert!(current.get(k) != Some(v));
        }
        for (k, v) in desired.iter() {
            if current.get(k) == Some(v) {
                prop_assert!(!d.to_upsert.contains_key(k));
                prop_assert!(!d.to_remove.iter().any(|r| r == k));
            }
        }
    }

    #[test]
    fn sides_are_disjoint(current in arb_tag_set(), desired in arb_tag_set()) {
        let d = diff(&current, &desired);
        for k in &d.to_remove {
            prop_assert!(!d.to_upsert.contains_key(k));
        }
    }

    #[test]
    fn applying_diff_converges(current in arb_tag_set(), desired in arb_tag_set()) {
        let d = diff(&current, &desired);
        let converged = d.apply_to(&current);
        prop_assert_eq!(&converged, &desired);
        prop_assert!(diff(&converged, &desired).is_empty());
    }

    #[test]
    fn reserved_keys_never_in_diff(current in arb_tag_set(), desired in arb_tag_set()) {
        let reserved = KeyPrefixes::new(["aws:"]);
        let d = diff(&current.ignore_reserved(&reserved), &desired.ignore_reserved(&reserved));
        prop_assert!(d.to_remove.iter().all(|k| !k.starts_with("aws:")));
        prop_assert!(d.to_upsert.iter().all(|(k, _)| !k.starts_with("aws:")));
    }
}

// ============================================================================
// Batch properties
// ============================================================================

proptest! {
    #[test]
    fn batches_are_bounded_and_reassemble(items in prop::collection::vec(any::<u16>(), 0..200), size in 1usize..40) {
        let batches: Vec<&[u16]> = chunks(&items, size).unwrap().collect();
        prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
        prop_assert_eq!(batches.len(), items.len().div_ceil(size));
        let rebuilt: Vec<u16> = batches.concat();
        prop_assert_eq!(rebuilt, items);
    }
}
