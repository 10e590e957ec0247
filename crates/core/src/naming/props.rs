//! Property-based tests for display-name resolution.

use proptest::prelude::*;

use super::resolve_display_name;

/// Names drawn from a small pool so collisions are frequent.
fn name_strategy() -> impl Strategy<Value = String> {
    let stems = prop::sample::select(vec!["a", "A", "report", "Report", "a (1)", "x"]);
    let exts = prop::sample::select(vec![".txt", ".TXT", ".png", ""]);
    let suffix = prop::option::of(prop_oneof![0u64..6, Just(u64::MAX), Just(u64::MAX - 1)]);
    (stems, suffix, exts).prop_map(|(stem, n, ext)| match n {
        Some(n) => format!("{stem} ({n}){ext}"),
        None => format!("{stem}{ext}"),
    })
}

proptest! {
    /// The resolved name never equals an active name, ignoring case.
    #[test]
    fn prop_resolved_name_never_collides(
        active in prop::collection::vec(name_strategy(), 0..12),
        desired in name_strategy(),
    ) {
        let resolved = resolve_display_name(&desired, active.iter().map(String::as_str));
        let lower = resolved.to_lowercase();
        prop_assert!(
            active.iter().all(|name| name.to_lowercase() != lower),
            "{} collides with {:?}", resolved, active
        );
    }

    /// Repeated uploads of one name all end up with distinct names.
    #[test]
    fn prop_repeated_uploads_stay_distinct(
        desired in name_strategy(),
        uploads in 1usize..20,
    ) {
        let mut active: Vec<String> = Vec::new();
        for _ in 0..uploads {
            let resolved = resolve_display_name(&desired, active.iter().map(String::as_str));
            active.push(resolved);
        }
        let mut lowered: Vec<String> = active.iter().map(|n| n.to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();
        prop_assert_eq!(lowered.len(), uploads);
    }

    /// A name that is not taken comes back untouched.
    #[test]
    fn prop_free_name_unchanged(
        active in prop::collection::vec(name_strategy(), 0..8),
        desired in name_strategy(),
    ) {
        let taken = active.iter().any(|n| n.to_lowercase() == desired.to_lowercase());
        let resolved = resolve_display_name(&desired, active.iter().map(String::as_str));
        prop_assert_eq!(resolved == desired, !taken);
    }
}
