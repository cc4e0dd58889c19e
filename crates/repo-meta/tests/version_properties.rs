use indexmap::IndexMap;
use proptest::prelude::*;
use repo_meta::{VersionSelector, parse_version, select_overrides};

fn version_string() -> impl Strategy<Value = (u64, u64, u64)> {
    (0u64..20, 0u64..20, 0u64..20)
}

proptest! {
    #[test]
    fn selected_overrides_all_contain_the_query(
        keys in prop::collection::vec(
            prop_oneof![
                version_string().prop_map(|(a, b, c)| format!("v{a}.{b}.{c}")),
                version_string().prop_map(|(a, b, _)| format!("v{a}.{b}+")),
                (version_string(), version_string())
                    .prop_map(|((a, b, c), (d, e, f))| format!(">={a}.{b}.{c},<{d}.{e}.{f}")),
            ],
            0..8,
        ),
        (qa, qb, qc) in version_string(),
    ) {
        let overrides: IndexMap<String, usize> =
            keys.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect();
        let queried = format!("{qa}.{qb}.{qc}");
        let version = parse_version(&queried).unwrap();

        let selected = select_overrides(&overrides, &queried);
        for pick in &selected {
            prop_assert!(VersionSelector::parse(pick.key).unwrap().matches(&version));
        }

        let expected = overrides
            .keys()
            .filter(|k| VersionSelector::parse(k).unwrap().matches(&version))
            .count();
        prop_assert_eq!(selected.len(), expected);
    }

    #[test]
    fn exact_selector_always_applies_last(
        (a, b) in (0u64..20, 0u64..20),
        lower in 0u64..20,
        exact_first in any::<bool>(),
    ) {
        let lower = lower.min(a);
        let exact = format!("v{a}.{b}");
        let open = format!("v{lower}.0+");

        let mut overrides = IndexMap::new();
        if exact_first {
            overrides.insert(exact.clone(), ());
            overrides.insert(open.clone(), ());
        } else {
            overrides.insert(open.clone(), ());
            overrides.insert(exact.clone(), ());
        }

        let keys: Vec<&str> = select_overrides(&overrides, &format!("{a}.{b}"))
            .into_iter()
            .map(|s| s.key)
            .collect();
        prop_assert_eq!(keys, vec![open.as_str(), exact.as_str()]);
    }

    #[test]
    fn nested_ranges_apply_wider_first(
        outer_lo in 0u64..5,
        inner_lo in 5u64..10,
        inner_hi in 11u64..15,
        outer_hi in 15u64..20,
        narrow_first in any::<bool>(),
    ) {
        let outer = format!(">={outer_lo}.0,<{outer_hi}.0");
        let inner = format!(">={inner_lo}.0,<{inner_hi}.0");

        let mut overrides = IndexMap::new();
        for key in if narrow_first { [&inner, &outer] } else { [&outer, &inner] } {
            overrides.insert(key.clone(), ());
        }

        let keys: Vec<&str> = select_overrides(&overrides, "10.0.0")
            .into_iter()
            .map(|s| s.key)
            .collect();
        prop_assert_eq!(keys, vec![outer.as_str(), inner.as_str()]);
    }

    #[test]
    fn selection_is_deterministic(
        keys in prop::collection::vec(
            version_string().prop_map(|(a, b, _)| format!("v{a}.{b}+")),
            0..6,
        ),
        (qa, qb, qc) in version_string(),
    ) {
        let overrides: IndexMap<String, ()> = keys.into_iter().map(|k| (k, ())).collect();
        let queried = format!("{qa}.{qb}.{qc}");
        let first: Vec<&str> = select_overrides(&overrides, &queried).into_iter().map(|s| s.key).collect();
        let second: Vec<&str> = select_overrides(&overrides, &queried).into_iter().map(|s| s.key).collect();
        prop_assert_eq!(first, second);
    }
}
