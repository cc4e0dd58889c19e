//! Merge rules shared by `extends` inheritance and version overrides
//!
//! Each field family has one rule:
//!
//! | family | rule |
//! |--------|------|
//! | scalars | child replaces when present |
//! | `module_categories`, `version_overrides` | replace by key, parent order kept, new keys appended |
//! | `paths.*` | each list replaced when present |
//! | `relationships` | parent then child, no dedup |
//! | `metadata` | replace by top-level key |

use indexmap::IndexMap;
use std::hash::Hash;

use crate::schema::{ConfigFragment, PathsFragment};

pub fn replace_scalar<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

pub fn replace_optional<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

/// Whole-entry replacement; an overridden key keeps its original position.
pub fn replace_by_key<K, V>(target: &mut IndexMap<K, V>, overlay: &IndexMap<K, V>)
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    for (key, value) in overlay {
        target.insert(key.clone(), value.clone());
    }
}

pub fn replace_list(target: &mut Vec<String>, value: Option<&Vec<String>>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

pub fn concat<T: Clone>(target: &mut Vec<T>, tail: &[T]) {
    target.extend_from_slice(tail);
}

pub fn replace_metadata(
    target: &mut serde_json::Map<String, serde_json::Value>,
    overlay: &serde_json::Map<String, serde_json::Value>,
) {
    for (key, value) in overlay {
        target.insert(key.clone(), value.clone());
    }
}

fn merge_option<T>(parent: Option<T>, child: Option<T>, merge: impl FnOnce(&mut T, T)) -> Option<T> {
    match (parent, child) {
        (Some(mut parent), Some(child)) => {
            merge(&mut parent, child);
            Some(parent)
        }
        (parent, child) => child.or(parent),
    }
}

fn merge_map<K: Hash + Eq, V>(parent: &mut IndexMap<K, V>, child: IndexMap<K, V>) {
    for (key, value) in child {
        parent.insert(key, value);
    }
}

fn merge_paths(parent: &mut PathsFragment, child: PathsFragment) {
    for (slot, value) in [
        (&mut parent.core, child.core),
        (&mut parent.test, child.test),
        (&mut parent.docs, child.docs),
        (&mut parent.exclude, child.exclude),
    ] {
        if value.is_some() {
            *slot = value;
        }
    }
}

impl ConfigFragment {
    /// Merge `child` over `parent` for `extends` resolution.
    ///
    /// `repo_name` comes only from the child; `extends` is consumed and never
    /// present in the result.
    pub fn inherit(parent: ConfigFragment, child: ConfigFragment) -> ConfigFragment {
        ConfigFragment {
            repo_name: child.repo_name,
            extends: None,
            repo_type: child.repo_type.or(parent.repo_type),
            description: child.description.or(parent.description),
            detection_strategy: child.detection_strategy.or(parent.detection_strategy),
            fetch_strategy: child.fetch_strategy.or(parent.fetch_strategy),
            default_version: child.default_version.or(parent.default_version),
            module_categories: merge_option(
                parent.module_categories,
                child.module_categories,
                merge_map,
            ),
            paths: merge_option(parent.paths, child.paths, merge_paths),
            version_overrides: merge_option(
                parent.version_overrides,
                child.version_overrides,
                merge_map,
            ),
            relationships: merge_option(parent.relationships, child.relationships, |p, c| {
                p.extend(c)
            }),
            metadata: merge_option(parent.metadata, child.metadata, |p, c| p.extend(c)),
        }
    }
}
