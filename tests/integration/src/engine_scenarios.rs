//! End-to-end scenarios against the on-disk fixture configuration.

use pretty_assertions::assert_eq;
use repo_core::{ConfigManager, EngineOptions, Error};
use repo_fs::{DirectorySource, MemorySource};
use repo_meta::Error as LoadError;
use repo_test_utils::ConfigDir;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

const PREBID_JS: &str = "prebid/Prebid.js";
const PREBID_SERVER: &str = "prebid/prebid-server";

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/configs")
}

fn fixture_manager() -> ConfigManager<DirectorySource> {
    ConfigManager::open(fixture_root(), EngineOptions::default()).unwrap()
}

// =============================================================================
// Scenario 1: suffix pattern with name extraction
// =============================================================================

#[test]
fn suffix_pattern_extracts_adapter_name() {
    let manager = fixture_manager();
    let result = manager
        .categorize_file(PREBID_JS, "modules/rubiconBidAdapter.js", Some("v9.0"))
        .unwrap();

    assert_eq!(result.best_match.as_deref(), Some("bid_adapter"));
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.extracted_name.as_deref(), Some("rubicon"));
    assert_eq!(result.module_type.as_deref(), Some("Bid Adapter"));
}

// =============================================================================
// Scenario 2: version override moves the category
// =============================================================================

#[test]
fn version_override_applies_from_v10() {
    let manager = fixture_manager();
    let path = "metadata/modules/rubiconBidAdapter.json";

    let v10 = manager.categorize_file(PREBID_JS, path, Some("v10.0")).unwrap();
    assert_eq!(v10.best_match.as_deref(), Some("bid_adapter"));
    assert_eq!(v10.extracted_name.as_deref(), Some("rubicon"));

    let v9 = manager.categorize_file(PREBID_JS, path, Some("v9.0")).unwrap();
    assert!(!v9.is_categorized());
}

#[test]
fn version_boundaries() {
    let manager = fixture_manager();
    let overrides = |version: &str| {
        manager
            .resolve(PREBID_JS, Some(version))
            .unwrap()
            .applied_overrides()
            .to_vec()
    };

    assert!(overrides("v9.9").is_empty());
    assert_eq!(overrides("v9.0"), vec!["v9.0".to_string()]);
    assert_eq!(overrides("v10.0"), vec!["v10.0+".to_string()]);
    assert_eq!(overrides("v10.5"), vec!["v10.0+".to_string()]);
    assert_eq!(overrides("11.2.3"), vec!["v10.0+".to_string()]);
}

#[test]
fn exact_override_changes_scalar_fields() {
    let manager = fixture_manager();
    let v9 = manager.resolve(PREBID_JS, Some("v9.0")).unwrap();
    assert_eq!(v9.config().description.as_deref(), Some("Prebid.js 9.0 layout"));

    let base = manager.get_repository(PREBID_JS).unwrap();
    assert_eq!(
        base.config().description.as_deref(),
        Some("Header bidding library for the browser")
    );
}

// =============================================================================
// Scenario 3: missing parent document
// =============================================================================

#[test]
fn missing_parent_fails_with_context() {
    let source = MemorySource::new();
    source.insert(
        "repositories/orphan.json",
        r#"{"repo_name": "o/orphan", "extends": "../shared/gone.json", "repo_type": "lib"}"#,
    );
    let manager = ConfigManager::new(source, EngineOptions::default()).unwrap();

    let err = manager.get_repository("o/orphan").unwrap_err();
    match err {
        Error::Load(LoadError::MissingParent { document, parent }) => {
            assert_eq!(document.as_str(), "repositories/orphan.json");
            assert_eq!(parent.as_str(), "shared/gone.json");
        }
        other => panic!("expected MissingParent, got {other:?}"),
    }
}

// =============================================================================
// Scenario 4: ties across categories
// =============================================================================

#[test]
fn higher_confidence_category_wins() {
    let source = MemorySource::new();
    source.insert(
        "repositories/example.json",
        r#"{
            "repo_name": "o/example",
            "repo_type": "lib",
            "module_categories": {
                "adapter": {
                    "display_name": "Adapter",
                    "patterns": [{"pattern": "*Adapter.js", "type": "suffix", "name_extraction": "remove-suffix:Adapter"}]
                },
                "module": {
                    "display_name": "Module",
                    "patterns": [{"pattern": "modules/*.js", "type": "glob"}]
                }
            }
        }"#,
    );
    let manager = ConfigManager::new(source, EngineOptions::default()).unwrap();

    let result = manager
        .categorize_file("o/example", "modules/exampleAdapter.js", None)
        .unwrap();
    assert_eq!(result.categories, vec!["adapter".to_string(), "module".to_string()]);
    assert_eq!(result.best_match.as_deref(), Some("adapter"));
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.extracted_name.as_deref(), Some("example"));
}

#[test]
fn suffix_beats_generic_module_glob_in_fixtures() {
    let manager = fixture_manager();
    let result = manager
        .categorize_file(PREBID_JS, "modules/sharedIdSystem.js", None)
        .unwrap();
    assert_eq!(result.best_match.as_deref(), Some("id_module"));
    assert!(result.categories.contains(&"module".to_string()));

    let other = manager
        .categorize_file(PREBID_JS, "modules/currency.js", None)
        .unwrap();
    assert_eq!(other.best_match.as_deref(), Some("module"));
    assert_eq!(other.extracted_name.as_deref(), Some("currency"));
}

// =============================================================================
// Scenario 5: concurrent queries during invalidation
// =============================================================================

#[test]
fn fifty_concurrent_queries_during_invalidation() {
    let dir = ConfigDir::copy_from(&fixture_root());
    let manager = Arc::new(ConfigManager::open(dir.root(), EngineOptions::default()).unwrap());
    let barrier = Arc::new(Barrier::new(51));

    let queries: Vec<_> = (0..50)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager
                    .categorize_file(PREBID_JS, "modules/rubiconBidAdapter.js", Some("v9.0"))
                    .unwrap()
            })
        })
        .collect();

    let invalidator = {
        let manager = Arc::clone(&manager);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..20 {
                manager.invalidate(PREBID_JS);
                thread::yield_now();
            }
        })
    };

    for query in queries {
        let result = query.join().unwrap();
        assert_eq!(result.best_match.as_deref(), Some("bid_adapter"));
        assert_eq!(result.extracted_name.as_deref(), Some("rubicon"));
    }
    invalidator.join().unwrap();

    // A change made before invalidation is visible afterwards
    let path = "repositories/prebid/prebid-js.json";
    let edited = std::fs::read_to_string(dir.root().join(path))
        .unwrap()
        .replace("remove-suffix:BidAdapter", "remove-suffix:Adapter");
    dir.write(path, &edited);
    manager.invalidate(PREBID_JS);

    let result = manager
        .categorize_file(PREBID_JS, "modules/rubiconBidAdapter.js", Some("v9.0"))
        .unwrap();
    assert_eq!(result.extracted_name.as_deref(), Some("rubiconBid"));
}

// =============================================================================
// Testable properties
// =============================================================================

#[test]
fn resolution_is_deterministic() {
    let first = fixture_manager().resolve(PREBID_SERVER, Some("v1.0")).unwrap();
    let second = fixture_manager().resolve(PREBID_SERVER, Some("v1.0")).unwrap();

    assert_eq!(first.config(), second.config());
    assert_eq!(
        serde_json::to_string(first.config()).unwrap(),
        serde_json::to_string(second.config()).unwrap()
    );
}

#[test]
fn child_category_replaces_parent_patterns() {
    let source = MemorySource::new();
    source.insert(
        "shared/base.json",
        r#"{
            "repo_type": "lib",
            "module_categories": {
                "adapter": {"display_name": "Adapter", "patterns": [{"pattern": "*Adapter.js", "type": "suffix"}]}
            }
        }"#,
    );
    source.insert(
        "repositories/child.json",
        r#"{
            "repo_name": "o/child",
            "extends": "../shared/base.json",
            "module_categories": {
                "adapter": {"display_name": "Adapter", "patterns": [{"pattern": "*Adapter.ts", "type": "suffix"}]}
            }
        }"#,
    );
    let manager = ConfigManager::new(source, EngineOptions::default()).unwrap();

    let js = manager.categorize_file("o/child", "src/fooAdapter.js", None).unwrap();
    assert!(!js.is_categorized());
    let ts = manager.categorize_file("o/child", "src/fooAdapter.ts", None).unwrap();
    assert_eq!(ts.best_match.as_deref(), Some("adapter"));
}

#[test]
fn inherited_paths_and_metadata() {
    let manager = fixture_manager();
    let server = manager.get_repository(PREBID_SERVER).unwrap();
    let config = server.config();

    assert_eq!(config.paths.docs, vec!["docs/".to_string()]);
    assert_eq!(config.paths.core, vec!["exchange/".to_string(), "openrtb_ext/".to_string()]);
    assert_eq!(
        config.metadata.get("organization").and_then(|v| v.as_str()),
        Some("prebid")
    );

    let result = manager
        .categorize_file(PREBID_SERVER, "build/adapters/x/x.go", None)
        .unwrap();
    assert!(result.excluded);
}

#[test]
fn module_info_for_server_adapter() {
    let manager = fixture_manager();
    let info = manager
        .module_info(
            "https://github.com/prebid/prebid-server",
            "adapters/appnexus/appnexus.go",
            None,
        )
        .unwrap();
    assert_eq!(info.repo_type, "prebid-server-go");
    assert_eq!(info.module_name.as_deref(), Some("appnexus"));
    assert_eq!(info.categorization.confidence, 0.9);
}
