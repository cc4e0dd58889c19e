//! Change watcher behaviour: channel-fed events and real filesystem events.

use pretty_assertions::assert_eq;
use repo_core::{ConfigManager, EngineOptions};
use repo_fs::{ChannelNotifier, DocumentChange};
use repo_test_utils::ConfigDir;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const PREBID_JS: &str = "prebid/Prebid.js";
const PREBID_SERVER: &str = "prebid/prebid-server";
const BASE: &str = "repositories/shared/base.json";

fn fixtures() -> ConfigDir {
    ConfigDir::copy_from(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/configs"))
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

/// Mid-write reads may fail to parse; those count as "not yet".
fn license<S: repo_fs::DocumentSource>(manager: &ConfigManager<S>, repo: &str) -> Option<String> {
    manager
        .get_repository(repo)
        .ok()?
        .config()
        .metadata
        .get("license")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[test]
fn shared_base_change_reaches_every_dependent() {
    let dir = fixtures();
    let notifier = ChannelNotifier::new();
    let sender = notifier.sender();
    let manager = ConfigManager::open(dir.root(), EngineOptions::default())
        .unwrap()
        .with_watcher(notifier)
        .unwrap();

    assert_eq!(license(&manager, PREBID_JS).as_deref(), Some("Apache-2.0"));
    assert_eq!(license(&manager, PREBID_SERVER).as_deref(), Some("Apache-2.0"));

    let edited = std::fs::read_to_string(dir.root().join(BASE))
        .unwrap()
        .replace("Apache-2.0", "MIT");
    dir.write(BASE, &edited);
    assert!(sender.send(DocumentChange::modified(BASE)));

    assert!(wait_until(|| manager.cache_stats().size == 0));
    assert_eq!(license(&manager, PREBID_JS).as_deref(), Some("MIT"));
    assert_eq!(license(&manager, PREBID_SERVER).as_deref(), Some("MIT"));

    manager.shutdown().unwrap();
}

#[test]
fn created_document_is_discovered_after_event() {
    let dir = fixtures();
    let notifier = ChannelNotifier::new();
    let sender = notifier.sender();
    let manager = ConfigManager::open(dir.root(), EngineOptions::default())
        .unwrap()
        .with_watcher(notifier)
        .unwrap();
    assert_eq!(manager.repositories().len(), 2);

    dir.write(
        "repositories/prebid/prebid-mobile.json",
        r#"{
            "repo_name": "prebid/prebid-mobile-ios",
            "extends": "../shared/base.json",
            "repo_type": "prebid-mobile",
            "module_categories": {
                "rendering": {"display_name": "Rendering", "patterns": [{"pattern": "*.swift", "type": "suffix"}]}
            }
        }"#,
    );
    dir.write(
        "repositories.json",
        r#"{"repositories": [
            "repositories/prebid/prebid-js.json",
            "repositories/prebid/prebid-server.json",
            "repositories/prebid/prebid-mobile.json"
        ]}"#,
    );
    assert!(sender.send(DocumentChange::created("repositories/prebid/prebid-mobile.json")));

    assert!(wait_until(|| manager.get_repository("prebid/prebid-mobile-ios").is_ok()));
    assert_eq!(manager.repositories().len(), 3);
}

#[test]
fn filesystem_events_invalidate_cache() {
    let dir = fixtures();
    let manager = ConfigManager::open(dir.root(), EngineOptions::default())
        .unwrap()
        .watch()
        .unwrap();
    assert_eq!(license(&manager, PREBID_SERVER).as_deref(), Some("Apache-2.0"));

    // Give the platform watcher a moment to arm
    thread::sleep(Duration::from_millis(100));
    let edited = std::fs::read_to_string(dir.root().join(BASE))
        .unwrap()
        .replace("Apache-2.0", "BSD-3-Clause");
    dir.write(BASE, &edited);

    assert!(wait_until(|| license(&manager, PREBID_SERVER).as_deref() == Some("BSD-3-Clause")));
    manager.shutdown().unwrap();
}

#[test]
fn queries_work_after_shutdown() {
    let dir = fixtures();
    let manager = ConfigManager::open(dir.root(), EngineOptions::default())
        .unwrap()
        .with_watcher(ChannelNotifier::new())
        .unwrap();
    manager.shutdown().unwrap();
    manager.shutdown().unwrap();

    let result = manager
        .categorize_file(PREBID_JS, "modules/rubiconBidAdapter.js", None)
        .unwrap();
    assert_eq!(result.extracted_name.as_deref(), Some("rubicon"));
}
