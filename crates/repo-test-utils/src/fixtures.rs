//! Canonical layout documents shared by test suites.
//!
//! Two repositories inherit from one shared base:
//!
//! ```text
//! repositories/shared/prebid-base.json
//! repositories/prebid/prebid-js.json      prebid/Prebid.js
//! repositories/prebid/prebid-server.json  prebid/prebid-server
//! ```

use repo_fs::MemorySource;

pub const PREBID_JS: &str = "prebid/Prebid.js";
pub const PREBID_SERVER: &str = "prebid/prebid-server";

pub const BASE_ID: &str = "repositories/shared/prebid-base.json";
pub const PREBID_JS_ID: &str = "repositories/prebid/prebid-js.json";
pub const PREBID_SERVER_ID: &str = "repositories/prebid/prebid-server.json";

pub const BASE_DOCUMENT: &str = r#"{
  "repo_type": "prebid",
  "description": "Shared Prebid layout",
  "detection_strategy": "filename_pattern",
  "fetch_strategy": "filenames_only",
  "paths": {
    "test": ["test/"],
    "docs": ["docs/"],
    "exclude": ["node_modules/", "build/"]
  },
  "relationships": [
    {"type": "documents", "target": "prebid/prebid.github.io", "description": "Documentation site"}
  ]
}"#;

pub const PREBID_JS_DOCUMENT: &str = r#"{
  "repo_name": "prebid/Prebid.js",
  "extends": "../shared/prebid-base.json",
  "repo_type": "prebid-js",
  "description": "Header bidding library",
  "module_categories": {
    "bid_adapter": {
      "display_name": "Bid Adapter",
      "paths": ["modules/"],
      "patterns": [
        {"pattern": "*BidAdapter.js", "type": "suffix", "name_extraction": "remove-suffix:BidAdapter"}
      ]
    },
    "analytics_adapter": {
      "display_name": "Analytics Adapter",
      "paths": ["modules/"],
      "patterns": [
        {"pattern": "*AnalyticsAdapter.js", "type": "suffix", "name_extraction": "remove-suffix:AnalyticsAdapter"}
      ]
    },
    "rtd_module": {
      "display_name": "Real-Time Data Module",
      "paths": ["modules/"],
      "patterns": [
        {"pattern": "*RtdProvider.js", "type": "suffix", "name_extraction": "remove-suffix:RtdProvider"}
      ]
    },
    "core": {
      "display_name": "Core",
      "paths": ["src/"],
      "patterns": [
        {"pattern": "src/**/*.js", "type": "glob", "exclude_patterns": ["*.test.js"]}
      ]
    }
  },
  "paths": {
    "core": ["src/"],
    "test": ["test/spec/"]
  },
  "version_overrides": {
    "v10.0+": {
      "module_categories": {
        "bid_adapter": {
          "display_name": "Bid Adapter",
          "paths": ["metadata/modules/"],
          "detection_strategy": "metadata_file",
          "metadata_field": "componentType",
          "metadata_value": "bidder",
          "patterns": [
            {"pattern": "*BidAdapter.json", "type": "suffix", "name_extraction": "remove-suffix:BidAdapter"}
          ]
        }
      }
    }
  },
  "relationships": [
    {"type": "uses_modules_from", "target": "prebid/prebid-server"}
  ]
}"#;

pub const PREBID_SERVER_DOCUMENT: &str = r#"{
  "repo_name": "prebid/prebid-server",
  "extends": "../shared/prebid-base.json",
  "repo_type": "prebid-server-go",
  "detection_strategy": "directory_based",
  "module_categories": {
    "bid_adapter": {
      "display_name": "Bid Adapter",
      "paths": ["adapters/"],
      "patterns": [
        {"pattern": "adapters/*", "type": "directory", "name_extraction": "parent-directory",
         "exclude_patterns": ["*_test.go"]}
      ]
    },
    "analytics_module": {
      "display_name": "Analytics Module",
      "paths": ["analytics/"],
      "patterns": [
        {"pattern": "analytics/*", "type": "directory", "name_extraction": "parent-directory"}
      ]
    },
    "exchange": {
      "display_name": "Exchange",
      "patterns": [
        {"pattern": "^exchange/.*\\.go$", "type": "regex"}
      ]
    }
  },
  "paths": {
    "core": ["exchange/", "openrtb_ext/"]
  }
}"#;

/// Every fixture document, keyed by document id.
pub const PREBID_DOCUMENTS: [(&str, &str); 3] = [
    (BASE_ID, BASE_DOCUMENT),
    (PREBID_JS_ID, PREBID_JS_DOCUMENT),
    (PREBID_SERVER_ID, PREBID_SERVER_DOCUMENT),
];

/// An in-memory source holding [`PREBID_DOCUMENTS`].
pub fn prebid_memory_source() -> MemorySource {
    let source = MemorySource::new();
    for (id, body) in PREBID_DOCUMENTS {
        source.insert(id, body);
    }
    source
}
