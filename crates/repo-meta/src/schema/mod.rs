//! Typed repository layout documents
//!
//! Documents are JSON with snake_case keys:
//!
//! ```json
//! {
//!   "repo_name": "prebid/Prebid.js",
//!   "repo_type": "prebid-js",
//!   "extends": "../shared/prebid-base.json",
//!   "module_categories": {
//!     "bid_adapter": {
//!       "display_name": "Bid Adapters",
//!       "paths": ["modules/"],
//!       "patterns": [
//!         { "pattern": "*BidAdapter.js", "type": "suffix",
//!           "name_extraction": "remove-suffix:BidAdapter" }
//!       ]
//!     }
//!   },
//!   "version_overrides": { "v10.0+": { "module_categories": { } } }
//! }
//! ```
//!
//! A raw document and a version override share one partial shape,
//! [`ConfigFragment`]. After inheritance has been resolved the fragment is
//! turned into a [`RepositoryConfig`], which has every field filled in.

pub mod category;
pub mod fragment;
pub mod repository;

pub use category::{
    DetectionStrategy, ModuleCategory, ModulePattern, NameExtraction, PatternType,
};
pub use fragment::{ConfigFragment, PathsFragment};
pub use repository::{
    FetchStrategy, GLOB_OPTIONS, Relationship, RelationshipType, RepositoryConfig, RepositoryPaths,
    is_glob_entry,
};
