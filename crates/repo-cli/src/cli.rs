//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Repository layout engine - classify files in known repositories
#[derive(Parser, Debug)]
#[command(name = "repo-layout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the layout documents
    #[arg(
        short,
        long,
        global = true,
        env = "REPO_LAYOUT_CONFIG",
        default_value = "config"
    )]
    pub config: PathBuf,

    /// Engine options file (TOML)
    #[arg(long, global = true)]
    pub options: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate every repository document
    ///
    /// Exits non-zero when any document fails to load or has errors.
    Validate,

    /// List known repositories
    List,

    /// Classify a file path within a repository
    ///
    /// Examples:
    ///   repo-layout categorize prebid/Prebid.js modules/rubiconBidAdapter.js
    ///   repo-layout categorize prebid/Prebid.js metadata/modules/rubiconBidAdapter.json --version v10.0
    Categorize {
        /// Repository name or GitHub URL
        repo: String,

        /// Repository-relative file path
        path: String,

        /// Repository version to specialise for
        #[arg(long = "repo-version", visible_alias = "at")]
        version: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration of a repository
    Show {
        /// Repository name or GitHub URL
        repo: String,

        /// Repository version to specialise for
        #[arg(long = "repo-version", visible_alias = "at")]
        version: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List repositories related to a repository
    Related {
        /// Repository name or GitHub URL
        repo: String,
    },
}
