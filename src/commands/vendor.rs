//! Vendor command implementation
//!
//! The vendor command fetches the selected external repositories into the
//! external cache and copies them into the vendor directory:
//! 1. Parse the manifest into a repository graph
//! 2. Select repositories (everything, or the `--repo` specifiers)
//! 3. Skip unvendorable and up-to-date repositories
//! 4. Fetch the rest in parallel and copy each into the vendor directory
//!
//! Per-repository failures do not stop the run: every selected repository
//! is attempted, and the failures are reported together at the end.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_vendor::cache::ExternalCache;
use repo_vendor::config;
use repo_vendor::fetch::DefaultFetcher;
use repo_vendor::orchestrator::{self, Selection};
use repo_vendor::vendor::VendorStore;

/// Arguments for the vendor command
#[derive(Args, Debug)]
pub struct VendorArgs {
    /// Path to the manifest file
    #[arg(short, long, value_name = "PATH", env = "REPO_VENDOR_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Vendor directory (defaults to ./vendor)
    #[arg(long, value_name = "DIR", env = "REPO_VENDOR_DIR", default_value = "vendor")]
    pub vendor_dir: PathBuf,

    /// External cache root directory
    #[arg(long, value_name = "DIR", env = "REPO_VENDOR_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Vendor only this repository (`@apparent` or `@@canonical`, repeatable)
    #[arg(long = "repo", value_name = "SPECIFIER")]
    pub repos: Vec<String>,

    /// Suppress the summary output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the vendor command
pub fn execute(args: VendorArgs) -> Result<()> {
    let manifest_path = args
        .manifest
        .unwrap_or_else(|| PathBuf::from(config::MANIFEST_FILE));
    let graph = config::from_file(&manifest_path)?;

    let cache_root = args.cache_root.unwrap_or_else(default_cache_root);
    let cache = ExternalCache::new(cache_root)?;
    let store = VendorStore::new(&args.vendor_dir)?;

    let selection = if args.repos.is_empty() {
        Selection::Default
    } else {
        Selection::Repos(args.repos.clone())
    };

    let report = orchestrator::vendor(&graph, &cache, &store, &DefaultFetcher, &selection)?;

    if !args.quiet {
        println!(
            "Vendored {} repositories into {} ({} already up-to-date, {} excluded)",
            report.vendored.len(),
            args.vendor_dir.display(),
            report.skipped.len(),
            report.excluded.len(),
        );
    }
    Ok(())
}

/// Default cache root: the platform cache directory, e.g.
/// `~/.cache/repo-vendor` on Linux.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".repo-vendor-cache"))
        .join("repo-vendor")
}
