//! Reconcile command implementation
//!
//! The reconcile command materializes external repositories into the cache
//! the way a build would: up-to-date vendored content is symlinked, stale
//! content is refetched (or used with a warning when fetching is disabled),
//! and unvendored repositories fail offline runs.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_vendor::cache::ExternalCache;
use repo_vendor::config;
use repo_vendor::fetch::DefaultFetcher;
use repo_vendor::graph::RepoGraph;
use repo_vendor::reconciler::{ReconcileOutcome, Reconciler};
use repo_vendor::repo::{RepoId, RepoSpecifier};
use repo_vendor::resolver;
use repo_vendor::vendor::VendorStore;

use super::vendor::default_cache_root;

/// Arguments for the reconcile command
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Path to the manifest file
    #[arg(short, long, value_name = "PATH", env = "REPO_VENDOR_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Vendor directory (defaults to ./vendor)
    #[arg(long, value_name = "DIR", env = "REPO_VENDOR_DIR", default_value = "vendor")]
    pub vendor_dir: PathBuf,

    /// External cache root directory
    #[arg(long, value_name = "DIR", env = "REPO_VENDOR_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Reconcile only this repository (`@apparent` or `@@canonical`,
    /// repeatable; defaults to every repository in the manifest)
    #[arg(long = "repo", value_name = "SPECIFIER")]
    pub repos: Vec<String>,

    /// Do not fetch anything; rely on the cache and the vendor directory
    #[arg(long)]
    pub no_fetch: bool,
}

/// Execute the reconcile command
pub fn execute(args: ReconcileArgs) -> Result<()> {
    let manifest_path = args
        .manifest
        .unwrap_or_else(|| PathBuf::from(config::MANIFEST_FILE));
    let graph = config::from_file(&manifest_path)?;

    let cache_root = args.cache_root.unwrap_or_else(default_cache_root);
    let cache = ExternalCache::new(cache_root)?;
    let store = VendorStore::new(&args.vendor_dir)?;

    let (selected, mut failures) = select(&graph, &args.repos)?;
    for message in &failures {
        eprintln!("Error: {}", message);
    }
    let total = selected.len() + failures.len();

    let reconciler = Reconciler::new(&graph, &cache, &store, &DefaultFetcher, !args.no_fetch);
    for id in &selected {
        match reconciler.reconcile(id) {
            Ok(resolved) => println!(
                "{:<32} {:<16} {}",
                resolved.id,
                outcome_label(resolved.outcome),
                resolved.path.display()
            ),
            Err(err) => {
                eprintln!("Error: {}", err);
                failures.push(err.to_string());
            }
        }
    }

    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} repositories failed to reconcile",
            failures.len(),
            total
        );
    }
    Ok(())
}

/// Expands the `--repo` specifiers into canonical identities.
///
/// Specifier-syntax errors abort immediately. Resolution failures are
/// collected and returned alongside the resolvable identities, so one bad
/// specifier never stops the siblings from being reconciled.
fn select(graph: &RepoGraph, raw_specifiers: &[String]) -> Result<(Vec<RepoId>, Vec<String>)> {
    if raw_specifiers.is_empty() {
        return Ok((graph.repo_ids().cloned().collect(), Vec::new()));
    }
    let specifiers = raw_specifiers
        .iter()
        .map(|raw| RepoSpecifier::parse(raw))
        .collect::<repo_vendor::error::Result<Vec<_>>>()?;
    let mut selected = Vec::new();
    let mut errors = Vec::new();
    for specifier in &specifiers {
        match resolver::resolve(graph, specifier, None) {
            Ok(id) => selected.push(id),
            Err(e) => errors.push(e.to_string()),
        }
    }
    selected.sort();
    selected.dedup();
    Ok((selected, errors))
}

fn outcome_label(outcome: ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::SymlinkedFresh => "vendored",
        ReconcileOutcome::SymlinkedStale => "vendored-stale",
        ReconcileOutcome::Fetched => "fetched",
        ReconcileOutcome::FetchedStale => "refetched",
        ReconcileOutcome::LocalPath => "local",
    }
}
