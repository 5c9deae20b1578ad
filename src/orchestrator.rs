//! # Vendor Orchestrator
//!
//! Drives a `vendor` invocation end to end: computes the candidate
//! repository set from the requested selection, applies the exclusion policy
//! (repository kind, ignore list), then fetches, fingerprints, and copies
//! each candidate into the vendor store. Candidates are processed as
//! independent parallel tasks; per-repository failures are collected and
//! reported together after every candidate has been attempted.
//!
//! Vendoring is idempotent and incremental: a candidate whose vendor entry
//! already carries the current definition fingerprint is skipped entirely —
//! no re-copy and no re-fetch.

use std::sync::Mutex;

use log::{debug, info};
use rayon::prelude::*;

use crate::cache::ExternalCache;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::fingerprint::fingerprint;
use crate::graph::RepoGraph;
use crate::repo::RepoId;
use crate::resolver;
use crate::vendor::VendorStore;

/// What to vendor.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Every repository reachable from evaluating the whole workspace.
    /// The only selection mode the ignore list applies to.
    Default,
    /// Raw repository specifiers (`@alias` / `@@name`), resolved against the
    /// main repository's mapping.
    Repos(Vec<String>),
    /// Canonical identities pre-expanded from build targets by the
    /// build-graph collaborator. Treated as explicit intent, like `Repos`.
    Targets(Vec<RepoId>),
}

/// Result of a successful vendor invocation.
#[derive(Debug, Default)]
pub struct VendorReport {
    /// Repositories copied (or re-copied) into the store.
    pub vendored: Vec<RepoId>,
    /// Repositories already up-to-date in the store. Skips are not warnings.
    pub skipped: Vec<RepoId>,
    /// Repositories excluded by kind or by the ignore list.
    pub excluded: Vec<RepoId>,
}

/// Vendors the selected repositories into `store`.
///
/// Specifier-syntax errors abort immediately, before any I/O. All other
/// per-repository errors (resolution, fetch, copy) are aggregated into a
/// single `VendoringFailed` reported after every candidate was attempted.
pub fn vendor(
    graph: &RepoGraph,
    cache: &ExternalCache,
    store: &VendorStore,
    fetcher: &dyn Fetcher,
    selection: &Selection,
) -> Result<VendorReport> {
    // The ignore list is read (and created on first run) regardless of the
    // selection mode; its subtraction only applies to the default selection.
    let ignored = store.ignore_list()?;
    let apply_ignore_list = matches!(selection, Selection::Default);

    let mut errors: Vec<String> = Vec::new();
    let mut resolved: Vec<RepoId> = Vec::new();
    match selection {
        Selection::Default => {
            resolved.extend(graph.repo_ids().cloned());
        }
        Selection::Repos(raw_specifiers) => {
            // Syntax is validated for the whole list up front; a malformed
            // specifier fails the invocation before any lookup or fetch.
            let specifiers = raw_specifiers
                .iter()
                .map(|raw| crate::repo::RepoSpecifier::parse(raw))
                .collect::<Result<Vec<_>>>()?;
            for specifier in &specifiers {
                match resolver::resolve(graph, specifier, None) {
                    Ok(id) => resolved.push(id),
                    Err(e) => errors.push(e.to_string()),
                }
            }
        }
        Selection::Targets(ids) => {
            for id in ids {
                if graph.contains(id) {
                    resolved.push(id.clone());
                } else {
                    errors.push(
                        Error::RepoNotDefined {
                            repo: id.to_string(),
                        }
                        .to_string(),
                    );
                }
            }
        }
    }
    resolved.sort();
    resolved.dedup();

    let mut report = VendorReport::default();
    let mut candidates: Vec<RepoId> = Vec::new();
    for id in resolved {
        let vendorable = graph.kind(&id).is_some_and(|kind| kind.is_vendorable());
        if !vendorable || (apply_ignore_list && ignored.contains(&id)) {
            debug!("Excluding repository '{}' from vendoring", id);
            report.excluded.push(id);
        } else {
            candidates.push(id);
        }
    }

    // Independent repositories vendor in parallel; one failure never aborts
    // the siblings.
    let failures: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let vendored: Mutex<Vec<RepoId>> = Mutex::new(Vec::new());
    let skipped: Mutex<Vec<RepoId>> = Mutex::new(Vec::new());
    candidates.par_iter().for_each(|id| {
        match vendor_one(graph, cache, store, fetcher, id) {
            Ok(true) => vendored.lock().unwrap().push(id.clone()),
            Ok(false) => skipped.lock().unwrap().push(id.clone()),
            Err(e) => failures.lock().unwrap().push(e.to_string()),
        }
    });

    report.vendored = vendored.into_inner().unwrap();
    report.skipped = skipped.into_inner().unwrap();
    report.vendored.sort();
    report.skipped.sort();

    errors.extend(failures.into_inner().unwrap());
    if errors.is_empty() {
        Ok(report)
    } else {
        Err(Error::VendoringFailed { errors })
    }
}

/// Vendors a single candidate. Returns `Ok(true)` if content was copied,
/// `Ok(false)` if the existing entry was already up-to-date.
fn vendor_one(
    graph: &RepoGraph,
    cache: &ExternalCache,
    store: &VendorStore,
    fetcher: &dyn Fetcher,
    id: &RepoId,
) -> Result<bool> {
    let definition = graph
        .definition(id)
        .ok_or_else(|| Error::RepoNotDefined {
            repo: id.to_string(),
        })?;
    let current = fingerprint(definition);

    if store.is_up_to_date(id, &current)? {
        debug!("Repository '{}' already vendored and up-to-date", id);
        return Ok(false);
    }

    let entry = cache.ensure_fetched(id, definition, fetcher)?;
    store.write(id, &entry.path, &current, &definition.rule)?;
    info!("Vendored repository '{}'", id);
    Ok(true)
}
