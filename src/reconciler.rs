//! # Build-Time Reconciliation
//!
//! For every repository a build needs, decides once per invocation how its
//! cache entry gets materialized: symlinked from a fresh vendored copy,
//! freshly fetched (possibly with a staleness warning), symlinked from a
//! stale vendored copy when offline, or failed outright when the repository
//! was never vendored and fetching is disabled.
//!
//! The decision is local to each repository. A missing repository in offline
//! mode only fails the targets that depend on it; unrelated repositories
//! keep resolving.
//!
//! Decision table, per repository:
//!
//! | Condition | Action |
//! |---|---|
//! | kind is Local or Configured | normal fetch path, vendor store never consulted |
//! | fresh vendor entry | symlink cache entry to vendor content, no fetch |
//! | stale vendor entry, fetching allowed | real fetch, warn out-of-date |
//! | stale vendor entry, fetching disabled | symlink stale content, warn |
//! | no vendor entry, fetching allowed | standard fetch |
//! | no vendor entry, fetching disabled | fail with remediation |

use std::path::PathBuf;

use log::warn;

use crate::cache::ExternalCache;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::fingerprint::fingerprint;
use crate::graph::RepoGraph;
use crate::repo::RepoId;
use crate::vendor::VendorStore;

/// How a repository ended up being materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Symlinked from an up-to-date vendored copy. No fetch.
    SymlinkedFresh,
    /// Symlinked from an out-of-date vendored copy (offline). Warned.
    SymlinkedStale,
    /// Fetched through the standard non-vendor flow.
    Fetched,
    /// Fetched because the vendored copy was out-of-date. Warned.
    FetchedStale,
    /// Local/configured repository resolved via the normal fetch path.
    LocalPath,
}

/// A repository's resolved build-time location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepo {
    pub id: RepoId,
    /// The cache entry path the build reads from.
    pub path: PathBuf,
    pub outcome: ReconcileOutcome,
}

/// Arbitrates between the external cache and the vendor store for each
/// repository a build needs.
pub struct Reconciler<'a> {
    graph: &'a RepoGraph,
    cache: &'a ExternalCache,
    store: &'a VendorStore,
    fetcher: &'a dyn Fetcher,
    /// False in offline (`--no-fetch`) mode.
    fetch_enabled: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        graph: &'a RepoGraph,
        cache: &'a ExternalCache,
        store: &'a VendorStore,
        fetcher: &'a dyn Fetcher,
        fetch_enabled: bool,
    ) -> Self {
        Self {
            graph,
            cache,
            store,
            fetcher,
            fetch_enabled,
        }
    }

    /// Resolves one repository per the decision table.
    pub fn reconcile(&self, id: &RepoId) -> Result<ResolvedRepo> {
        let definition = self
            .graph
            .definition(id)
            .ok_or_else(|| Error::RepoNotDefined {
                repo: id.to_string(),
            })?;
        let kind = self.graph.kind(id).ok_or_else(|| Error::RepoNotDefined {
            repo: id.to_string(),
        })?;

        // Local and configured repositories never go through the vendor
        // store: their content is machine-local and fetching it does not
        // touch the network.
        if !kind.is_vendorable() {
            let entry = self.cache.ensure_fetched(id, definition, self.fetcher)?;
            return Ok(ResolvedRepo {
                id: id.clone(),
                path: entry.path,
                outcome: ReconcileOutcome::LocalPath,
            });
        }

        let current = fingerprint(definition);
        if self.store.is_up_to_date(id, &current)? {
            let entry =
                self.cache
                    .install_symlink(id, &self.store.entry_path(id), Some(&current))?;
            return Ok(ResolvedRepo {
                id: id.clone(),
                path: entry.path,
                outcome: ReconcileOutcome::SymlinkedFresh,
            });
        }

        if self.store.has(id) {
            // Vendored but stale.
            if self.fetch_enabled {
                warn!(
                    "Vendored repository '{}' is out-of-date. The up-to-date version will be \
                     fetched into the external cache and used. To update the repo in the vendor \
                     directory, run 'repo-vendor vendor'",
                    id
                );
                // ensure_fetched discards any cache entry recorded under the
                // old fingerprint, including a symlink into the stale copy
                let entry = self.cache.ensure_fetched(id, definition, self.fetcher)?;
                return Ok(ResolvedRepo {
                    id: id.clone(),
                    path: entry.path,
                    outcome: ReconcileOutcome::FetchedStale,
                });
            }
            warn!(
                "Vendored repository '{}' is out-of-date and fetching is disabled. Run without \
                 '--no-fetch' or run 'repo-vendor vendor' to update it",
                id
            );
            // Recording the stale fingerprint keeps a later online run
            // refetching instead of trusting this link.
            let stale = self.store.read_marker(id)?.map(|marker| marker.fingerprint);
            let entry =
                self.cache
                    .install_symlink(id, &self.store.entry_path(id), stale.as_ref())?;
            return Ok(ResolvedRepo {
                id: id.clone(),
                path: entry.path,
                outcome: ReconcileOutcome::SymlinkedStale,
            });
        }

        // Never vendored.
        if self.fetch_enabled {
            let entry = self.cache.ensure_fetched(id, definition, self.fetcher)?;
            return Ok(ResolvedRepo {
                id: id.clone(),
                path: entry.path,
                outcome: ReconcileOutcome::Fetched,
            });
        }
        Err(Error::MissingOfflineRepo {
            repo: id.to_string(),
        })
    }
}
