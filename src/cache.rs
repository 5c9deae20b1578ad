//! # External Repository Cache
//!
//! The external cache is the ephemeral durability tier: one materialized
//! directory per canonical repository identity, created by fetch and
//! destroyed by cache-clear operations. It is rebuildable by definition, so
//! destroying it at any time is safe; everything durable lives in the vendor
//! store.
//!
//! ## Single-flight fetches
//!
//! Concurrent `ensure_fetched` calls for the same `RepoId` serialize on a
//! per-identity lock so the underlying fetch runs at most once; calls for
//! different identities proceed independently. The lock table is the explicit
//! keyed-mutex the cache contract requires — callers never coordinate among
//! themselves.
//!
//! ## Entry atomicity
//!
//! A fetch materializes into a temporary sibling directory and is renamed
//! into place only after the fetcher returns successfully, so a cache entry
//! either exists in full or not at all.
//!
//! ## Staleness
//!
//! Each entry carries a sidecar file recording the definition fingerprint it
//! was materialized under. `ensure_fetched` trusts an existing entry only
//! when that record matches the current definition; otherwise the entry is
//! discarded and refetched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::fsutil;
use crate::repo::{RepoDefinition, RepoId};

/// A materialized cache entry: the on-disk location of one repository's
/// contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: RepoId,
    pub path: PathBuf,
}

/// On-disk cache of fetched repository contents, keyed by canonical identity.
#[derive(Debug)]
pub struct ExternalCache {
    root: PathBuf,
    /// Per-RepoId fetch locks (single-flight).
    locks: Mutex<HashMap<RepoId, Arc<Mutex<()>>>>,
}

impl ExternalCache {
    /// Opens (and creates if needed) a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The on-disk location of the entry for `id`, whether or not it exists.
    pub fn entry_path(&self, id: &RepoId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Whether an entry for `id` currently exists.
    pub fn contains(&self, id: &RepoId) -> bool {
        // A symlinked entry counts: symlink_metadata sees the link itself.
        fs::symlink_metadata(self.entry_path(id)).is_ok()
    }

    /// Whether the entry for `id` is an installed link into the vendor store
    /// rather than directly materialized content.
    pub fn is_symlinked(&self, id: &RepoId) -> bool {
        fs::symlink_metadata(self.entry_path(id))
            .map(|m| m.is_symlink())
            .unwrap_or(false)
    }

    /// Returns the entry for `id`, fetching it first if absent or stale.
    ///
    /// An entry whose recorded fingerprint matches the current definition is
    /// returned unchanged; anything else is discarded and `fetcher` runs.
    /// Concurrent calls for the same identity await the first caller's fetch
    /// instead of duplicating it.
    pub fn ensure_fetched(
        &self,
        id: &RepoId,
        definition: &RepoDefinition,
        fetcher: &dyn Fetcher,
    ) -> Result<CacheEntry> {
        let lock = self.key_lock(id)?;
        let _guard = lock.lock().map_err(|_| Error::LockPoisoned {
            context: format!("fetch lock for repository '{}'", id),
        })?;

        let entry = self.entry_path(id);
        let current = fingerprint(definition);
        if fs::symlink_metadata(&entry).is_ok() {
            if self.recorded_fingerprint(id).as_ref() == Some(&current) {
                return Ok(CacheEntry {
                    id: id.clone(),
                    path: entry,
                });
            }
            fsutil::remove_existing(&entry)?;
            fsutil::remove_existing(&self.fingerprint_path(id))?;
        }

        let staging = tempfile::Builder::new()
            .prefix(&format!(".fetch-{}-", id.as_str()))
            .tempdir_in(&self.root)?;
        let staging_path = staging.keep();
        let fetched = fetcher.fetch(id, definition, &staging_path);
        match fetched {
            Ok(()) => {
                fs::rename(&staging_path, &entry)?;
                fs::write(self.fingerprint_path(id), current.as_str())?;
                Ok(CacheEntry {
                    id: id.clone(),
                    path: entry,
                })
            }
            Err(e) => {
                let _ = fsutil::remove_existing(&staging_path);
                Err(e)
            }
        }
    }

    /// Replaces the entry for `id` with an OS-level link pointing at
    /// `target`.
    ///
    /// Used when serving a repository from the vendor store: the build sees a
    /// normal cache entry whose content lives in the durable tier.
    /// `content_fingerprint` is what the linked content was produced from;
    /// `None` means unknown, so a later `ensure_fetched` will refetch.
    pub fn install_symlink(
        &self,
        id: &RepoId,
        target: &Path,
        content_fingerprint: Option<&Fingerprint>,
    ) -> Result<CacheEntry> {
        let lock = self.key_lock(id)?;
        let _guard = lock.lock().map_err(|_| Error::LockPoisoned {
            context: format!("fetch lock for repository '{}'", id),
        })?;

        let entry = self.entry_path(id);
        fsutil::remove_existing(&entry)?;
        make_dir_link(target, &entry)?;
        match content_fingerprint {
            Some(fp) => fs::write(self.fingerprint_path(id), fp.as_str())?,
            None => fsutil::remove_existing(&self.fingerprint_path(id))?,
        }
        Ok(CacheEntry {
            id: id.clone(),
            path: entry,
        })
    }

    /// Destroys all entries unconditionally.
    ///
    /// Safe at any time: the cache is rebuildable from the definitions.
    pub fn clear(&self) -> Result<()> {
        for child in fs::read_dir(&self.root)? {
            fsutil::remove_existing(&child?.path())?;
        }
        Ok(())
    }

    fn fingerprint_path(&self, id: &RepoId) -> PathBuf {
        self.root.join(format!("@{}.fingerprint", id.as_str()))
    }

    fn recorded_fingerprint(&self, id: &RepoId) -> Option<Fingerprint> {
        fs::read_to_string(self.fingerprint_path(id))
            .ok()
            .map(|content| Fingerprint::from_hex(content.trim()))
    }

    fn key_lock(&self, id: &RepoId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| Error::LockPoisoned {
            context: "cache lock table".to_string(),
        })?;
        Ok(Arc::clone(locks.entry(id.clone()).or_default()))
    }
}

#[cfg(unix)]
fn make_dir_link(target: &Path, at: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, at)?;
    Ok(())
}

/// On Windows directory symlinks require elevation on older setups; a
/// junction would be the fallback, but `symlink_dir` covers the supported
/// configurations (developer mode or symlink privilege).
#[cfg(windows)]
fn make_dir_link(target: &Path, at: &Path) -> Result<()> {
    std::os::windows::fs::symlink_dir(target, at)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Mock fetcher that counts invocations and writes a single file.
    struct CountingFetcher {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(50),
            }
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, id: &RepoId, _definition: &RepoDefinition, dest: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            fs::write(dest.join("MARKER"), id.as_str())?;
            Ok(())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, id: &RepoId, _definition: &RepoDefinition, _dest: &Path) -> Result<()> {
            Err(Error::Fetch {
                repo: id.to_string(),
                message: "network unreachable".to_string(),
                hint: None,
            })
        }
    }

    fn new_cache() -> (TempDir, ExternalCache) {
        let dir = TempDir::new().unwrap();
        let cache = ExternalCache::new(dir.path().join("external")).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_ensure_fetched_materializes_once() {
        let (_dir, cache) = new_cache();
        let fetcher = CountingFetcher::new();
        let id = RepoId::new("aaa");
        let def = RepoDefinition::new("dir");

        let entry = cache.ensure_fetched(&id, &def, &fetcher).unwrap();
        assert!(entry.path.join("MARKER").exists());
        assert_eq!(fetcher.count(), 1);

        // Second call returns the existing entry unchanged
        let again = cache.ensure_fetched(&id, &def, &fetcher).unwrap();
        assert_eq!(again.path, entry.path);
        assert_eq!(fetcher.count(), 1);
    }

    #[test]
    fn test_failed_fetch_leaves_no_entry() {
        let (_dir, cache) = new_cache();
        let id = RepoId::new("aaa");
        let def = RepoDefinition::new("dir");

        let err = cache.ensure_fetched(&id, &def, &FailingFetcher).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
        assert!(!cache.contains(&id));
        // No staging leftovers either
        assert_eq!(fs::read_dir(cache.root()).unwrap().count(), 0);

        // A later fetch can still succeed
        let fetcher = CountingFetcher::new();
        cache.ensure_fetched(&id, &def, &fetcher).unwrap();
        assert!(cache.contains(&id));
    }

    #[test]
    fn test_single_flight_same_repo() {
        let (_dir, cache) = new_cache();
        let cache = Arc::new(cache);
        let fetcher = Arc::new(CountingFetcher::slow());
        let def = RepoDefinition::new("dir");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let fetcher = Arc::clone(&fetcher);
                let def = def.clone();
                std::thread::spawn(move || {
                    cache
                        .ensure_fetched(&RepoId::new("aaa"), &def, fetcher.as_ref())
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Four concurrent callers, one fetch
        assert_eq!(fetcher.count(), 1);
    }

    #[test]
    fn test_different_repos_fetch_independently() {
        let (_dir, cache) = new_cache();
        let cache = Arc::new(cache);
        let fetcher = Arc::new(CountingFetcher::new());
        let def = RepoDefinition::new("dir");

        let handles: Vec<_> = ["aaa", "bbb", "ccc"]
            .into_iter()
            .map(|name| {
                let cache = Arc::clone(&cache);
                let fetcher = Arc::clone(&fetcher);
                let def = def.clone();
                std::thread::spawn(move || {
                    cache
                        .ensure_fetched(&RepoId::new(name), &def, fetcher.as_ref())
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(fetcher.count(), 3);
        assert!(cache.contains(&RepoId::new("aaa")));
        assert!(cache.contains(&RepoId::new("bbb")));
        assert!(cache.contains(&RepoId::new("ccc")));
    }

    #[cfg(unix)]
    #[test]
    fn test_install_symlink_replaces_entry() {
        let (dir, cache) = new_cache();
        let fetcher = CountingFetcher::new();
        let id = RepoId::new("aaa");
        let def = RepoDefinition::new("dir");
        cache.ensure_fetched(&id, &def, &fetcher).unwrap();
        assert!(!cache.is_symlinked(&id));

        let vendored = dir.path().join("vendor/aaa");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(vendored.join("BUILD"), b"x").unwrap();

        let fp = crate::fingerprint::fingerprint(&def);
        let entry = cache.install_symlink(&id, &vendored, Some(&fp)).unwrap();
        assert!(cache.is_symlinked(&id));
        assert!(entry.path.join("BUILD").exists());
    }

    #[test]
    fn test_changed_definition_refetches() {
        let (_dir, cache) = new_cache();
        let fetcher = CountingFetcher::new();
        let id = RepoId::new("aaa");

        let v1 = RepoDefinition::new("dir").with_attr("rev", "1");
        cache.ensure_fetched(&id, &v1, &fetcher).unwrap();
        assert_eq!(fetcher.count(), 1);

        // Same definition: entry is trusted
        cache.ensure_fetched(&id, &v1, &fetcher).unwrap();
        assert_eq!(fetcher.count(), 1);

        // Changed definition: entry is discarded and refetched
        let v2 = RepoDefinition::new("dir").with_attr("rev", "2");
        cache.ensure_fetched(&id, &v2, &fetcher).unwrap();
        assert_eq!(fetcher.count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_with_stale_fingerprint_is_refetched() {
        let (dir, cache) = new_cache();
        let id = RepoId::new("aaa");
        let vendored = dir.path().join("vendor/aaa");
        fs::create_dir_all(&vendored).unwrap();

        let old = RepoDefinition::new("dir").with_attr("rev", "1");
        let old_fp = crate::fingerprint::fingerprint(&old);
        cache.install_symlink(&id, &vendored, Some(&old_fp)).unwrap();

        let new = RepoDefinition::new("dir").with_attr("rev", "2");
        let fetcher = CountingFetcher::new();
        cache.ensure_fetched(&id, &new, &fetcher).unwrap();
        assert_eq!(fetcher.count(), 1);
        assert!(!cache.is_symlinked(&id));
    }

    #[test]
    fn test_clear_removes_all_entries() {
        let (_dir, cache) = new_cache();
        let fetcher = CountingFetcher::new();
        let def = RepoDefinition::new("dir");
        cache.ensure_fetched(&RepoId::new("aaa"), &def, &fetcher).unwrap();
        cache.ensure_fetched(&RepoId::new("bbb"), &def, &fetcher).unwrap();

        cache.clear().unwrap();
        assert!(!cache.contains(&RepoId::new("aaa")));
        assert!(!cache.contains(&RepoId::new("bbb")));

        // The cache is rebuildable after clearing
        cache.ensure_fetched(&RepoId::new("aaa"), &def, &fetcher).unwrap();
        assert!(cache.contains(&RepoId::new("aaa")));
    }
}
