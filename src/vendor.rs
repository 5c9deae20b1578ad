//! # Vendor Store
//!
//! The durable tier: a user-controlled directory holding one copied content
//! directory per vendored repository, one `@<name>.marker` record per
//! repository, and a `.vendorignore` list at the root. The store survives
//! external-cache destruction; entries persist until re-vendored or deleted
//! by the user.
//!
//! ## Crash atomicity
//!
//! `write` stages the new content as a temporary sibling, then invalidates
//! the old marker, swaps the content directory into place, and persists the
//! new marker last. A crash at any point leaves either the old state or
//! content without a current marker, which reads as stale; a fresh marker
//! never describes partial content. The swap is not atomic for concurrent
//! readers: between the old entry's removal and the staged rename the entry
//! is briefly absent, so readers racing a vendor run can see a missing or
//! stale entry, never a fresh-looking one with wrong content.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::fsutil;
use crate::repo::RepoId;

/// File name of the persisted ignore list at the store root.
pub const VENDOR_IGNORE: &str = ".vendorignore";

/// Persisted record proving a vendored copy matches a specific definition.
///
/// The fingerprint is the authoritative field; rule and timestamp are
/// diagnostics and never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub fingerprint: Fingerprint,
    pub rule: String,
    /// Seconds since the Unix epoch at vendoring time.
    pub vendored_at: u64,
}

/// Durable directory of vendored repository contents plus marker records.
#[derive(Debug)]
pub struct VendorStore {
    root: PathBuf,
}

impl VendorStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The content directory for `id`, whether or not it exists.
    pub fn entry_path(&self, id: &RepoId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn marker_path(&self, id: &RepoId) -> PathBuf {
        self.root.join(id.marker_file_name())
    }

    /// Whether a content directory for `id` exists.
    pub fn has(&self, id: &RepoId) -> bool {
        self.entry_path(id).is_dir()
    }

    /// Reads the marker record for `id`.
    ///
    /// A missing marker returns `Ok(None)`. An unreadable or corrupt marker
    /// also reads as `None` (with a warning): the entry is then simply
    /// stale and the next vendor run rewrites it.
    pub fn read_marker(&self, id: &RepoId) -> Result<Option<Marker>> {
        let path = self.marker_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(marker) => Ok(Some(marker)),
            Err(e) => {
                warn!(
                    "Ignoring corrupt marker for repository '{}' at {}: {}",
                    id,
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Whether the vendored copy of `id` matches `current`.
    pub fn is_up_to_date(&self, id: &RepoId, current: &Fingerprint) -> Result<bool> {
        if !self.has(id) {
            return Ok(false);
        }
        Ok(self
            .read_marker(id)?
            .is_some_and(|marker| marker.fingerprint == *current))
    }

    /// Copies `content_src` into the store under `id`, then commits a marker
    /// carrying `fingerprint` and `rule`.
    ///
    /// Replaces any previous entry. The marker rename happens strictly after
    /// the content rename (write-marker-last).
    pub fn write(
        &self,
        id: &RepoId,
        content_src: &Path,
        fingerprint: &Fingerprint,
        rule: &str,
    ) -> Result<()> {
        let marker = Marker {
            fingerprint: fingerprint.clone(),
            rule: rule.to_string(),
            vendored_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        let marker_json =
            serde_json::to_string_pretty(&marker).map_err(|e| Error::Marker {
                repo: id.to_string(),
                message: e.to_string(),
            })?;

        // Stage the content copy next to its final location so the rename
        // stays on one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(&format!(".vendor-{}-", id.as_str()))
            .tempdir_in(&self.root)?;
        let staging_path = staging.keep();
        if let Err(e) = fsutil::copy_tree(content_src, &staging_path) {
            let _ = fsutil::remove_existing(&staging_path);
            return Err(e);
        }

        // Invalidate the old marker before touching content: a reader racing
        // this write sees stale, never fresh-over-partial.
        fsutil::remove_existing(&self.marker_path(id))?;
        fsutil::remove_existing(&self.entry_path(id))?;
        fs::rename(&staging_path, self.entry_path(id))?;

        let mut marker_tmp = tempfile::Builder::new()
            .prefix(".marker-")
            .tempfile_in(&self.root)?;
        marker_tmp.write_all(marker_json.as_bytes())?;
        marker_tmp
            .persist(self.marker_path(id))
            .map_err(|e| Error::Marker {
                repo: id.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Reads the persisted ignore list, creating it empty on first use.
    ///
    /// Lines are repository names; blank lines and `#` comments are skipped.
    pub fn ignore_list(&self) -> Result<HashSet<RepoId>> {
        let path = self.root.join(VENDOR_IGNORE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::write(&path, b"")?;
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(RepoId::new)
            .collect())
    }
}
