//! # Fetch Primitives
//!
//! This module defines the `Fetcher` trait, the seam between the cache layer
//! and the machinery that actually materializes repository contents. The
//! trait-based design mirrors the split used for Git and cache operations in
//! the rest of the codebase: the external cache depends only on the trait, so
//! tests inject mock fetchers that count invocations or fail on demand
//! without touching the network.
//!
//! Two implementations ship with the tool:
//!
//! - **`GitFetcher`**: shallow-clones a Git repository with the system `git`
//!   command, which automatically handles SSH keys, credential helpers, and
//!   anything else configured in `~/.gitconfig`.
//! - **`DirFetcher`**: copies a local directory tree. Used for local mirrors
//!   and throughout the test suite, where it stands in for network fetches.
//!
//! `DefaultFetcher` dispatches on the definition's rule name. Retry policy
//! belongs here (or below here), never in the cache layer: a fetch failure
//! propagates as a terminal `Fetch` error for that repository.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::fsutil;
use crate::repo::{RepoDefinition, RepoId};

/// The fetch primitive consumed by the external cache.
///
/// Implementations materialize the repository's contents into `dest`, which
/// the caller guarantees to be a fresh, empty directory. The caller owns
/// atomicity: `dest` is a temporary location that only becomes the cache
/// entry after the fetch returns successfully.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, id: &RepoId, definition: &RepoDefinition, dest: &Path) -> Result<()>;
}

/// Dispatches to the shipped fetchers based on the definition's rule name.
pub struct DefaultFetcher;

impl Fetcher for DefaultFetcher {
    fn fetch(&self, id: &RepoId, definition: &RepoDefinition, dest: &Path) -> Result<()> {
        match definition.rule.as_str() {
            "git" => GitFetcher.fetch(id, definition, dest),
            "dir" => DirFetcher.fetch(id, definition, dest),
            other => Err(Error::Fetch {
                repo: id.to_string(),
                message: format!("unknown rule '{}'", other),
                hint: Some("supported rules are 'git' and 'dir'".to_string()),
            }),
        }
    }
}

/// Shallow-clones a Git repository using the system `git` command.
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, id: &RepoId, definition: &RepoDefinition, dest: &Path) -> Result<()> {
        let url = require_attr(id, definition, "url")?;
        let ref_name = definition.attr("ref").unwrap_or("HEAD");

        // git refuses to clone into an existing non-empty directory
        fsutil::remove_existing(dest)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut args = vec!["clone", "--depth=1"];
        if ref_name != "HEAD" {
            args.push("--branch");
            args.push(ref_name);
        }
        args.push(url);
        let output = Command::new("git")
            .args(&args)
            .arg(dest)
            .output()
            .map_err(|e| Error::Fetch {
                repo: id.to_string(),
                message: e.to_string(),
                hint: None,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let hint = if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("Could not read from remote repository")
            {
                Some(
                    "make sure you have access to the repository: SSH key in ssh-agent, \
                     git credentials configured, or a personal access token set up"
                        .to_string(),
                )
            } else {
                None
            };
            return Err(Error::Fetch {
                repo: id.to_string(),
                message: stderr.trim().to_string(),
                hint,
            });
        }

        // The clone's .git directory is not part of the repository contents.
        fsutil::remove_existing(&dest.join(".git"))?;
        Ok(())
    }
}

/// Copies a local directory tree named by the `path` attribute.
pub struct DirFetcher;

impl Fetcher for DirFetcher {
    fn fetch(&self, id: &RepoId, definition: &RepoDefinition, dest: &Path) -> Result<()> {
        let source = require_attr(id, definition, "path")?;
        let source = Path::new(source);
        if !source.is_dir() {
            return Err(Error::Fetch {
                repo: id.to_string(),
                message: format!("source directory does not exist: {}", source.display()),
                hint: None,
            });
        }
        fsutil::copy_tree(source, dest)
    }
}

fn require_attr<'a>(id: &RepoId, definition: &'a RepoDefinition, key: &str) -> Result<&'a str> {
    definition.attr(key).ok_or_else(|| Error::Fetch {
        repo: id.to_string(),
        message: format!("rule '{}' requires attribute '{}'", definition.rule, key),
        hint: None,
    })
}
