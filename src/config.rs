//! # Manifest Schema and Parsing
//!
//! This module defines the data structures that represent the
//! `.repo-vendor.yaml` manifest, as well as the logic for parsing it into a
//! [`RepoGraph`].
//!
//! ## Key Components
//!
//! - **`Manifest`**: The top-level document. It maps canonical repository
//!   names to their entries and declares which apparent names the main
//!   project uses for them.
//!
//! - **`RepoEntry`**: One external repository: its fetch rule, rule
//!   attributes, whether it is a local or configure-style repository, and
//!   the apparent names it uses for its own dependencies.
//!
//! ## Parsing
//!
//! `parse` turns a YAML string into a validated `RepoGraph`. Validation
//! covers canonical name syntax, alias targets that actually exist, and the
//! `local`/`configure` flags being mutually exclusive. `from_file` is the
//! same with file loading attached.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::RepoGraph;
use crate::repo::{RepoDefinition, RepoId, RepoKind, RepoSpecifier};

/// Default manifest file name, looked up in the working directory.
pub const MANIFEST_FILE: &str = ".repo-vendor.yaml";

/// One external repository declaration in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoEntry {
    /// The fetch rule, e.g. `git` or `dir`.
    pub rule: String,
    /// Rule attributes, e.g. `url` and `ref` for `git`.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Marks a repository whose content lives on the local machine.
    /// Local repositories are never vendored.
    #[serde(default)]
    pub local: bool,
    /// Marks a repository whose content depends on machine configuration.
    /// Configured repositories are never vendored.
    #[serde(default)]
    pub configure: bool,
    /// Apparent name to canonical name mapping for this repository's own
    /// dependencies.
    #[serde(default)]
    pub deps: BTreeMap<String, String>,
}

/// The `.repo-vendor.yaml` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Canonical repository name to entry.
    pub repos: BTreeMap<String, RepoEntry>,
    /// Apparent names the main project uses, mapped to canonical names.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Loads and parses the manifest at `path`.
pub fn from_file(path: &Path) -> Result<RepoGraph> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("cannot read '{}': {}", path.display(), e),
        hint: Some(format!(
            "run from a directory containing {} or pass --manifest",
            MANIFEST_FILE
        )),
    })?;
    parse(&content)
}

/// Parses manifest YAML into a validated repository graph.
pub fn parse(yaml_content: &str) -> Result<RepoGraph> {
    let manifest: Manifest = serde_yaml::from_str(yaml_content)?;
    build_graph(&manifest)
}

fn build_graph(manifest: &Manifest) -> Result<RepoGraph> {
    let mut graph = RepoGraph::new();

    for (name, entry) in &manifest.repos {
        // Reuse specifier validation for canonical name syntax.
        RepoSpecifier::parse(&format!("@@{}", name)).map_err(|_| Error::ConfigParse {
            message: format!("invalid repository name '{}'", name),
            hint: Some(
                "repository names may contain letters, digits and - _ . ~ +".to_string(),
            ),
        })?;
        if entry.local && entry.configure {
            return Err(Error::ConfigParse {
                message: format!(
                    "repository '{}' is marked both 'local' and 'configure'",
                    name
                ),
                hint: Some("pick one of the two flags".to_string()),
            });
        }
        let kind = if entry.local {
            RepoKind::Local
        } else if entry.configure {
            RepoKind::Configured
        } else {
            RepoKind::Ordinary
        };
        let mut definition = RepoDefinition::new(&entry.rule);
        for (key, value) in &entry.attrs {
            definition = definition.with_attr(key, value);
        }
        graph.add_repo(RepoId::new(name.as_str()), definition, kind);
    }

    for (alias, target) in &manifest.aliases {
        require_defined(manifest, target, &format!("alias '{}'", alias))?;
        graph.add_main_alias(alias.as_str(), RepoId::new(target.as_str()));
    }
    for (name, entry) in &manifest.repos {
        for (alias, target) in &entry.deps {
            require_defined(
                manifest,
                target,
                &format!("dependency '{}' of repository '{}'", alias, name),
            )?;
            graph.add_alias(
                RepoId::new(name.as_str()),
                alias.as_str(),
                RepoId::new(target.as_str()),
            );
        }
    }

    Ok(graph)
}

fn require_defined(manifest: &Manifest, target: &str, context: &str) -> Result<()> {
    if manifest.repos.contains_key(target) {
        return Ok(());
    }
    Err(Error::ConfigParse {
        message: format!("{} points at undefined repository '{}'", context, target),
        hint: Some(format!("add a 'repos.{}' entry to the manifest", target)),
    })
}
