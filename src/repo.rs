//! # Repository Data Model
//!
//! This module defines the core value types that the rest of the crate is
//! built on:
//!
//! - **`RepoId`**: the canonical identity of an external repository, assigned
//!   during graph resolution. It is the sole key into both the external cache
//!   and the vendor store.
//! - **`RepoSpecifier`**: user input denoting a repository, either in
//!   apparent form (`@alias`, resolved through a consumer's mapping) or in
//!   canonical form (`@@name`, unscoped).
//! - **`RepoKind`**: classifies repositories as `Ordinary`, `Local`, or
//!   `Configured`. Local and configured repositories derive their content
//!   from the local machine environment, so they are never vendored and never
//!   fingerprint-tracked.
//! - **`RepoDefinition`**: the declaration that drives how a repository's
//!   contents are produced: a rule name plus its resolved attribute set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical identity of an external repository.
///
/// Globally unique, assigned during graph resolution, and immutable once
/// assigned. Used as the key for cache entries, vendor entries, and marker
/// files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(String);

impl RepoId {
    /// Creates a `RepoId` from a raw canonical name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw canonical name, without any `@` decoration.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The marker file name for this repository (`@<name>.marker`).
    pub fn marker_file_name(&self) -> String {
        format!("@{}.marker", self.0)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepoId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A user-typed repository specifier.
///
/// Either an apparent name (`@alias`), scoped to a consuming repository, or a
/// canonical name (`@@name`). Parsing fails before any I/O if the input
/// matches neither shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSpecifier {
    /// `@alias` — resolved through the consuming repository's mapping.
    Apparent(String),
    /// `@@name` — an explicit, unscoped canonical name.
    Canonical(String),
}

impl RepoSpecifier {
    /// Parses a raw specifier string.
    ///
    /// Accepts `@alias` and `@@name` where the name part is a non-empty run
    /// of repo-name characters (alphanumerics plus `-`, `_`, `.`, `~`, `+`).
    /// Everything else is an `InvalidSpecifier` error.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidSpecifier {
            specifier: raw.to_string(),
        };

        if let Some(name) = raw.strip_prefix("@@") {
            if !is_valid_repo_name(name) {
                return Err(invalid());
            }
            Ok(Self::Canonical(name.to_string()))
        } else if let Some(name) = raw.strip_prefix('@') {
            if !is_valid_repo_name(name) {
                return Err(invalid());
            }
            Ok(Self::Apparent(name.to_string()))
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for RepoSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apparent(name) => write!(f, "@{}", name),
            Self::Canonical(name) => write!(f, "@@{}", name),
        }
    }
}

/// Returns whether `name` is a syntactically valid repository name.
fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '+'))
}

/// Classification of a repository's content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Portable content produced from the declaration alone. Eligible for
    /// vendoring.
    Ordinary,
    /// Content rooted in the local machine (e.g. a path on disk). Never
    /// vendored.
    Local,
    /// Content regenerated from the local environment (toolchains, system
    /// probes). Never vendored.
    Configured,
}

impl RepoKind {
    /// Whether repositories of this kind may be vendored and
    /// fingerprint-tracked.
    pub fn is_vendorable(self) -> bool {
        matches!(self, Self::Ordinary)
    }
}

/// The declaration driving how a repository's contents are produced.
///
/// Two repositories with identical `RepoId` always share one definition; the
/// attribute set is order-independent by construction (`BTreeMap`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDefinition {
    /// The rule name (e.g. `git`, `dir`) that produces the content.
    pub rule: String,
    /// Resolved attributes of the rule call.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

impl RepoDefinition {
    /// Creates a definition with no attributes.
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Adds an attribute, builder-style.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Looks up an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}
