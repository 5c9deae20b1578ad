//! # Definition Fingerprinting
//!
//! Computes a stable digest over a repository's definition, used to detect
//! drift between what a vendored copy was produced from and what the graph
//! currently declares. The orchestrator stamps markers with this digest and
//! the reconciler compares against it, so both must go through this one
//! function.
//!
//! The digest is a SHA-256 over the rule name and the sorted attribute set,
//! with field prefixes and separators so that adjacent values cannot collide
//! by concatenation. No pointer, time, or platform input feeds the hash: the
//! result is stable across process runs and machines.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::repo::RepoDefinition;

/// A deterministic digest of a [`RepoDefinition`].
///
/// Equal definitions always produce equal fingerprints; any attribute change
/// produces a different fingerprint with overwhelming probability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The hex-encoded digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an already-computed digest (e.g. read back from a marker).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Computes the fingerprint of a repository definition.
pub fn fingerprint(definition: &RepoDefinition) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(b"rule:");
    hasher.update(definition.rule.as_bytes());
    hasher.update(b"\n");
    // BTreeMap iteration is already sorted by key, so attribute declaration
    // order never reaches the hash.
    for (key, value) in &definition.attrs {
        hasher.update(b"attr:");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    Fingerprint(hex::encode(hasher.finalize()))
}
