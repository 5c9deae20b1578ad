//! # Repo Vendor Library
//!
//! This library implements the dependency-vendoring engine behind the
//! `repo-vendor` command-line tool: materializing a project's external
//! repositories into a source-controlled vendor directory, and keeping
//! builds coherent with that directory afterwards.
//!
//! ## Quick Example
//!
//! ```
//! use repo_vendor::config;
//! use repo_vendor::repo::RepoId;
//!
//! let manifest = r#"
//! repos:
//!   rules-zig:
//!     rule: git
//!     attrs:
//!       url: https://example.com/rules-zig.git
//!       ref: v1.2.0
//! aliases:
//!   zig: rules-zig
//! "#;
//! let graph = config::parse(manifest).unwrap();
//! assert!(graph.contains(&RepoId::new("rules-zig")));
//! assert_eq!(graph.visible(None, "zig"), Some(&RepoId::new("rules-zig")));
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Manifest (`config`)**: Parses `.repo-vendor.yaml` into a repository
//!   graph: canonical names, fetch rules, visibility mappings.
//! - **Identity (`repo`, `resolver`)**: Canonical (`@@name`) and apparent
//!   (`@alias`) repository specifiers, and resolution of the latter through
//!   a consumer's mapping.
//! - **Fingerprints (`fingerprint`)**: A stable digest of a repository
//!   definition. Equal fingerprints mean a fetch would produce equivalent
//!   content; staleness detection is fingerprint comparison.
//! - **External Cache (`cache`)**: Fetched repository content keyed by
//!   canonical name, with single-flight fetch deduplication.
//! - **Vendor Store (`vendor`)**: The source-controlled vendor directory:
//!   one subdirectory per repository plus a marker file recording the
//!   fingerprint it was vendored at.
//! - **Vendoring (`orchestrator`)**: The `vendor` command's engine. Selects
//!   repositories, filters unvendorable kinds and ignored names, fetches
//!   what is stale, and aggregates per-repository failures.
//! - **Reconciliation (`reconciler`)**: The build-time side. Decides per
//!   repository whether to symlink vendored content, refetch, or fail.

pub mod cache;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fetch;
pub mod fingerprint;
pub mod fsutil;
pub mod graph;
pub mod orchestrator;
pub mod reconciler;
pub mod repo;
pub mod resolver;
pub mod vendor;

#[cfg(test)]
mod fingerprint_proptest;
