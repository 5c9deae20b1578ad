//! # Resolved Repository Graph
//!
//! The dependency-graph resolver is an external collaborator: it evaluates
//! the workspace and produces the set of declared repositories, their
//! definitions, their kinds, and the per-consumer alias mappings. This module
//! holds the read-only view of that output which the resolver, orchestrator,
//! and reconciler all consume.
//!
//! The graph is passed by reference into every component rather than accessed
//! as an ambient singleton, so tests can construct small graphs inline.

use std::collections::{BTreeMap, HashMap};

use crate::repo::{RepoDefinition, RepoId, RepoKind};

/// Name used when reporting resolution errors scoped to the main repository.
pub const MAIN_REPO: &str = "main";

/// Read-only view of the resolved repository graph.
#[derive(Debug, Clone, Default)]
pub struct RepoGraph {
    definitions: BTreeMap<RepoId, RepoDefinition>,
    kinds: HashMap<RepoId, RepoKind>,
    /// Apparent-name mapping of the main repository.
    main_mapping: HashMap<String, RepoId>,
    /// Apparent-name mappings of each external repository.
    mappings: HashMap<RepoId, HashMap<String, RepoId>>,
}

impl RepoGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository with its definition and kind.
    ///
    /// Graph construction is idempotent per `RepoId`: registering the same
    /// identity twice keeps the latest definition, matching the upstream
    /// resolver's one-definition-per-identity guarantee.
    pub fn add_repo(&mut self, id: RepoId, definition: RepoDefinition, kind: RepoKind) {
        self.definitions.insert(id.clone(), definition);
        self.kinds.insert(id, kind);
    }

    /// Registers an apparent-name alias visible from the main repository.
    pub fn add_main_alias(&mut self, alias: impl Into<String>, target: RepoId) {
        self.main_mapping.insert(alias.into(), target);
    }

    /// Registers an apparent-name alias visible from `consumer`.
    pub fn add_alias(&mut self, consumer: RepoId, alias: impl Into<String>, target: RepoId) {
        self.mappings
            .entry(consumer)
            .or_default()
            .insert(alias.into(), target);
    }

    /// Whether the graph defines `id`.
    pub fn contains(&self, id: &RepoId) -> bool {
        self.definitions.contains_key(id)
    }

    /// The definition for `id`, if defined.
    pub fn definition(&self, id: &RepoId) -> Option<&RepoDefinition> {
        self.definitions.get(id)
    }

    /// The kind classification for `id`. Unknown repositories are not
    /// classified.
    pub fn kind(&self, id: &RepoId) -> Option<RepoKind> {
        self.kinds.get(id).copied()
    }

    /// Looks up `alias` in the mapping of `consumer` (`None` = the main
    /// repository).
    pub fn visible(&self, consumer: Option<&RepoId>, alias: &str) -> Option<&RepoId> {
        match consumer {
            None => self.main_mapping.get(alias),
            Some(id) => self.mappings.get(id).and_then(|m| m.get(alias)),
        }
    }

    /// All defined repository identities, in stable (sorted) order.
    pub fn repo_ids(&self) -> impl Iterator<Item = &RepoId> {
        self.definitions.keys()
    }

    /// The number of defined repositories.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> RepoGraph {
        let mut graph = RepoGraph::new();
        graph.add_repo(
            RepoId::new("aaa"),
            RepoDefinition::new("git").with_attr("url", "https://example.com/aaa.git"),
            RepoKind::Ordinary,
        );
        graph.add_repo(
            RepoId::new("bbb"),
            RepoDefinition::new("git").with_attr("url", "https://example.com/bbb.git"),
            RepoKind::Ordinary,
        );
        graph.add_main_alias("my_repo", RepoId::new("aaa"));
        graph.add_alias(RepoId::new("bbb"), "aaa", RepoId::new("aaa"));
        graph
    }

    #[test]
    fn test_contains_and_definition() {
        let graph = sample_graph();
        assert!(graph.contains(&RepoId::new("aaa")));
        assert!(!graph.contains(&RepoId::new("zzz")));
        assert_eq!(
            graph.definition(&RepoId::new("bbb")).unwrap().rule,
            "git".to_string()
        );
    }

    #[test]
    fn test_main_mapping_lookup() {
        let graph = sample_graph();
        assert_eq!(graph.visible(None, "my_repo"), Some(&RepoId::new("aaa")));
        assert_eq!(graph.visible(None, "unknown"), None);
    }

    #[test]
    fn test_consumer_mapping_lookup() {
        let graph = sample_graph();
        let bbb = RepoId::new("bbb");
        assert_eq!(graph.visible(Some(&bbb), "aaa"), Some(&RepoId::new("aaa")));
        // aaa has no mapping at all
        assert_eq!(graph.visible(Some(&RepoId::new("aaa")), "bbb"), None);
    }

    #[test]
    fn test_repo_ids_sorted() {
        let graph = sample_graph();
        let ids: Vec<&str> = graph.repo_ids().map(RepoId::as_str).collect();
        assert_eq!(ids, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_re_registering_keeps_latest_definition() {
        let mut graph = sample_graph();
        graph.add_repo(
            RepoId::new("aaa"),
            RepoDefinition::new("dir").with_attr("path", "/srv/aaa"),
            RepoKind::Local,
        );
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.definition(&RepoId::new("aaa")).unwrap().rule, "dir");
        assert_eq!(graph.kind(&RepoId::new("aaa")), Some(RepoKind::Local));
    }
}
