//! # Repository Identity Resolution
//!
//! Maps user-typed specifiers to canonical repository identities. Resolution
//! is a pure lookup over the externally supplied [`RepoGraph`]: no I/O, no
//! side effects. Syntax errors surface immediately; lookup failures carry the
//! reason (`RepoNotDefined` for canonical names absent from the graph,
//! `RepoNotVisible` for apparent names missing from the consumer's mapping).

use crate::error::{Error, Result};
use crate::graph::{RepoGraph, MAIN_REPO};
use crate::repo::{RepoId, RepoSpecifier};

/// Resolves a parsed specifier against the graph.
///
/// `consumer` scopes apparent names; `None` means the main repository.
pub fn resolve(
    graph: &RepoGraph,
    specifier: &RepoSpecifier,
    consumer: Option<&RepoId>,
) -> Result<RepoId> {
    match specifier {
        RepoSpecifier::Canonical(name) => {
            let id = RepoId::new(name.clone());
            if graph.contains(&id) {
                Ok(id)
            } else {
                Err(Error::RepoNotDefined { repo: name.clone() })
            }
        }
        RepoSpecifier::Apparent(alias) => {
            graph
                .visible(consumer, alias)
                .cloned()
                .ok_or_else(|| Error::RepoNotVisible {
                    name: alias.clone(),
                    consumer: consumer
                        .map_or_else(|| MAIN_REPO.to_string(), |id| id.to_string()),
                })
        }
    }
}

/// Parses and resolves a raw specifier string in one step.
pub fn resolve_str(graph: &RepoGraph, raw: &str, consumer: Option<&RepoId>) -> Result<RepoId> {
    let specifier = RepoSpecifier::parse(raw)?;
    resolve(graph, &specifier, consumer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{RepoDefinition, RepoKind};

    fn sample_graph() -> RepoGraph {
        let mut graph = RepoGraph::new();
        graph.add_repo(
            RepoId::new("ccc"),
            RepoDefinition::new("git").with_attr("url", "https://example.com/ccc.git"),
            RepoKind::Ordinary,
        );
        graph.add_main_alias("my_repo", RepoId::new("ccc"));
        graph.add_alias(RepoId::new("ccc"), "self", RepoId::new("ccc"));
        graph
    }

    #[test]
    fn test_resolve_canonical() {
        let graph = sample_graph();
        let id = resolve_str(&graph, "@@ccc", None).unwrap();
        assert_eq!(id, RepoId::new("ccc"));
    }

    #[test]
    fn test_resolve_apparent_from_main() {
        let graph = sample_graph();
        let id = resolve_str(&graph, "@my_repo", None).unwrap();
        assert_eq!(id, RepoId::new("ccc"));
    }

    #[test]
    fn test_resolve_apparent_from_consumer() {
        let graph = sample_graph();
        let ccc = RepoId::new("ccc");
        let id = resolve_str(&graph, "@self", Some(&ccc)).unwrap();
        assert_eq!(id, ccc);
    }

    #[test]
    fn test_resolve_canonical_not_defined() {
        let graph = sample_graph();
        let err = resolve_str(&graph, "@@nono", None).unwrap_err();
        assert_eq!(format!("{}", err), "Repository '@@nono' is not defined");
    }

    #[test]
    fn test_resolve_apparent_not_visible() {
        let graph = sample_graph();
        let err = resolve_str(&graph, "@nana", None).unwrap_err();
        assert_eq!(
            format!("{}", err),
            "No repository visible as '@nana' from main repository"
        );
    }

    #[test]
    fn test_resolve_apparent_not_visible_from_consumer() {
        let graph = sample_graph();
        let ccc = RepoId::new("ccc");
        let err = resolve_str(&graph, "@other", Some(&ccc)).unwrap_err();
        assert!(format!("{}", err).contains("from ccc repository"));
    }

    #[test]
    fn test_resolve_invalid_syntax_before_lookup() {
        // An empty graph never matters: syntax is checked first.
        let graph = RepoGraph::new();
        let err = resolve_str(&graph, "hello", None).unwrap_err();
        assert!(matches!(err, Error::InvalidSpecifier { .. }));
    }
}
