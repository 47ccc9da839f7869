use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::api::Node;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<String>>,
}

/// Fuzzy node finder over labels and descriptions. Matches are ringed on the
/// canvas without filtering anything out.
#[derive(Default)]
pub(crate) struct NodeSearch {
    pub(crate) query: String,
    cache: Option<SearchMatchCache>,
}

impl NodeSearch {
    fn score(matcher: &SkimMatcherV2, node: &Node, query: &str) -> Option<i64> {
        let label = fuzzy_match_score(matcher, &node.label, query);
        let description = node
            .description
            .as_deref()
            .and_then(|description| fuzzy_match_score(matcher, description, query))
            .map(|score| score / 2);
        label.max(description)
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Ids of every node matching the current query, cached per query and
    /// graph revision.
    pub(crate) fn matches(&mut self, nodes: &[Node], graph_revision: u64) -> Arc<HashSet<String>> {
        let query = self.query.trim();
        if query.is_empty() {
            return Arc::default();
        }

        if let Some(cached) = &self.cache
            && cached.graph_revision == graph_revision
            && cached.query == query
        {
            return Arc::clone(&cached.matches);
        }

        let matcher = SkimMatcherV2::default();
        let matches = nodes
            .iter()
            .filter(|node| Self::score(&matcher, node, query).is_some())
            .filter_map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision,
            matches: Arc::clone(&matches),
        });
        matches
    }

    /// Highest scoring match; ties go to the shorter label.
    pub(crate) fn best_match(&self, nodes: &[Node]) -> Option<String> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        nodes
            .iter()
            .filter_map(|node| {
                let id = node.id.as_ref()?;
                let score = Self::score(&matcher, node, query)?;
                Some((score, node.label.chars().count(), id))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|(_, _, id)| id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, label: &str, description: Option<&str>) -> Node {
        Node {
            id: Some(id.to_owned()),
            label: label.to_owned(),
            description: description.map(str::to_owned),
            ..Node::default()
        }
    }

    fn course() -> Vec<Node> {
        vec![
            node("n1", "Limits", None),
            node("n2", "Derivatives", Some("rate of change of a function")),
            node("n3", "Integrals", Some("area under a curve")),
            Node {
                id: None,
                label: "Limit comparison".to_owned(),
                ..Node::default()
            },
        ]
    }

    #[test]
    fn empty_query_matches_nothing() {
        let mut search = NodeSearch::default();
        search.query = "   ".to_owned();
        assert!(search.matches(&course(), 0).is_empty());
        assert_eq!(search.best_match(&course()), None);
    }

    #[test]
    fn matching_is_case_insensitive_and_skips_id_less_nodes() {
        let mut search = NodeSearch::default();
        search.query = "LIMIT".to_owned();
        let matches = search.matches(&course(), 0);
        assert_eq!(*matches, HashSet::from(["n1".to_owned()]));
    }

    #[test]
    fn descriptions_are_searched() {
        let mut search = NodeSearch::default();
        search.query = "curve".to_owned();
        assert!(search.matches(&course(), 0).contains("n3"));
        assert_eq!(search.best_match(&course()).as_deref(), Some("n3"));
    }

    #[test]
    fn cache_is_refreshed_when_the_graph_changes() {
        let mut search = NodeSearch::default();
        search.query = "deriv".to_owned();
        let first = search.matches(&course(), 1);
        let again = search.matches(&course(), 1);
        assert!(Arc::ptr_eq(&first, &again));

        let mut nodes = course();
        nodes.push(node("n4", "Partial derivatives", None));
        let refreshed = search.matches(&nodes, 2);
        assert!(refreshed.contains("n4"));
        assert_eq!(refreshed.len(), 2);
    }
}
