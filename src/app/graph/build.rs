use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::api::{Node, Relation, RelationType};

use super::super::physics::BodySpec;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CanvasNode {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) kind: Option<String>,
    pub(crate) pin: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CanvasEdge {
    pub(crate) id: Option<String>,
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) kind: RelationType,
    pub(crate) directed: bool,
    pub(crate) weight: f32,
}

impl CanvasEdge {
    pub(crate) fn touches(&self, node: usize) -> bool {
        self.source == node || self.target == node
    }
}

/// Renderable view of one course graph: nodes with usable ids and the
/// relations whose endpoints are both present.
#[derive(Clone, Debug, Default)]
pub(crate) struct CanvasGraph {
    pub(crate) nodes: Vec<CanvasNode>,
    pub(crate) edges: Vec<CanvasEdge>,
    pub(crate) index_by_id: HashMap<String, usize>,
    pub(crate) skipped_nodes: usize,
    pub(crate) skipped_relations: usize,
}

impl CanvasGraph {
    pub(crate) fn build(nodes: &[Node], relations: &[Relation]) -> Self {
        let mut graph = Self::default();

        for node in nodes {
            let Some(id) = node.id.as_ref().filter(|id| !id.is_empty()) else {
                graph.skipped_nodes += 1;
                continue;
            };
            if graph.index_by_id.contains_key(id) {
                graph.skipped_nodes += 1;
                continue;
            }

            graph.index_by_id.insert(id.clone(), graph.nodes.len());
            graph.nodes.push(CanvasNode {
                id: id.clone(),
                label: node.label.clone(),
                kind: node.kind.clone(),
                pin: node
                    .position()
                    .map(|position| vec2(position.x as f32, position.y as f32)),
            });
        }

        for relation in relations {
            let endpoints = (
                graph.index_by_id.get(&relation.from),
                graph.index_by_id.get(&relation.to),
            );
            let (Some(&source), Some(&target)) = endpoints else {
                graph.skipped_relations += 1;
                continue;
            };

            graph.edges.push(CanvasEdge {
                id: relation.id.clone(),
                source,
                target,
                kind: relation.kind.clone(),
                directed: relation.is_directed(),
                weight: relation.effective_weight() as f32,
            });
        }

        if graph.skipped_nodes > 0 || graph.skipped_relations > 0 {
            debug!(
                skipped_nodes = graph.skipped_nodes,
                skipped_relations = graph.skipped_relations,
                "graph entries left out of the canvas"
            );
        }

        graph
    }

    pub(crate) fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(crate) fn body_specs(&self) -> Vec<BodySpec> {
        self.nodes
            .iter()
            .map(|node| BodySpec {
                id: node.id.clone(),
                pin: node.pin,
            })
            .collect()
    }

    /// Self-loops take no part in the layout.
    pub(crate) fn link_pairs(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .filter(|edge| edge.source != edge.target)
            .map(|edge| (edge.source, edge.target))
            .collect()
    }
}
