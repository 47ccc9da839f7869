use eframe::egui::{Pos2, Vec2};
use tracing::{debug, info, warn};

use crate::api::{
    ApiRequest, GraphSnapshot, Mutation, Node, NodeDraft, NodePatch, Position, Relation,
    RelationDraft, RelationPatch,
};
use crate::util::next_default_label;

use super::graph::{CanvasEvent, Selection};
use super::{NodeEditor, PendingDelete, RelationEditor, ViewModel};

fn world_position(world: Vec2) -> Position {
    Position {
        x: f64::from(world.x),
        y: f64::from(world.y),
    }
}

impl ViewModel {
    pub(in crate::app) fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id.as_deref() == Some(id))
    }

    pub(in crate::app) fn relation(&self, id: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| relation.id.as_deref() == Some(id))
    }

    pub(in crate::app) fn relation_caption(&self, id: &str) -> String {
        let Some(relation) = self.relation(id) else {
            return id.to_owned();
        };
        let label = |node_id: &str| {
            self.node(node_id)
                .map_or_else(|| node_id.to_owned(), |node| node.label.clone())
        };
        format!("{} → {}", label(&relation.from), label(&relation.to))
    }

    pub(in crate::app) fn canvas_center(&self) -> Pos2 {
        (self.canvas.canvas_size() * 0.5).to_pos2()
    }

    pub(in crate::app) fn select_node(&mut self, id: String) {
        self.selection = Selection::Node(id);
    }

    pub(in crate::app) fn request_refetch(&mut self) {
        self.pending_fetches += 1;
        self.api.send(ApiRequest::Fetch);
    }

    fn data_changed(&mut self) {
        self.graph_revision += 1;
        self.canvas.sync(&self.nodes, &self.relations);
    }

    /// Replaces the local data with a fresh server snapshot and drops any
    /// selection or edit state that no longer has a target.
    pub(in crate::app) fn apply_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        self.nodes = snapshot.nodes;
        self.relations = snapshot.relations;
        self.data_changed();

        if let Some(id) = self.pending_select.take() {
            if self.node(&id).is_some() {
                self.selection = Selection::Node(id);
            } else {
                self.pending_select = Some(id);
            }
        }

        let selection_exists = match &self.selection {
            Selection::None => true,
            Selection::Node(id) => self.node(id).is_some(),
            Selection::Relation(id) => self.relation(id).is_some(),
        };
        if !selection_exists {
            debug!(selection = ?self.selection, "selection vanished after refetch");
            self.selection = Selection::None;
        }

        if self
            .node_editor
            .as_ref()
            .is_some_and(|editor| self.node(&editor.node_id).is_none())
        {
            self.node_editor = None;
        }
        if self
            .relation_editor
            .as_ref()
            .is_some_and(|editor| self.relation(&editor.relation_id).is_none())
        {
            self.relation_editor = None;
        }
        let delete_target_exists = match &self.pending_delete {
            None => true,
            Some(PendingDelete::Node(id)) => self.node(id).is_some(),
            Some(PendingDelete::Relation(id)) => self.relation(id).is_some(),
        };
        if !delete_target_exists {
            self.pending_delete = None;
        }
    }

    /// Reports the outcome and refetches; failures are not rolled back
    /// locally. A saved move is already reflected locally, so it is not
    /// refetched.
    pub(in crate::app) fn apply_mutation(
        &mut self,
        mutation: Mutation,
        result: Result<Option<String>, String>,
    ) {
        match result {
            Ok(created) => {
                info!(action = mutation.describe(), ?created, "mutation applied");
                match mutation {
                    Mutation::CreateNode => {
                        self.pending_select = created;
                        self.toasts.success("Node created");
                    }
                    Mutation::CreateRelation => self.toasts.success("Relation created"),
                    Mutation::UpdateNode | Mutation::UpdateRelation => self.toasts.success("Saved"),
                    Mutation::DeleteNode => self.toasts.success("Node deleted"),
                    Mutation::DeleteRelation => self.toasts.success("Relation deleted"),
                    Mutation::MoveNode => return,
                }
            }
            Err(message) => {
                warn!(action = mutation.describe(), %message, "mutation rejected");
                self.toasts
                    .error(format!("Failed to {}: {message}", mutation.describe()));
            }
        }

        self.request_refetch();
    }

    pub(in crate::app) fn apply_canvas_event(&mut self, event: CanvasEvent) {
        self.selection.apply(&event);

        match event {
            CanvasEvent::NodeClicked(_)
            | CanvasEvent::RelationClicked(_)
            | CanvasEvent::Deselected => {}
            CanvasEvent::NodeCreateRequested(world) => self.create_node_at(world),
            CanvasEvent::RelationCreateRequested { from, to } => self.create_relation(from, to),
            CanvasEvent::NodeMoved { id, position } => self.persist_position(&id, position),
        }
    }

    fn create_node_at(&mut self, world: Vec2) {
        if !self.editable {
            return;
        }

        let (base, separator) = self.locale.default_node_label();
        let label = next_default_label(
            base,
            separator,
            self.nodes.iter().map(|node| node.label.as_str()),
        );
        debug!(%label, x = world.x, y = world.y, "creating node");
        self.api
            .send(ApiRequest::CreateNode(NodeDraft::at(label, world_position(world))));
    }

    fn create_relation(&mut self, from: String, to: String) {
        if !self.editable || from == to {
            return;
        }

        let defaults = self.relation_defaults.clone();
        self.api.send(ApiRequest::CreateRelation(RelationDraft {
            from,
            to,
            kind: defaults.kind,
            directed: defaults.directed,
            weight: defaults.weight.clamp(0.0, 1.0),
        }));
    }

    /// Merges the new position into the node's meta locally and on the server.
    fn persist_position(&mut self, id: &str, world: Vec2) {
        let position = world_position(world);
        let Some(node) = self
            .nodes
            .iter_mut()
            .find(|node| node.id.as_deref() == Some(id))
        else {
            return;
        };

        let meta = node.meta_with_position(position);
        node.meta = Some(meta.clone());
        self.api.send(ApiRequest::MoveNode {
            node_id: id.to_owned(),
            patch: NodePatch {
                meta: Some(meta),
                ..NodePatch::default()
            },
        });
    }

    pub(in crate::app) fn save_node(&mut self, editor: &NodeEditor) {
        let label = editor.label.trim();
        if label.is_empty() {
            return;
        }

        self.api.send(ApiRequest::UpdateNode {
            node_id: editor.node_id.clone(),
            patch: NodePatch {
                label: Some(label.to_owned()),
                kind: Some(editor.kind.clone()),
                description: Some(editor.description.trim().to_owned()),
                meta: None,
            },
        });
    }

    pub(in crate::app) fn save_relation(&mut self, editor: &RelationEditor) {
        self.api.send(ApiRequest::UpdateRelation {
            relation_id: editor.relation_id.clone(),
            patch: RelationPatch {
                kind: Some(editor.kind.clone()),
                directed: Some(editor.directed),
                weight: Some(editor.weight.clamp(0.0, 1.0)),
            },
        });
    }

    /// Removes the node and its relations right away; the server cascades the
    /// same deletion.
    pub(in crate::app) fn delete_node(&mut self, id: &str) {
        self.nodes.retain(|node| node.id.as_deref() != Some(id));
        self.relations
            .retain(|relation| relation.from != id && relation.to != id);
        if self.selection.is_node(id) {
            self.selection = Selection::None;
        }
        self.node_editor = None;
        self.data_changed();
        self.api.send(ApiRequest::DeleteNode(id.to_owned()));
    }

    pub(in crate::app) fn delete_relation(&mut self, id: &str) {
        self.relations
            .retain(|relation| relation.id.as_deref() != Some(id));
        if self.selection.is_relation(id) {
            self.selection = Selection::None;
        }
        self.relation_editor = None;
        self.data_changed();
        self.api.send(ApiRequest::DeleteRelation(id.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Receiver;

    use eframe::egui::vec2;
    use serde_json::{Value, json};

    use super::*;
    use crate::api::{ApiHandle, RelationType};
    use crate::config::Locale;

    fn node(id: &str, label: &str) -> Node {
        Node {
            id: Some(id.to_owned()),
            label: label.to_owned(),
            ..Node::default()
        }
    }

    fn relation(id: &str, from: &str, to: &str) -> Relation {
        Relation {
            id: Some(id.to_owned()),
            from: from.to_owned(),
            to: to.to_owned(),
            kind: RelationType::Prerequisite,
            directed: Some(true),
            weight: Some(0.5),
            meta: None,
        }
    }

    fn model(editable: bool) -> (ViewModel, Receiver<ApiRequest>) {
        let (api, requests) = ApiHandle::detached();
        let mut model = ViewModel::new(api, 7, editable, Locale::En);
        let mut first = node("n1", "Limits");
        first.meta = serde_json::from_value(json!({ "x": 10.0, "y": 20.0, "color": "red" })).ok();
        model.apply_snapshot(GraphSnapshot {
            nodes: vec![first, node("n2", "New node"), node("n3", "Series")],
            relations: vec![relation("r1", "n1", "n2"), relation("r2", "n2", "n3")],
        });
        (model, requests)
    }

    fn sent(requests: &Receiver<ApiRequest>) -> Vec<ApiRequest> {
        requests.try_iter().collect()
    }

    #[test]
    fn moved_node_merges_position_into_meta() {
        let (mut model, requests) = model(true);
        model.apply_canvas_event(CanvasEvent::NodeMoved {
            id: "n1".to_owned(),
            position: vec2(120.0, -40.0),
        });

        let sent = sent(&requests);
        let [ApiRequest::MoveNode { node_id, patch }] = sent.as_slice() else {
            panic!("expected one position save");
        };
        assert_eq!(node_id, "n1");
        let meta = patch.meta.as_ref().unwrap();
        assert_eq!(meta.get("x"), Some(&Value::from(120.0)));
        assert_eq!(meta.get("y"), Some(&Value::from(-40.0)));
        assert_eq!(meta.get("color"), Some(&Value::from("red")));
        assert!(patch.label.is_none());

        let local = model.node("n1").unwrap().position().unwrap();
        assert_eq!((local.x, local.y), (120.0, -40.0));
    }

    #[test]
    fn created_nodes_get_the_next_default_label() {
        let (mut model, requests) = model(true);
        model.apply_canvas_event(CanvasEvent::NodeCreateRequested(vec2(400.0, 300.0)));

        assert_eq!(
            sent(&requests),
            vec![ApiRequest::CreateNode(NodeDraft::at(
                "New node 1",
                Position { x: 400.0, y: 300.0 },
            ))]
        );
    }

    #[test]
    fn read_only_sessions_never_mutate() {
        let (mut model, requests) = model(false);
        model.apply_canvas_event(CanvasEvent::NodeCreateRequested(vec2(1.0, 1.0)));
        model.apply_canvas_event(CanvasEvent::RelationCreateRequested {
            from: "n1".to_owned(),
            to: "n3".to_owned(),
        });
        assert!(sent(&requests).is_empty());
    }

    #[test]
    fn drawn_relations_use_the_defaults() {
        let (mut model, requests) = model(true);
        model.relation_defaults.kind = RelationType::PartOf;
        model.relation_defaults.directed = false;
        model.relation_defaults.weight = 0.8;

        model.apply_canvas_event(CanvasEvent::RelationCreateRequested {
            from: "n1".to_owned(),
            to: "n3".to_owned(),
        });

        assert_eq!(
            sent(&requests),
            vec![ApiRequest::CreateRelation(RelationDraft {
                from: "n1".to_owned(),
                to: "n3".to_owned(),
                kind: RelationType::PartOf,
                directed: false,
                weight: 0.8,
            })]
        );
    }

    #[test]
    fn failed_mutation_is_reported_and_refetched() {
        let (mut model, requests) = model(true);
        model.apply_mutation(Mutation::MoveNode, Err("Node not found".to_owned()));

        assert_eq!(sent(&requests), vec![ApiRequest::Fetch]);
        assert_eq!(model.pending_fetches, 1);
    }

    #[test]
    fn saved_move_does_not_refetch() {
        let (mut model, requests) = model(true);
        model.apply_mutation(Mutation::MoveNode, Ok(None));

        assert!(sent(&requests).is_empty());
        assert_eq!(model.pending_fetches, 0);
    }

    #[test]
    fn created_node_is_selected_once_it_arrives() {
        let (mut model, _requests) = model(true);
        model.apply_mutation(Mutation::CreateNode, Ok(Some("n9".to_owned())));
        assert_eq!(model.selection, Selection::None);

        let mut nodes = model.nodes.clone();
        nodes.push(node("n9", "New node 1"));
        let relations = model.relations.clone();
        model.apply_snapshot(GraphSnapshot { nodes, relations });

        assert_eq!(model.selection, Selection::Node("n9".to_owned()));
        assert_eq!(model.pending_select, None);
        assert_eq!(model.pending_fetches, 0);
    }

    #[test]
    fn vanished_selection_is_cleared_on_refetch() {
        let (mut model, _requests) = model(true);
        model.apply_canvas_event(CanvasEvent::RelationClicked("r2".to_owned()));
        assert_eq!(model.selection, Selection::Relation("r2".to_owned()));

        model.apply_snapshot(GraphSnapshot {
            nodes: model.nodes.clone(),
            relations: vec![relation("r1", "n1", "n2")],
        });
        assert_eq!(model.selection, Selection::None);
    }

    #[test]
    fn deleting_a_node_drops_its_relations_immediately() {
        let (mut model, requests) = model(true);
        model.apply_canvas_event(CanvasEvent::NodeClicked("n2".to_owned()));
        model.delete_node("n2");

        assert_eq!(model.selection, Selection::None);
        assert!(model.node("n2").is_none());
        assert!(model.relations.is_empty());
        assert_eq!(model.canvas.graph().edges.len(), 0);
        assert_eq!(sent(&requests), vec![ApiRequest::DeleteNode("n2".to_owned())]);
    }

    #[test]
    fn saving_a_node_trims_the_label() {
        let (mut model, requests) = model(true);
        model.save_node(&NodeEditor {
            node_id: "n3".to_owned(),
            label: "  Power series ".to_owned(),
            kind: Some("topic".to_owned()),
            description: String::new(),
        });
        model.save_node(&NodeEditor {
            node_id: "n3".to_owned(),
            label: "   ".to_owned(),
            kind: None,
            description: String::new(),
        });

        let sent = sent(&requests);
        let [ApiRequest::UpdateNode { node_id, patch }] = sent.as_slice() else {
            panic!("expected a single update");
        };
        assert_eq!(node_id, "n3");
        assert_eq!(patch.label.as_deref(), Some("Power series"));
        assert_eq!(patch.kind, Some(Some("topic".to_owned())));
    }

    #[test]
    fn saving_a_node_without_type_clears_it() {
        let (mut model, requests) = model(true);
        model.save_node(&NodeEditor {
            node_id: "n1".to_owned(),
            label: "Limits".to_owned(),
            kind: None,
            description: String::new(),
        });

        let sent = sent(&requests);
        let [ApiRequest::UpdateNode { patch, .. }] = sent.as_slice() else {
            panic!("expected a single update");
        };
        assert_eq!(patch.kind, Some(None));
    }
}
