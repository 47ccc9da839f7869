mod build;
mod interaction;
mod scene;
mod view;

use std::collections::HashSet;

use eframe::egui::Vec2;

use crate::api::{Node, Relation};
use crate::config::Locale;

use super::physics::Simulation;
use super::viewport::Viewport;

pub(crate) use build::CanvasGraph;
pub(crate) use interaction::{CanvasEvent, Gesture, PointerInput};
pub(crate) use scene::{DrawCommand, Scene, SceneInput, build_scene};

/// At most one node or one relation is selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Selection {
    #[default]
    None,
    Node(String),
    Relation(String),
}

impl Selection {
    pub(crate) fn is_node(&self, id: &str) -> bool {
        matches!(self, Self::Node(selected) if selected == id)
    }

    pub(crate) fn is_relation(&self, id: &str) -> bool {
        matches!(self, Self::Relation(selected) if selected == id)
    }

    /// Follows the selection-changing canvas events; others are ignored.
    pub(crate) fn apply(&mut self, event: &CanvasEvent) {
        match event {
            CanvasEvent::NodeClicked(id) => *self = Self::Node(id.clone()),
            CanvasEvent::RelationClicked(id) => *self = Self::Relation(id.clone()),
            CanvasEvent::Deselected => *self = Self::None,
            CanvasEvent::NodeCreateRequested(_)
            | CanvasEvent::RelationCreateRequested { .. }
            | CanvasEvent::NodeMoved { .. } => {}
        }
    }
}

/// The interactive graph surface: layout, viewport, gesture state and hover
/// for one node/relation set.
pub(crate) struct GraphCanvas {
    graph: CanvasGraph,
    simulation: Simulation,
    viewport: Viewport,
    gesture: Gesture,
    hovered: Option<String>,
    editable: bool,
    locale: Locale,
    canvas_size: Vec2,
}

impl GraphCanvas {
    pub(crate) fn new(editable: bool, locale: Locale) -> Self {
        Self {
            graph: CanvasGraph::default(),
            simulation: Simulation::default(),
            viewport: Viewport::default(),
            gesture: Gesture::Idle,
            hovered: None,
            editable,
            locale,
            canvas_size: Vec2::ZERO,
        }
    }

    /// Replaces the rendered data. Known nodes keep their layout position.
    pub(crate) fn sync(&mut self, nodes: &[Node], relations: &[Relation]) {
        self.graph = CanvasGraph::build(nodes, relations);
        self.simulation
            .rebuild(self.graph.body_specs(), &self.graph.link_pairs());

        if let Some(hovered) = &self.hovered
            && self.graph.node_index(hovered).is_none()
        {
            self.hovered = None;
        }
        if !self.gesture.refers_to_known_nodes(&self.graph) {
            self.cancel_gesture();
        }
    }

    /// The centering force aims at the canvas middle at identity zoom.
    pub(crate) fn set_canvas_size(&mut self, size: Vec2) {
        if size != self.canvas_size && size.x > 0.0 && size.y > 0.0 {
            self.canvas_size = size;
            self.simulation.set_center(size * 0.5);
        }
    }

    /// Advances the layout one step; `true` while it is still moving.
    pub(crate) fn tick(&mut self) -> bool {
        self.simulation.tick()
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.simulation.is_active() || !matches!(self.gesture, Gesture::Idle)
    }

    pub(crate) fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub(crate) fn graph(&self) -> &CanvasGraph {
        &self.graph
    }

    pub(crate) fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub(crate) fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub(crate) fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub(crate) fn hovered_node(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub(crate) fn node_position(&self, id: &str) -> Option<Vec2> {
        self.simulation.position_of(id)
    }

    pub(crate) fn is_pinned(&self, id: &str) -> bool {
        self.simulation.is_pinned(id)
    }

    pub(crate) fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Scrolls so the node sits mid-canvas, keeping the zoom.
    pub(crate) fn focus_node(&mut self, id: &str) {
        if let Some(position) = self.node_position(id) {
            self.viewport.center_on(position, self.canvas_size);
        }
    }

    fn hovered_index(&self) -> Option<usize> {
        self.hovered
            .as_deref()
            .and_then(|id| self.graph.node_index(id))
    }

    pub(crate) fn scene(&self, selection: &Selection, highlighted: &HashSet<String>) -> Scene {
        let rubber_band = match &self.gesture {
            Gesture::DrawingRelation {
                source,
                pointer_world,
            } => self
                .graph
                .node_index(source)
                .map(|index| (index, *pointer_world)),
            _ => None,
        };

        build_scene(&SceneInput {
            graph: &self.graph,
            positions: self.simulation.positions(),
            selection,
            viewport: self.viewport,
            canvas_size: self.canvas_size,
            hovered: self.hovered_index(),
            rubber_band,
            highlighted,
            locale: self.locale,
        })
    }
}
