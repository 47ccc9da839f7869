use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use super::GraphCanvas;
use super::build::CanvasGraph;
use super::hit_test::{edge_at, node_at};

pub(crate) const CLICK_MAX_SECONDS: f64 = 0.3;
pub(crate) const DRAG_THRESHOLD: f32 = 8.0;

/// Pointer input in canvas-local screen pixels. `modifier` is the
/// command/ctrl key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PointerInput {
    Down { pos: Pos2, modifier: bool },
    Move { pos: Pos2 },
    Up { pos: Pos2, modifier: bool },
    DoubleClick { pos: Pos2 },
    Wheel { pos: Pos2, delta: f32, modifier: bool },
    Pinch { pos: Pos2, factor: f32 },
    Cancel,
}

/// What the canvas asks of its host.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CanvasEvent {
    NodeClicked(String),
    RelationClicked(String),
    Deselected,
    NodeCreateRequested(Vec2),
    RelationCreateRequested { from: String, to: String },
    NodeMoved { id: String, position: Vec2 },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Gesture {
    Idle,
    PendingClickOrDrag {
        node: String,
        started_at: f64,
        start: Pos2,
        grab_offset: Vec2,
    },
    Dragging {
        node: String,
        grab_offset: Vec2,
    },
    DrawingRelation {
        source: String,
        pointer_world: Vec2,
    },
    CanvasPress {
        start: Pos2,
        last: Pos2,
        moved: bool,
        pans: bool,
    },
    /// Modifier press on a node of a read-only canvas, swallowed until release.
    Inert,
}

impl Gesture {
    pub(super) fn refers_to_known_nodes(&self, graph: &CanvasGraph) -> bool {
        match self {
            Self::PendingClickOrDrag { node, .. } | Self::Dragging { node, .. } => {
                graph.node_index(node).is_some()
            }
            Self::DrawingRelation { source, .. } => graph.node_index(source).is_some(),
            Self::Idle | Self::CanvasPress { .. } | Self::Inert => true,
        }
    }
}

impl GraphCanvas {
    pub(crate) fn handle(&mut self, input: PointerInput, now: f64) -> Vec<CanvasEvent> {
        let mut events = Vec::new();

        match input {
            PointerInput::Down { pos, modifier } => self.pointer_down(pos, modifier, now),
            PointerInput::Move { pos } => self.pointer_move(pos),
            PointerInput::Up { pos, modifier } => self.pointer_up(pos, modifier, now, &mut events),
            PointerInput::DoubleClick { pos } => self.double_click(pos, &mut events),
            PointerInput::Wheel {
                pos,
                delta,
                modifier,
            } => {
                if !modifier {
                    self.viewport.wheel_zoom_at(pos, delta);
                }
            }
            PointerInput::Pinch { pos, factor } => self.viewport.zoom_at(pos, factor),
            PointerInput::Cancel => self.cancel_gesture(),
        }

        if !events.is_empty() {
            debug!(?events, "canvas gesture finished");
        }
        events
    }

    fn node_under(&self, pos: Pos2) -> Option<usize> {
        node_at(
            &self.graph,
            self.simulation.positions(),
            &self.viewport,
            self.hovered_index(),
            pos,
        )
    }

    fn relation_under(&self, pos: Pos2) -> Option<String> {
        edge_at(
            &self.graph,
            self.simulation.positions(),
            &self.viewport,
            self.locale,
            pos,
        )
        .and_then(|index| self.graph.edges[index].id.clone())
    }

    fn update_hover(&mut self, pos: Pos2) {
        self.hovered = self
            .node_under(pos)
            .map(|index| self.graph.nodes[index].id.clone());
    }

    pub(super) fn cancel_gesture(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::PendingClickOrDrag { node, .. } | Gesture::Dragging { node, .. } => {
                self.simulation.end_drag(&node);
            }
            Gesture::DrawingRelation { source, .. } => {
                debug!(%source, "relation drawing cancelled");
            }
            Gesture::Idle | Gesture::CanvasPress { .. } | Gesture::Inert => {}
        }
    }

    fn pointer_down(&mut self, pos: Pos2, modifier: bool, now: f64) {
        // A second press while drawing picks the target on release.
        if matches!(self.gesture, Gesture::DrawingRelation { .. }) {
            self.pointer_move(pos);
            return;
        }
        if !matches!(self.gesture, Gesture::Idle) {
            self.cancel_gesture();
        }

        self.update_hover(pos);
        let world = self.viewport.to_world(pos);

        self.gesture = match self.node_under(pos) {
            Some(index) => {
                let node = self.graph.nodes[index].id.clone();
                let node_world = self.simulation.positions()[index];
                if modifier && self.editable {
                    Gesture::DrawingRelation {
                        source: node,
                        pointer_world: node_world,
                    }
                } else if modifier {
                    Gesture::Inert
                } else {
                    Gesture::PendingClickOrDrag {
                        node,
                        started_at: now,
                        start: pos,
                        grab_offset: node_world - world,
                    }
                }
            }
            None => Gesture::CanvasPress {
                start: pos,
                last: pos,
                moved: false,
                pans: !modifier,
            },
        };
    }

    fn pointer_move(&mut self, pos: Pos2) {
        let world = self.viewport.to_world(pos);

        self.gesture = match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => {
                self.update_hover(pos);
                Gesture::Idle
            }
            Gesture::PendingClickOrDrag {
                node,
                started_at,
                start,
                grab_offset,
            } => {
                if pos.distance(start) >= DRAG_THRESHOLD {
                    self.simulation.start_drag(&node);
                    self.simulation.drag_to(&node, world + grab_offset);
                    Gesture::Dragging { node, grab_offset }
                } else {
                    Gesture::PendingClickOrDrag {
                        node,
                        started_at,
                        start,
                        grab_offset,
                    }
                }
            }
            Gesture::Dragging { node, grab_offset } => {
                self.simulation.drag_to(&node, world + grab_offset);
                Gesture::Dragging { node, grab_offset }
            }
            Gesture::DrawingRelation { source, .. } => {
                self.update_hover(pos);
                Gesture::DrawingRelation {
                    source,
                    pointer_world: world,
                }
            }
            Gesture::CanvasPress {
                start,
                last,
                moved,
                pans,
            } => {
                if pans {
                    self.viewport.pan_by(pos - last);
                }
                Gesture::CanvasPress {
                    start,
                    last: pos,
                    moved: moved || pos.distance(start) >= DRAG_THRESHOLD,
                    pans,
                }
            }
            Gesture::Inert => Gesture::Inert,
        };
    }

    fn pointer_up(&mut self, pos: Pos2, modifier: bool, now: f64, events: &mut Vec<CanvasEvent>) {
        let world = self.viewport.to_world(pos);

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle | Gesture::Inert => {}
            Gesture::PendingClickOrDrag {
                node,
                started_at,
                start,
                grab_offset,
            } => {
                let quick = now - started_at < CLICK_MAX_SECONDS;
                if quick && pos.distance(start) < DRAG_THRESHOLD {
                    events.push(CanvasEvent::NodeClicked(node));
                } else {
                    self.finish_drag(node, world + grab_offset, events);
                }
            }
            Gesture::Dragging { node, grab_offset } => {
                self.finish_drag(node, world + grab_offset, events);
            }
            Gesture::DrawingRelation { source, .. } => {
                let target = self
                    .node_under(pos)
                    .map(|index| self.graph.nodes[index].id.clone());
                match target {
                    Some(target) if target == source => {
                        self.gesture = Gesture::DrawingRelation {
                            source,
                            pointer_world: world,
                        };
                    }
                    Some(target) if modifier => {
                        events.push(CanvasEvent::RelationCreateRequested {
                            from: source,
                            to: target,
                        });
                    }
                    Some(_) => {}
                    None => {
                        if let Some(relation) = self.relation_under(pos) {
                            events.push(CanvasEvent::RelationClicked(relation));
                        }
                    }
                }
            }
            Gesture::CanvasPress { moved, .. } => {
                if !moved {
                    events.push(match self.relation_under(pos) {
                        Some(relation) => CanvasEvent::RelationClicked(relation),
                        None => CanvasEvent::Deselected,
                    });
                }
            }
        }

        self.update_hover(pos);
    }

    fn finish_drag(&mut self, node: String, position: Vec2, events: &mut Vec<CanvasEvent>) {
        self.simulation.end_drag(&node);
        if self.editable && position.x.is_finite() && position.y.is_finite() {
            self.simulation.pin(&node, position);
            events.push(CanvasEvent::NodeMoved { id: node, position });
        }
    }

    fn double_click(&mut self, pos: Pos2, events: &mut Vec<CanvasEvent>) {
        if !self.editable || !matches!(self.gesture, Gesture::Idle) {
            return;
        }
        if self.node_under(pos).is_some() || self.relation_under(pos).is_some() {
            return;
        }
        events.push(CanvasEvent::NodeCreateRequested(self.viewport.to_world(pos)));
    }
}
