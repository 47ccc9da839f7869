use std::collections::HashSet;

use eframe::egui::{Color32, Pos2, Rect, Stroke, Vec2};

use crate::config::Locale;
use crate::util::{LABEL_DISPLAY_CHARS, truncate_label};

use super::super::render_utils::{
    EDGE_LABEL_COLOR, LABEL_COLOR, NODE_STROKE_COLOR, RUBBER_BAND_COLOR, SEARCH_RING_COLOR,
    SELECTED_NODE_COLOR, TAG_COLOR, category_color, circle_visible, edge_visible, relation_color,
};
use super::super::viewport::Viewport;
use super::Selection;
use super::build::CanvasGraph;

pub(crate) const NODE_RADIUS: f32 = 20.0;
pub(crate) const HOVER_RADIUS: f32 = 25.0;
pub(crate) const EDGE_LABEL_SIZE: f32 = 10.0;
const NODE_LABEL_SIZE: f32 = 12.0;
const NODE_TAG_SIZE: f32 = 10.0;
const NODE_LABEL_OFFSET: f32 = 35.0;
const NODE_TAG_OFFSET: f32 = 50.0;
const EDGE_WIDTH_PER_WEIGHT: f32 = 4.0;
const HOVER_WIDTH_PER_WEIGHT: f32 = 6.0;
const MIN_EDGE_WIDTH: f32 = 1.0;
const SELECTED_EDGE_EXTRA_WIDTH: f32 = 2.0;
const ARROW_LENGTH: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 5.0;
const RUBBER_BAND_WIDTH: f32 = 3.0;
const RUBBER_BAND_DASH: f32 = 5.0;
const RUBBER_BAND_OPACITY: f32 = 0.7;
const SEARCH_RING_GAP: f32 = 6.0;
const LOOP_RADIUS: f32 = 14.0;
/// How far the loop circle's centre sits past the node rim, in loop radii.
const LOOP_LIFT: f32 = 0.4;

/// Unscaled stroke width of a relation line.
pub(crate) fn edge_width(weight: f32, selected: bool) -> f32 {
    let width = (weight * EDGE_WIDTH_PER_WEIGHT).max(MIN_EDGE_WIDTH);
    if selected {
        width + SELECTED_EDGE_EXTRA_WIDTH
    } else {
        width
    }
}

/// Screen-space circle used for a relation whose two ends are the same node.
/// The loop sits on top of the node and overlaps its rim.
pub(crate) fn self_loop_circle(node_center: Pos2, node_radius: f32, scale: f32) -> (Pos2, f32) {
    let radius = LOOP_RADIUS * scale;
    let center = node_center - Vec2::new(0.0, node_radius + radius * LOOP_LIFT);
    (center, radius)
}

/// Where the midpoint label of a self-loop goes.
pub(crate) fn self_loop_label_pos(loop_center: Pos2, loop_radius: f32, scale: f32) -> Pos2 {
    loop_center - Vec2::new(0.0, loop_radius + EDGE_LABEL_SIZE * scale * 0.6)
}

/// Right-hand point where the loop meets the node rim.
fn self_loop_entry(
    node_center: Pos2,
    node_radius: f32,
    loop_center: Pos2,
    loop_radius: f32,
) -> Pos2 {
    let distance = node_center.distance(loop_center);
    if distance <= f32::EPSILON {
        return node_center;
    }
    let along = (distance * distance + node_radius * node_radius - loop_radius * loop_radius)
        / (2.0 * distance);
    let across = (node_radius * node_radius - along * along).max(0.0).sqrt();
    let axis = (loop_center - node_center) / distance;
    node_center + axis * along - axis.rot90() * across
}

/// One drawing primitive in canvas-local screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DrawCommand {
    Edge {
        edge: usize,
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    Loop {
        edge: usize,
        center: Pos2,
        radius: f32,
        stroke: Stroke,
    },
    Arrowhead {
        edge: usize,
        points: [Pos2; 3],
        color: Color32,
    },
    Text {
        pos: Pos2,
        text: String,
        size: f32,
        color: Color32,
        strong: bool,
    },
    RubberBand {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
        dash: f32,
        gap: f32,
    },
    Ring {
        center: Pos2,
        radius: f32,
        stroke: Stroke,
    },
    Node {
        node: usize,
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Scene {
    pub(crate) commands: Vec<DrawCommand>,
}

#[cfg(test)]
impl Scene {
    pub(crate) fn edges(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| {
                matches!(command, DrawCommand::Edge { .. } | DrawCommand::Loop { .. })
            })
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Node { .. }))
    }

    pub(crate) fn has_rubber_band(&self) -> bool {
        self.commands
            .iter()
            .any(|command| matches!(command, DrawCommand::RubberBand { .. }))
    }
}

pub(crate) struct SceneInput<'a> {
    pub(crate) graph: &'a CanvasGraph,
    pub(crate) positions: &'a [Vec2],
    pub(crate) selection: &'a Selection,
    pub(crate) viewport: Viewport,
    pub(crate) canvas_size: Vec2,
    pub(crate) hovered: Option<usize>,
    /// Source node and pointer world position while a relation is drawn.
    pub(crate) rubber_band: Option<(usize, Vec2)>,
    pub(crate) highlighted: &'a HashSet<String>,
    pub(crate) locale: Locale,
}

fn visible_area(canvas_size: Vec2) -> Option<Rect> {
    (canvas_size.x > 0.0 && canvas_size.y > 0.0)
        .then(|| Rect::from_min_size(Pos2::ZERO, canvas_size))
}

pub(crate) fn build_scene(input: &SceneInput<'_>) -> Scene {
    let SceneInput {
        graph,
        positions,
        selection,
        viewport,
        canvas_size,
        hovered,
        rubber_band,
        highlighted,
        locale,
    } = *input;

    let scale = viewport.scale;
    let area = visible_area(canvas_size);
    let screen = |index: usize| positions.get(index).map(|world| viewport.to_screen(*world));
    let radius_of = |index: usize| {
        if hovered == Some(index) {
            HOVER_RADIUS
        } else {
            NODE_RADIUS
        }
    };

    let mut lines = Vec::new();
    let mut arrows = Vec::new();
    let mut edge_labels = Vec::new();

    for (index, edge) in graph.edges.iter().enumerate() {
        let (Some(from), Some(to)) = (screen(edge.source), screen(edge.target)) else {
            continue;
        };
        let selected = edge
            .id
            .as_deref()
            .is_some_and(|id| selection.is_relation(id));
        let (width, opacity) = match hovered {
            Some(node) if edge.touches(node) => {
                let width = (edge.weight * HOVER_WIDTH_PER_WEIGHT).max(MIN_EDGE_WIDTH);
                let extra = if selected { SELECTED_EDGE_EXTRA_WIDTH } else { 0.0 };
                (width + extra, 1.0)
            }
            Some(_) => (edge_width(edge.weight, selected), 0.1),
            None => (edge_width(edge.weight, selected), if selected { 0.9 } else { 0.6 }),
        };
        let color = relation_color(&edge.kind).gamma_multiply(opacity);
        let stroke = Stroke::new(width * scale, color);

        let label_pos = if edge.source == edge.target {
            let node_radius = radius_of(edge.source) * scale;
            let (center, radius) = self_loop_circle(from, node_radius, scale);
            if let Some(area) = area
                && !circle_visible(area, center, radius + HOVER_RADIUS * scale)
            {
                continue;
            }

            lines.push(DrawCommand::Loop {
                edge: index,
                center,
                radius,
                stroke,
            });
            if edge.directed {
                let tip = self_loop_entry(from, node_radius, center, radius);
                let direction = (from - tip).normalized();
                let normal = direction.rot90();
                let base = tip - direction * ARROW_LENGTH * scale;
                arrows.push(DrawCommand::Arrowhead {
                    edge: index,
                    points: [
                        tip,
                        base + normal * ARROW_HALF_WIDTH * scale,
                        base - normal * ARROW_HALF_WIDTH * scale,
                    ],
                    color,
                });
            }
            self_loop_label_pos(center, radius, scale)
        } else {
            let offset = to - from;
            let length = offset.length();
            if length <= f32::EPSILON {
                continue;
            }
            if let Some(area) = area
                && !edge_visible(area, from, to, HOVER_RADIUS * scale)
            {
                continue;
            }

            let direction = offset / length;
            let tip = to - direction * radius_of(edge.target) * scale;

            lines.push(DrawCommand::Edge {
                edge: index,
                from,
                to: if edge.directed { tip } else { to },
                stroke,
            });

            if edge.directed {
                let normal = direction.rot90();
                let base = tip - direction * ARROW_LENGTH * scale;
                arrows.push(DrawCommand::Arrowhead {
                    edge: index,
                    points: [
                        tip,
                        base + normal * ARROW_HALF_WIDTH * scale,
                        base - normal * ARROW_HALF_WIDTH * scale,
                    ],
                    color,
                });
            }
            from.lerp(to, 0.5)
        };

        let label_color = if selected {
            LABEL_COLOR
        } else {
            EDGE_LABEL_COLOR
        };
        edge_labels.push(DrawCommand::Text {
            pos: label_pos,
            text: locale.relation_tag(&edge.kind).to_owned(),
            size: EDGE_LABEL_SIZE * scale,
            color: label_color.gamma_multiply(if opacity < 0.5 { opacity } else { 1.0 }),
            strong: selected,
        });
    }

    let mut commands = lines;
    commands.append(&mut arrows);
    commands.append(&mut edge_labels);

    if let Some((source, pointer_world)) = rubber_band
        && let Some(from) = screen(source)
    {
        commands.push(DrawCommand::RubberBand {
            from,
            to: viewport.to_screen(pointer_world),
            stroke: Stroke::new(
                RUBBER_BAND_WIDTH * scale,
                RUBBER_BAND_COLOR.gamma_multiply(RUBBER_BAND_OPACITY),
            ),
            dash: RUBBER_BAND_DASH * scale,
            gap: RUBBER_BAND_DASH * scale,
        });
    }

    let mut node_labels = Vec::new();
    for (index, node) in graph.nodes.iter().enumerate() {
        let Some(center) = screen(index) else {
            continue;
        };
        let radius = radius_of(index) * scale;
        if let Some(area) = area
            && !circle_visible(area, center, radius + NODE_TAG_OFFSET * scale)
        {
            continue;
        }

        if highlighted.contains(&node.id) {
            commands.push(DrawCommand::Ring {
                center,
                radius: radius + SEARCH_RING_GAP * scale,
                stroke: Stroke::new(3.0 * scale, SEARCH_RING_COLOR),
            });
        }

        let stroke = if selection.is_node(&node.id) {
            Stroke::new(4.0 * scale, SELECTED_NODE_COLOR)
        } else {
            Stroke::new(2.0 * scale, NODE_STROKE_COLOR)
        };
        commands.push(DrawCommand::Node {
            node: index,
            center,
            radius,
            fill: category_color(node.kind.as_deref()),
            stroke,
        });

        node_labels.push(DrawCommand::Text {
            pos: center + Vec2::new(0.0, NODE_LABEL_OFFSET * scale),
            text: truncate_label(&node.label, LABEL_DISPLAY_CHARS),
            size: NODE_LABEL_SIZE * scale,
            color: LABEL_COLOR,
            strong: false,
        });
        if let Some(kind) = node.kind.as_deref().filter(|kind| !kind.is_empty()) {
            node_labels.push(DrawCommand::Text {
                pos: center + Vec2::new(0.0, NODE_TAG_OFFSET * scale),
                text: kind.to_owned(),
                size: NODE_TAG_SIZE * scale,
                color: TAG_COLOR,
                strong: false,
            });
        }
    }
    commands.append(&mut node_labels);

    Scene { commands }
}
