use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use crate::api::RelationType;

use super::graph::{DrawCommand, Scene};
use super::viewport::Viewport;

pub(super) const CANVAS_BACKGROUND: Color32 = Color32::from_rgb(0xfa, 0xfa, 0xfa);
pub(super) const LABEL_COLOR: Color32 = Color32::from_rgb(0x2c, 0x3e, 0x50);
pub(super) const TAG_COLOR: Color32 = Color32::from_rgb(0x7f, 0x8c, 0x8d);
pub(super) const EDGE_LABEL_COLOR: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
pub(super) const NODE_STROKE_COLOR: Color32 = Color32::WHITE;
pub(super) const SELECTED_NODE_COLOR: Color32 = Color32::from_rgb(0xf3, 0x9c, 0x12);
pub(super) const RUBBER_BAND_COLOR: Color32 = Color32::from_rgb(0x66, 0x7e, 0xea);
pub(super) const SEARCH_RING_COLOR: Color32 = Color32::from_rgb(0xf1, 0xc4, 0x0f);

/// Known node categories in legend order.
pub(super) const CATEGORIES: [&str; 3] = ["concept", "topic", "skill"];

const MIN_TEXT_SIZE: f32 = 3.0;
const STRONG_TEXT_SHIFT: f32 = 0.8;

pub(super) fn category_color(kind: Option<&str>) -> Color32 {
    match kind {
        Some("concept") => Color32::from_rgb(0x34, 0x98, 0xdb),
        Some("topic") => Color32::from_rgb(0x9b, 0x59, 0xb6),
        Some("skill") => Color32::from_rgb(0xe6, 0x7e, 0x22),
        _ => Color32::from_rgb(0x95, 0xa5, 0xa6),
    }
}

pub(super) fn relation_color(kind: &RelationType) -> Color32 {
    match kind {
        RelationType::Prerequisite => Color32::from_rgb(0xe7, 0x4c, 0x3c),
        RelationType::Related => Color32::from_rgb(0x34, 0x98, 0xdb),
        RelationType::PartOf => Color32::from_rgb(0x2e, 0xcc, 0x71),
        RelationType::Other(_) => Color32::from_rgb(0x99, 0x99, 0x99),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, viewport: &Viewport) {
    painter.rect_filled(rect, 0.0, CANVAS_BACKGROUND);

    let step = (50.0 * viewport.scale).max(12.0);
    let origin = rect.min + viewport.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(0, 0, 0, 14));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Paints canvas-local scene commands with their origin at `origin`.
pub(super) fn paint_scene(painter: &Painter, origin: Pos2, scene: &Scene) {
    let offset = origin.to_vec2();

    for command in &scene.commands {
        match command {
            DrawCommand::Edge {
                from, to, stroke, ..
            } => {
                painter.line_segment([*from + offset, *to + offset], *stroke);
            }
            DrawCommand::Loop {
                center, radius, stroke, ..
            } => {
                painter.circle_stroke(*center + offset, *radius, *stroke);
            }
            DrawCommand::Arrowhead { points, color, .. } => {
                painter.add(Shape::convex_polygon(
                    points.iter().map(|point| *point + offset).collect(),
                    *color,
                    Stroke::NONE,
                ));
            }
            DrawCommand::Text {
                pos,
                text,
                size,
                color,
                strong,
            } => {
                if *size >= MIN_TEXT_SIZE {
                    let font = FontId::proportional(*size);
                    let pos = *pos + offset;
                    painter.text(pos, Align2::CENTER_CENTER, text, font.clone(), *color);
                    // The bundled fonts have no bold face; overdraw slightly offset.
                    if *strong {
                        painter.text(
                            pos + Vec2::new(STRONG_TEXT_SHIFT, 0.0),
                            Align2::CENTER_CENTER,
                            text,
                            font,
                            *color,
                        );
                    }
                }
            }
            DrawCommand::RubberBand {
                from,
                to,
                stroke,
                dash,
                gap,
            } => {
                painter.extend(Shape::dashed_line(
                    &[*from + offset, *to + offset],
                    *stroke,
                    *dash,
                    *gap,
                ));
            }
            DrawCommand::Ring {
                center,
                radius,
                stroke,
            } => {
                painter.circle_stroke(*center + offset, *radius, *stroke);
            }
            DrawCommand::Node {
                center,
                radius,
                fill,
                stroke,
                ..
            } => {
                painter.circle(*center + offset, *radius, *fill, *stroke);
            }
        }
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let expanded = rect.expand(padding);
    let top_left = expanded.left_top();
    let top_right = expanded.right_top();
    let bottom_left = expanded.left_bottom();
    let bottom_right = expanded.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}
