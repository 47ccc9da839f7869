use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const DISTANCE_MIN_SQ: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    /// Share of the correction taken by the target; the better-connected end
    /// moves less.
    pub(super) bias: f32,
}

#[derive(Clone, Copy)]
pub(super) struct ManyBodyParams {
    pub(super) strength: f32,
    pub(super) theta: f32,
    pub(super) alpha: f32,
}

fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Springs pull linked pairs toward `distance`, reading positions one step
/// ahead so consecutive links see each other's corrections.
pub(super) fn apply_links(
    links: &[Link],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    distance: f32,
    strength: f32,
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta =
            positions[target] + velocities[target] - positions[source] - velocities[source];
        if delta.length_sq() == 0.0 {
            delta = fallback_direction(source, target) * 1e-3;
        }

        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * strength);
        velocities[target] -= correction * link.bias;
        velocities[source] += correction * (1.0 - link.bias);
    }
}

fn pair_push(
    index: usize,
    other: usize,
    point: Vec2,
    other_point: Vec2,
    weight: f32,
    velocity: &mut Vec2,
) {
    let mut delta = other_point - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq == 0.0 {
        delta = fallback_direction(index, other) * 1e-3;
        distance_sq = delta.length_sq();
    }
    if distance_sq < DISTANCE_MIN_SQ {
        distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
    }
    *velocity += delta * weight / distance_sq;
}

/// Barnes-Hut charge: distant cells act as one body at their center of mass.
pub(super) fn apply_many_body(
    cell: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ManyBodyParams,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        let weight = params.strength * params.alpha;
        for &other in &cell.indices {
            if other != index {
                pair_push(index, other, point, positions[other], weight, velocity);
            }
        }
        return;
    }

    let delta = cell.center_of_mass - point;
    let distance_sq = delta.length_sq();
    let side = cell.bounds.side_length();
    let far_enough = side * side / (params.theta * params.theta) < distance_sq;

    if far_enough && !cell.bounds.contains(point) {
        let weight = params.strength * cell.mass * params.alpha;
        let distance_sq = if distance_sq < DISTANCE_MIN_SQ {
            (DISTANCE_MIN_SQ * distance_sq).sqrt()
        } else {
            distance_sq
        };
        *velocity += delta * weight / distance_sq;
        return;
    }

    for child in cell.children() {
        apply_many_body(child, index, positions, params, velocity);
    }
}

/// Shifts every position so the mean sits on `center`.
pub(super) fn apply_center(positions: &mut [Vec2], center: Vec2) {
    let (sum, count) = positions
        .iter()
        .filter(|point| point.x.is_finite() && point.y.is_finite())
        .fold((Vec2::ZERO, 0usize), |(sum, count), point| (sum + *point, count + 1));
    if count == 0 {
        return;
    }

    let shift = sum / count as f32 - center;
    for point in positions.iter_mut() {
        *point -= shift;
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) radius: f32,
    pub(super) strength: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let min_distance = params.radius * 2.0;
    let mut offset = predicted[from] - predicted[to];
    let distance_sq = offset.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }
    if distance_sq == 0.0 {
        offset = fallback_direction(from, to) * 1e-3;
    }

    let distance = offset.length();
    let push = offset * ((min_distance - distance) / distance * params.strength * 0.5);
    deltas[from] += push;
    deltas[to] -= push;
}

/// Dual-tree walk over `predicted` positions; cell pairs further apart than
/// two radii are skipped whole.
pub(super) fn accumulate_collisions(
    cell_a: &QuadNode,
    cell_b: &QuadNode,
    same_cell: bool,
    predicted: &[Vec2],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = params.radius * 2.0;
    if cell_a.bounds.gap_sq(cell_b.bounds) > reach * reach {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        if same_cell {
            for (position, &from) in cell_a.indices.iter().enumerate() {
                for &to in &cell_a.indices[position + 1..] {
                    resolve_overlap(from, to, predicted, params, deltas);
                }
            }
        } else {
            for &from in &cell_a.indices {
                for &to in &cell_b.indices {
                    resolve_overlap(from, to, predicted, params, deltas);
                }
            }
        }
        return;
    }

    if same_cell {
        let children = cell_a.children().collect::<Vec<_>>();
        for (position, child_a) in children.iter().enumerate() {
            accumulate_collisions(child_a, child_a, true, predicted, params, deltas);
            for child_b in &children[position + 1..] {
                accumulate_collisions(child_a, child_b, false, predicted, params, deltas);
            }
        }
        return;
    }

    let split_a = if cell_a.is_leaf() {
        false
    } else if cell_b.is_leaf() {
        true
    } else {
        cell_a.bounds.half_extent >= cell_b.bounds.half_extent
    };

    if split_a {
        for child in cell_a.children() {
            accumulate_collisions(child, cell_b, false, predicted, params, deltas);
        }
    } else {
        for child in cell_b.children() {
            accumulate_collisions(cell_a, child, false, predicted, params, deltas);
        }
    }
}
