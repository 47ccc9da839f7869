mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use forces::{
    CollisionParams, Link, ManyBodyParams, accumulate_collisions, apply_center, apply_links,
    apply_many_body,
};
use quadtree::QuadNode;

const DRAG_ALPHA_TARGET: f32 = 0.3;
const REHEAT_ALPHA: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ForceParams {
    pub(crate) link_distance: f32,
    pub(crate) link_strength: f32,
    pub(crate) charge: f32,
    pub(crate) theta: f32,
    pub(crate) collide_radius: f32,
    pub(crate) collide_strength: f32,
    pub(crate) velocity_decay: f32,
    pub(crate) alpha_min: f32,
    pub(crate) alpha_decay: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            link_distance: 150.0,
            link_strength: 0.5,
            charge: -300.0,
            theta: 0.9,
            collide_radius: 40.0,
            collide_strength: 1.0,
            velocity_decay: 0.4,
            alpha_min,
            // Cools from 1 to `alpha_min` in roughly 300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
        }
    }
}

/// One body handed to [`Simulation::rebuild`]; `pin` is the persisted
/// position, if any.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BodySpec {
    pub(crate) id: String,
    pub(crate) pin: Option<Vec2>,
}

#[derive(Clone, Debug)]
struct BodyState {
    id: String,
    pin: Option<Vec2>,
    drag_target: Option<Vec2>,
}

impl BodyState {
    fn fixed_position(&self) -> Option<Vec2> {
        self.drag_target.or(self.pin)
    }
}

#[derive(Default)]
struct Scratch {
    predicted: Vec<Vec2>,
    collision_deltas: Vec<Vec2>,
}

/// Cooling force-directed layout. Pinned and dragged bodies never move on
/// their own; everything else settles under link, charge, centering and
/// collision forces until alpha drops below `alpha_min`.
pub(crate) struct Simulation {
    params: ForceParams,
    bodies: Vec<BodyState>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    links: Vec<Link>,
    link_pairs: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
    alpha: f32,
    alpha_target: f32,
    center: Vec2,
    scratch: Scratch,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_params(ForceParams::default())
    }
}

/// Phyllotaxis spiral around `center`, used for bodies with no usable
/// position.
pub(crate) fn initial_placement(index: usize, center: Vec2) -> Vec2 {
    let radius = 10.0 * (0.5 + index as f32).sqrt();
    let angle = index as f32 * std::f32::consts::PI * (3.0 - 5f32.sqrt());
    center + vec2(radius * angle.cos(), radius * angle.sin())
}

fn is_finite(point: Vec2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

impl Simulation {
    pub(crate) fn with_params(params: ForceParams) -> Self {
        Self {
            params,
            bodies: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            links: Vec::new(),
            link_pairs: Vec::new(),
            index_by_id: HashMap::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            center: Vec2::ZERO,
            scratch: Scratch::default(),
        }
    }

    /// Replaces the body and link sets. Bodies already known by id keep their
    /// position, velocity and any drag in flight; new ones start at their pin
    /// or on the spiral. Structural changes reheat the layout.
    pub(crate) fn rebuild(&mut self, specs: Vec<BodySpec>, link_pairs: &[(usize, usize)]) {
        let mut previous = HashMap::with_capacity(self.bodies.len());
        for (index, body) in self.bodies.drain(..).enumerate() {
            previous.insert(body.id.clone(), (body, self.positions[index], self.velocities[index]));
        }

        let mut saw_new_body = false;
        let mut changed = previous.len() != specs.len();
        let mut positions = Vec::with_capacity(specs.len());
        let mut velocities = Vec::with_capacity(specs.len());
        let mut bodies = Vec::with_capacity(specs.len());

        for (index, spec) in specs.into_iter().enumerate() {
            let pin = spec.pin.filter(|pin| is_finite(*pin));
            match previous.remove(&spec.id) {
                Some((mut body, position, velocity)) => {
                    changed |= body.pin != pin;
                    body.pin = pin;
                    positions.push(body.fixed_position().unwrap_or(position));
                    velocities.push(velocity);
                    bodies.push(body);
                }
                None => {
                    saw_new_body = true;
                    changed = true;
                    positions.push(pin.unwrap_or_else(|| initial_placement(index, self.center)));
                    velocities.push(Vec2::ZERO);
                    bodies.push(BodyState {
                        id: spec.id,
                        pin,
                        drag_target: None,
                    });
                }
            }
        }

        let node_count = bodies.len();
        let valid_pairs = link_pairs
            .iter()
            .copied()
            .filter(|&(source, target)| source < node_count && target < node_count && source != target)
            .collect::<Vec<_>>();
        changed |= valid_pairs != self.link_pairs;

        let mut degree = vec![0usize; node_count];
        for &(source, target) in &valid_pairs {
            degree[source] += 1;
            degree[target] += 1;
        }
        self.links = valid_pairs
            .iter()
            .map(|&(source, target)| Link {
                source,
                target,
                bias: degree[source] as f32 / (degree[source] + degree[target]) as f32,
            })
            .collect();
        self.link_pairs = valid_pairs;

        self.index_by_id = bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (body.id.clone(), index))
            .collect();
        self.bodies = bodies;
        self.positions = positions;
        self.velocities = velocities;

        if saw_new_body {
            self.reheat(1.0);
        } else if changed {
            self.reheat(REHEAT_ALPHA);
        }
    }

    /// Advances the layout by one step. Returns `false` once cooled.
    pub(crate) fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }

        self.replace_diverged();
        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;
        let params = self.params;

        apply_links(
            &self.links,
            &self.positions,
            &mut self.velocities,
            params.link_distance,
            params.link_strength,
            alpha,
        );

        if let Some(tree) = QuadNode::build(&self.positions) {
            let many_body = ManyBodyParams {
                strength: params.charge,
                theta: params.theta,
                alpha,
            };
            for (index, velocity) in self.velocities.iter_mut().enumerate() {
                apply_many_body(&tree, index, &self.positions, many_body, velocity);
            }
        }

        apply_center(&mut self.positions, self.center);

        let scratch = &mut self.scratch;
        scratch.predicted.clear();
        scratch.predicted.extend(
            self.positions
                .iter()
                .zip(&self.velocities)
                .map(|(position, velocity)| *position + *velocity),
        );
        scratch.collision_deltas.clear();
        scratch.collision_deltas.resize(self.positions.len(), Vec2::ZERO);
        if let Some(tree) = QuadNode::build(&scratch.predicted) {
            accumulate_collisions(
                &tree,
                &tree,
                true,
                &scratch.predicted,
                CollisionParams {
                    radius: params.collide_radius,
                    strength: params.collide_strength,
                },
                &mut scratch.collision_deltas,
            );
        }

        let keep = 1.0 - params.velocity_decay;
        for (index, body) in self.bodies.iter().enumerate() {
            let velocity = &mut self.velocities[index];
            let position = &mut self.positions[index];

            if let Some(fixed) = body.fixed_position() {
                *position = fixed;
                *velocity = Vec2::ZERO;
                continue;
            }

            *velocity = (*velocity + scratch.collision_deltas[index]) * keep;
            *position += *velocity;
        }
        self.replace_diverged();

        true
    }

    fn replace_diverged(&mut self) {
        for (index, (position, velocity)) in
            self.positions.iter_mut().zip(&mut self.velocities).enumerate()
        {
            if !is_finite(*position) || !is_finite(*velocity) {
                *position = initial_placement(index, self.center);
                *velocity = Vec2::ZERO;
            }
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.alpha >= self.params.alpha_min || self.alpha_target > self.alpha
    }

    fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    pub(crate) fn set_center(&mut self, center: Vec2) {
        if is_finite(center) {
            self.center = center;
        }
    }

    pub(crate) fn pin(&mut self, id: &str, position: Vec2) {
        if !is_finite(position) {
            return;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            return;
        };
        self.bodies[index].pin = Some(position);
        if self.bodies[index].drag_target.is_none() {
            self.positions[index] = position;
        }
        self.velocities[index] = Vec2::ZERO;
    }

    pub(crate) fn is_pinned(&self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .is_some_and(|&index| self.bodies[index].pin.is_some())
    }

    pub(crate) fn start_drag(&mut self, id: &str) {
        let Some(&index) = self.index_by_id.get(id) else {
            return;
        };
        self.bodies[index].drag_target = Some(self.positions[index]);
        self.velocities[index] = Vec2::ZERO;
        self.alpha_target = DRAG_ALPHA_TARGET;
    }

    /// Moves a dragged body immediately so the current frame already shows it
    /// under the pointer.
    pub(crate) fn drag_to(&mut self, id: &str, position: Vec2) {
        if !is_finite(position) {
            return;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            return;
        };
        if self.bodies[index].drag_target.is_some() {
            self.bodies[index].drag_target = Some(position);
            self.positions[index] = position;
        }
    }

    pub(crate) fn end_drag(&mut self, id: &str) {
        if let Some(&index) = self.index_by_id.get(id) {
            self.bodies[index].drag_target = None;
        }
        if self.bodies.iter().all(|body| body.drag_target.is_none()) {
            self.alpha_target = 0.0;
        }
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(crate) fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_of(id).map(|index| self.positions[index])
    }

    pub(crate) fn positions(&self) -> &[Vec2] {
        &self.positions
    }
}
