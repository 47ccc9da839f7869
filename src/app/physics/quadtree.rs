use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points.iter().filter(|point| point.x.is_finite() && point.y.is_finite()) {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !max.x.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two cells; zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }
}

/// Barnes-Hut cell: leaves keep their point indices, inner cells only
/// aggregate mass.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(points)?;
        let indices = (0..points.len())
            .filter(|&index| points[index].x.is_finite() && points[index].y.is_finite())
            .collect::<Vec<_>>();
        Some(Self::build_cell(bounds, indices, points, 0))
    }

    fn build_cell(bounds: QuadBounds, indices: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let mass = indices.len() as f32;
        let center_of_mass = if indices.is_empty() {
            bounds.center
        } else {
            indices.iter().fold(Vec2::ZERO, |sum, &index| sum + points[index]) / mass
        };

        let mut cell = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || cell.indices.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &cell.indices {
            buckets[bounds.quadrant_for(points[index])].push(index);
        }

        // Coincident points never split; keep them together in one leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            cell.children[quadrant] = Some(Box::new(Self::build_cell(
                bounds.child(quadrant),
                bucket,
                points,
                depth + 1,
            )));
        }
        cell.indices.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_count(cell: &QuadNode) -> usize {
        if cell.is_leaf() {
            cell.indices.len()
        } else {
            cell.children().map(leaf_count).sum()
        }
    }

    #[test]
    fn every_finite_point_lands_in_exactly_one_leaf() {
        let mut points = (0..200)
            .map(|index| {
                let angle = index as f32 * 0.37;
                vec2(angle.cos() * index as f32, angle.sin() * index as f32)
            })
            .collect::<Vec<_>>();
        points.push(vec2(f32::NAN, 3.0));

        let tree = QuadNode::build(&points).unwrap();
        assert_eq!(leaf_count(&tree), 200);
        assert_eq!(tree.mass, 200.0);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let points = vec![vec2(5.0, 5.0); 40];
        let tree = QuadNode::build(&points).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
        assert_eq!(tree.center_of_mass, vec2(5.0, 5.0));
    }

    #[test]
    fn empty_or_non_finite_input_has_no_tree() {
        assert!(QuadNode::build(&[]).is_none());
        assert!(QuadNode::build(&[vec2(f32::INFINITY, 0.0)]).is_none());
    }

    #[test]
    fn gap_between_touching_cells_is_zero() {
        let a = QuadBounds {
            center: vec2(0.0, 0.0),
            half_extent: 5.0,
        };
        let b = QuadBounds {
            center: vec2(10.0, 0.0),
            half_extent: 5.0,
        };
        let c = QuadBounds {
            center: vec2(20.0, 0.0),
            half_extent: 2.0,
        };
        assert_eq!(a.gap_sq(b), 0.0);
        assert_eq!(a.gap_sq(c), 169.0);
    }
}
