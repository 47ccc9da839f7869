use eframe::egui::{Pos2, Vec2};

pub(crate) const MIN_SCALE: f32 = 0.1;
pub(crate) const MAX_SCALE: f32 = 4.0;
const WHEEL_ZOOM_RATE: f32 = 0.002;

/// Pan/zoom transform between canvas-local screen pixels and world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) translate: Vec2,
    pub(crate) scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub(crate) fn to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }

    pub(crate) fn to_screen(&self, world: Vec2) -> Pos2 {
        (world * self.scale + self.translate).to_pos2()
    }

    pub(crate) fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Multiplies the scale by `factor`, keeping the world point under
    /// `anchor` fixed on screen.
    pub(crate) fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let world_before = self.to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = anchor.to_vec2() - world_before * self.scale;
    }

    pub(crate) fn wheel_zoom_at(&mut self, anchor: Pos2, wheel_delta: f32) {
        self.zoom_at(anchor, 2f32.powf(wheel_delta * WHEEL_ZOOM_RATE));
    }

    pub(crate) fn center_on(&mut self, world: Vec2, canvas_size: Vec2) {
        self.translate = canvas_size * 0.5 - world * self.scale;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn zoom_percent(&self) -> f32 {
        self.scale * 100.0
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn identity_maps_screen_to_world_unchanged() {
        let viewport = Viewport::default();
        assert_eq!(viewport.to_world(pos2(400.0, 300.0)), vec2(400.0, 300.0));
    }

    #[test]
    fn world_conversion_matches_translate_then_scale() {
        let viewport = Viewport {
            translate: vec2(50.0, -20.0),
            scale: 2.0,
        };
        assert_eq!(viewport.to_world(pos2(250.0, 80.0)), vec2(100.0, 50.0));
        assert_eq!(viewport.to_screen(vec2(100.0, 50.0)), pos2(250.0, 80.0));
    }

    #[test]
    fn zoom_keeps_anchor_world_point_fixed() {
        let mut viewport = Viewport {
            translate: vec2(13.0, 7.0),
            scale: 1.3,
        };
        let anchor = pos2(320.0, 240.0);
        let before = viewport.to_world(anchor);
        viewport.zoom_at(anchor, 1.7);
        let after = viewport.to_world(anchor);
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn scale_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(pos2(0.0, 0.0), 1000.0);
        assert_eq!(viewport.scale, MAX_SCALE);
        viewport.zoom_at(pos2(0.0, 0.0), 0.00001);
        assert_eq!(viewport.scale, MIN_SCALE);
    }

    #[test]
    fn invalid_zoom_factor_is_ignored() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(pos2(10.0, 10.0), f32::NAN);
        viewport.zoom_at(pos2(10.0, 10.0), -2.0);
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut viewport = Viewport::default();
        viewport.wheel_zoom_at(pos2(100.0, 100.0), 120.0);
        assert!(viewport.scale > 1.0);
        viewport.reset();
        viewport.wheel_zoom_at(pos2(100.0, 100.0), -120.0);
        assert!(viewport.scale < 1.0);
    }

    #[test]
    fn center_on_puts_world_point_mid_canvas() {
        let mut viewport = Viewport {
            translate: Vec2::ZERO,
            scale: 2.0,
        };
        viewport.center_on(vec2(10.0, 20.0), vec2(800.0, 600.0));
        assert_eq!(viewport.to_screen(vec2(10.0, 20.0)), pos2(400.0, 300.0));
    }

    proptest! {
        #[test]
        fn screen_world_round_trip(
            sx in -5_000.0f32..5_000.0,
            sy in -5_000.0f32..5_000.0,
            tx in -2_000.0f32..2_000.0,
            ty in -2_000.0f32..2_000.0,
            scale in MIN_SCALE..MAX_SCALE,
        ) {
            let viewport = Viewport { translate: vec2(tx, ty), scale };
            let back = viewport.to_screen(viewport.to_world(pos2(sx, sy)));
            let tolerance = 1e-3 * (1.0 + sx.abs().max(sy.abs()).max(tx.abs()).max(ty.abs()));
            prop_assert!((back.x - sx).abs() <= tolerance, "x {} vs {}", back.x, sx);
            prop_assert!((back.y - sy).abs() <= tolerance, "y {} vs {}", back.y, sy);
        }
    }
}
