use glam::Vec2;
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Pan and scale state used to render the graph canvas. The rendered
/// transform is `scale(zoom) translate(pan)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Converts a pointer delta in screen pixels into graph coordinates.
    pub fn screen_delta_to_graph(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn zoom_clamped_to_bounds() {
        let mut viewport = Viewport::default();
        for _ in 0..50 {
            viewport.zoom_in();
        }
        assert!(viewport.zoom <= MAX_ZOOM);

        for _ in 0..100 {
            viewport.zoom_out();
        }
        assert!(viewport.zoom >= MIN_ZOOM);
    }

    #[test]
    fn pan_accumulates_deltas() {
        let mut viewport = Viewport::default();
        viewport.pan_by(vec2(10.0, -5.0));
        viewport.pan_by(vec2(2.0, 3.0));
        assert_eq!(viewport.pan, vec2(12.0, -2.0));
    }

    #[test]
    fn screen_delta_scaled_by_inverse_zoom() {
        let mut viewport = Viewport::default();
        for _ in 0..10 {
            viewport.zoom_in();
        }
        let delta = viewport.screen_delta_to_graph(vec2(20.0, 0.0));
        assert!((delta.x - 20.0 / viewport.zoom).abs() < f32::EPSILON);
    }
}
