//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default lower zoom bound.
pub const MIN_SCALE: f64 = 0.2;
/// Default upper zoom bound.
pub const MAX_SCALE: f64 = 3.0;
/// Default wheel exponent factor.
pub const WHEEL_ZOOM_FACTOR: f64 = 0.001;

/// Camera manages the view transform for the map.
///
/// This is also the persisted/broadcast "view" (`{panX, panY, scale}`),
/// so its serialized form must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Horizontal pan in screen pixels.
    pub pan_x: f64,
    /// Vertical pan in screen pixels.
    pub pan_y: f64,
    /// Zoom scale (1.0 = 100%).
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            scale: 1.0,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pan as a vector.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.pan_x, self.pan_y)
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.scale)
    }

    /// Convert a screen point (relative to the viewport origin) to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.pan_x) / self.scale,
            (screen_point.y - self.pan_y) / self.scale,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            world_point.x * self.scale + self.pan_x,
            world_point.y * self.scale + self.pan_y,
        )
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan_x += delta.x;
        self.pan_y += delta.y;
    }

    /// Apply a wheel delta using the default bounds.
    pub fn zoom_by_wheel(&mut self, delta: f64) {
        self.zoom_by_wheel_with(delta, WHEEL_ZOOM_FACTOR, MIN_SCALE, MAX_SCALE);
    }

    /// Apply a wheel delta: `scale * exp(-factor * delta)`, clamped.
    ///
    /// Zoom is anchored at the viewport origin, the pan is left untouched.
    pub fn zoom_by_wheel_with(&mut self, delta: f64, factor: f64, min: f64, max: f64) {
        self.scale = (self.scale * (-factor * delta).exp()).clamp(min, max);
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset(), Vec2::ZERO);
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_pan_and_scale() {
        let camera = Camera {
            pan_x: 50.0,
            pan_y: 100.0,
            scale: 2.0,
        };
        let world = camera.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        for &(pan_x, pan_y, scale) in &[(30.0, -20.0, 1.5), (-400.0, 12.5, 0.2), (0.0, 0.0, 3.0)] {
            let camera = Camera { pan_x, pan_y, scale };
            let original = Point::new(123.0, 456.0);
            let back = camera.world_to_screen(camera.screen_to_world(original));
            assert!((back.x - original.x).abs() < 1e-9);
            assert!((back.y - original.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transform_matches_point_conversion() {
        let camera = Camera {
            pan_x: 10.0,
            pan_y: 20.0,
            scale: 0.5,
        };
        let world = Point::new(40.0, 80.0);
        let via_affine = camera.transform() * world;
        let direct = camera.world_to_screen(world);
        assert!((via_affine.x - direct.x).abs() < 1e-9);
        assert!((via_affine.y - direct.y).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_zoom_formula() {
        let mut camera = Camera::new();
        camera.zoom_by_wheel(-100.0);
        assert!((camera.scale - (0.1f64).exp()).abs() < 1e-12);
        assert_eq!(camera.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_by_wheel(100_000.0);
        assert!((camera.scale - MIN_SCALE).abs() < f64::EPSILON);

        camera.zoom_by_wheel(-100_000.0);
        assert!((camera.scale - MAX_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan_by(Vec2::new(10.0, 20.0));
        assert!((camera.pan_x - 10.0).abs() < f64::EPSILON);
        assert!((camera.pan_y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_view_wire_format() {
        let json = serde_json::to_string(&Camera::new()).unwrap();
        assert_eq!(json, r#"{"panX":0.0,"panY":0.0,"scale":1.0}"#);
    }
}
