//! Read-only player view of a broadcast map.

use crate::compose::{compose, compose_weather};
use crate::display::DisplayList;
use crate::renderer::RenderContext;
use battlemap_core::camera::Camera;
use battlemap_core::codec::BroadcastPayload;
use battlemap_core::scene::Scene;
use battlemap_core::weather::{WeatherKind, WeatherOverlay};
use kurbo::Size;

/// Scene rebuilt from the latest broadcast, with its own weather overlay.
///
/// There is no tool state: viewers only replay the presenter's view.
pub struct Viewer {
    scene: Scene,
    camera: Camera,
    viewport: Size,
    weather: WeatherOverlay,
}

impl Viewer {
    pub fn new(viewport: Size) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::default(),
            viewport,
            weather: WeatherOverlay::new(WeatherKind::None, viewport.width, viewport.height),
        }
    }

    pub fn from_payload(payload: &BroadcastPayload, viewport: Size) -> Self {
        let mut viewer = Self::new(viewport);
        viewer.apply(payload);
        viewer
    }

    /// Replace the scene and view with a newer broadcast.
    pub fn apply(&mut self, payload: &BroadcastPayload) {
        let (scene, camera) = payload.to_scene();
        log::debug!(
            "Viewer received {} drawings, {} assets, {} tokens",
            scene.drawings().len(),
            scene.assets().len(),
            scene.tokens().len()
        );
        self.weather
            .configure(scene.weather, self.viewport.width, self.viewport.height);
        self.scene = scene;
        self.camera = camera;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn weather(&self) -> &WeatherOverlay {
        &self.weather
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.weather
            .configure(self.scene.weather, viewport.width, viewport.height);
    }

    /// Advance the weather animation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        self.weather.update(dt);
    }

    /// Compose the map followed by the weather overlay.
    pub fn compose(&self, scale_factor: f64) -> DisplayList {
        let ctx = RenderContext::new(&self.scene, self.camera, self.viewport).with_scale_factor(scale_factor);
        let mut list = compose(&ctx);
        list.extend(compose_weather(
            self.weather.kind(),
            self.weather.particles(),
            self.viewport,
            scale_factor,
        ));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Layer;
    use battlemap_core::codec::build_broadcast;
    use battlemap_core::config::EditorConfig;
    use battlemap_core::reference::ReferenceCatalog;
    use battlemap_core::scene::{Asset, Token};
    use kurbo::Point;

    fn payload(weather: WeatherKind) -> BroadcastPayload {
        let mut scene = Scene::new();
        scene.add_asset(Asset::new("chest", Point::new(0.0, 0.0), Size::new(50.0, 50.0)));
        scene.add_token(Token::marker("Boss", "#ef4444", Point::new(100.0, 100.0), 30.0));
        scene.weather = weather;
        let view = Camera {
            pan_x: 15.0,
            pan_y: -5.0,
            scale: 0.5,
        };
        build_broadcast(&scene, view, &ReferenceCatalog::new(), &EditorConfig::default())
    }

    #[test]
    fn test_viewer_replays_view() {
        let viewer = Viewer::from_payload(&payload(WeatherKind::None), Size::new(320.0, 240.0));
        assert_eq!(viewer.camera().scale, 0.5);
        assert_eq!(viewer.scene().assets().len(), 1);

        let list = viewer.compose(1.0);
        assert_eq!(list.layer(Layer::Tokens).count(), 1);
        assert_eq!(list.layer(Layer::Handles).count(), 0);
        assert_eq!(list.layer(Layer::Weather).count(), 0);
    }

    #[test]
    fn test_viewer_weather_follows_payload() {
        let mut viewer = Viewer::new(Size::new(320.0, 240.0));
        viewer.apply(&payload(WeatherKind::Embers));
        assert_eq!(viewer.weather().kind(), WeatherKind::Embers);
        viewer.tick(1.0 / 30.0);
        assert!(viewer.compose(2.0).layer(Layer::Weather).count() > 0);

        viewer.apply(&payload(WeatherKind::None));
        assert!(!viewer.weather().is_active());
    }
}
