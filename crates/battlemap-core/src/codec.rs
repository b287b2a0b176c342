//! Wire formats built from the scene: broadcast payloads and named saves.
//!
//! The autosave document is the [`Scene`] itself (see [`Scene::to_json`]).

use crate::camera::Camera;
use crate::config::{EditorConfig, ImagePolicy};
use crate::media;
use crate::reference::ReferenceLibrary;
use crate::scene::{Asset, Drawing, Scene, Token};
use crate::weather::WeatherKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Autosave document: drawings, assets, tokens and weather, stored verbatim.
pub type SceneDocument = Scene;

/// Everything a viewer needs to draw the map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub weather: WeatherKind,
    #[serde(default)]
    pub view: Camera,
}

/// The single message shape accepted by broadcast sinks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastPayload {
    pub canvas_state: CanvasState,
}

impl BroadcastPayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rebuild a read-only scene and its view.
    pub fn to_scene(&self) -> (Scene, Camera) {
        let state = &self.canvas_state;
        let scene = Scene::from_parts(
            state.drawings.clone(),
            state.assets.clone(),
            state.tokens.clone(),
            state.weather,
        );
        (scene, state.view)
    }
}

/// Shrink an embedded image for broadcasting.
///
/// Remote URLs and anything that fails to decode pass through unchanged.
fn shrink_image(url: String, policy: ImagePolicy) -> String {
    if !media::is_data_url(&url) {
        return url;
    }
    match media::recompress_data_url(&url, policy) {
        Ok(encoded) => encoded.data_url,
        Err(e) => {
            log::warn!("Broadcasting image uncompressed: {}", e);
            url
        }
    }
}

/// Build the broadcast payload from a transient copy of the scene.
///
/// Token images fall back to the referenced entry's portrait. The author's
/// scene is never modified.
pub fn build_broadcast(
    scene: &Scene,
    view: Camera,
    references: &dyn ReferenceLibrary,
    config: &EditorConfig,
) -> BroadcastPayload {
    let tokens = scene
        .tokens()
        .iter()
        .cloned()
        .map(|mut token| {
            let image = token.image.take().or_else(|| {
                let reference_id = token.reference_id.as_deref()?;
                references.portrait(token.kind, reference_id).map(str::to_string)
            });
            token.image = image.map(|url| shrink_image(url, config.broadcast_token_image));
            token
        })
        .collect();

    let assets = scene
        .assets()
        .iter()
        .cloned()
        .map(|mut asset| {
            if asset.is_custom_image() {
                asset.image_url = asset.image_url.take().map(|url| shrink_image(url, config.broadcast_asset_image));
            }
            asset
        })
        .collect();

    BroadcastPayload {
        canvas_state: CanvasState {
            tokens,
            drawings: scene.drawings().to_vec(),
            assets,
            weather: scene.weather,
            view,
        },
    }
}

/// A user-named snapshot of the whole map plus its view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMap {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub weather: WeatherKind,
    #[serde(default)]
    pub view: Camera,
}

impl SavedMap {
    /// Capture the current scene and view under a new id.
    pub fn capture(name: impl Into<String>, scene: &Scene, view: Camera) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            timestamp: Utc::now().timestamp_millis(),
            drawings: scene.drawings().to_vec(),
            assets: scene.assets().to_vec(),
            tokens: scene.tokens().to_vec(),
            weather: scene.weather,
            view,
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn to_scene(&self) -> Scene {
        Scene::from_parts(self.drawings.clone(), self.assets.clone(), self.tokens.clone(), self.weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{encode_data_url, test_images::png};
    use crate::reference::{ReferenceCatalog, ReferenceEntry};
    use crate::scene::TokenKind;
    use kurbo::{Point, Size};

    fn png_url(w: u32, h: u32) -> String {
        encode_data_url("image/png", &png(w, h))
    }

    fn decoded_size(url: &str) -> (u32, u32) {
        let (_, bytes) = media::decode_data_url(url).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_broadcast_wire_shape() {
        let mut scene = Scene::new();
        scene.weather = WeatherKind::Rain;
        let payload = build_broadcast(&scene, Camera::default(), &ReferenceCatalog::new(), &EditorConfig::default());
        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        let state = &json["canvasState"];
        assert_eq!(state["weather"], "rain");
        assert_eq!(state["view"]["scale"], 1.0);
        assert!(state["tokens"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_token_portrait_fallback_is_downsampled() {
        let mut catalog = ReferenceCatalog::new();
        catalog.insert(TokenKind::Monster, ReferenceEntry::new("m1", "Ogre", Some(png_url(400, 200))));

        let mut scene = Scene::new();
        scene.add_token(Token::referenced(TokenKind::Monster, "m1", "Ogre", Point::ZERO, 30.0));
        let before = scene.clone();

        let payload = build_broadcast(&scene, Camera::default(), &catalog, &EditorConfig::default());
        let image = payload.canvas_state.tokens[0].image.as_deref().unwrap();
        assert!(image.starts_with("data:image/jpeg"));
        assert_eq!(decoded_size(image), (128, 64));
        // The author's scene is untouched.
        assert_eq!(scene, before);
        assert!(scene.tokens()[0].image.is_none());
    }

    #[test]
    fn test_custom_image_downsampled_remote_passthrough() {
        let mut scene = Scene::new();
        scene.add_asset(Asset::custom_image(Point::ZERO, Size::new(100.0, 100.0), png_url(1024, 1024), None));
        scene.add_asset(Asset::custom_image(
            Point::ZERO,
            Size::new(100.0, 100.0),
            "https://example.com/map.png".to_string(),
            None,
        ));
        scene.add_asset(Asset::custom_image(
            Point::ZERO,
            Size::new(100.0, 100.0),
            "data:image/png;base64,AAAA".to_string(),
            None,
        ));

        let payload = build_broadcast(&scene, Camera::default(), &ReferenceCatalog::new(), &EditorConfig::default());
        let assets = &payload.canvas_state.assets;
        assert_eq!(decoded_size(assets[0].image_url.as_deref().unwrap()), (512, 512));
        assert_eq!(assets[1].image_url.as_deref(), Some("https://example.com/map.png"));
        assert_eq!(assets[2].image_url.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_payload_to_scene() {
        let mut scene = Scene::new();
        scene.add_asset(Asset::new("rock", Point::new(25.0, 50.0), Size::new(100.0, 100.0)));
        scene.weather = WeatherKind::Embers;
        let view = Camera {
            pan_x: 10.0,
            pan_y: 20.0,
            scale: 1.5,
        };
        let payload = build_broadcast(&scene, view, &ReferenceCatalog::new(), &EditorConfig::default());

        let parsed = BroadcastPayload::from_json(&payload.to_json().unwrap()).unwrap();
        let (restored, restored_view) = parsed.to_scene();
        assert_eq!(restored, scene);
        assert_eq!(restored_view, view);
    }

    #[test]
    fn test_saved_map_capture() {
        let mut scene = Scene::new();
        scene.add_drawing(Drawing::rect_from_corners(Point::ZERO, Point::new(10.0, 10.0), "#fff", 2.0));
        scene.weather = WeatherKind::Fog;
        let map = SavedMap::capture("Crypt", &scene, Camera::default());

        assert!(Uuid::parse_str(&map.id).is_ok());
        assert!(map.saved_at().is_some());
        assert_eq!(map.to_scene(), scene);

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["name"], "Crypt");
        assert_eq!(json["view"]["panX"], 0.0);
        assert!(json["timestamp"].is_i64());
    }
}
