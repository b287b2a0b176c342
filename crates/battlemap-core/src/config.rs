//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Bounds applied when an embedded image is recompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePolicy {
    /// Longest edge in pixels after downscaling.
    pub max_edge: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl ImagePolicy {
    pub const fn new(max_edge: u32, quality: u8) -> Self {
        Self { max_edge, quality }
    }
}

/// Tunables for the canvas editor.
///
/// Defaults reproduce the behavior saved maps and broadcasts were authored
/// against; hosts may override them from their own settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Size of one grid cell in world units.
    pub grid_size: f64,
    /// Snap increment for committed positions.
    pub snap_step: f64,
    /// Maximum number of undo snapshots.
    pub history_capacity: usize,
    /// Minimum zoom scale.
    pub min_scale: f64,
    /// Maximum zoom scale.
    pub max_scale: f64,
    /// Exponent factor applied to wheel deltas.
    pub wheel_zoom_factor: f64,
    /// Eraser radius in screen pixels.
    pub eraser_radius: f64,
    /// Transform handle hit radius in screen pixels.
    pub handle_radius: f64,
    /// Size of assets dropped from the library.
    pub library_asset_size: f64,
    /// Radius of tokens dropped from the library.
    pub token_radius: f64,
    /// Smallest width/height reachable with the scale handle.
    pub min_asset_size: f64,
    /// Width of committed wall segments.
    pub wall_width: f64,
    /// Stroke color of committed wall segments.
    pub wall_color: String,
    /// Policy for images kept on the canvas.
    pub canvas_image: ImagePolicy,
    /// Policy for custom images in broadcasts.
    pub broadcast_asset_image: ImagePolicy,
    /// Policy for token portraits in broadcasts.
    pub broadcast_token_image: ImagePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 50.0,
            snap_step: 25.0,
            history_capacity: 20,
            min_scale: 0.2,
            max_scale: 3.0,
            wheel_zoom_factor: 0.001,
            eraser_radius: 20.0,
            handle_radius: 12.0,
            library_asset_size: 100.0,
            token_radius: 30.0,
            min_asset_size: 20.0,
            wall_width: 8.0,
            wall_color: "#ef4444".to_string(),
            canvas_image: ImagePolicy::new(1024, 80),
            broadcast_asset_image: ImagePolicy::new(512, 70),
            broadcast_token_image: ImagePolicy::new(128, 70),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EditorConfig::from_json(r#"{"historyCapacity": 5}"#).unwrap();
        assert_eq!(config.history_capacity, 5);
        assert!((config.snap_step - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.canvas_image, ImagePolicy::new(1024, 80));
    }

    #[test]
    fn test_broadcast_bounds_are_smaller() {
        let config = EditorConfig::default();
        assert!(config.broadcast_asset_image.max_edge < config.canvas_image.max_edge);
        assert!(config.broadcast_token_image.max_edge < config.broadcast_asset_image.max_edge);
    }
}
