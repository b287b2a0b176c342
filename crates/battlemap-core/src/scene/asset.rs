//! Placed decorative assets.

use super::EntityId;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asset type of user-supplied images.
pub const CUSTOM_IMAGE: &str = "custom_image";

/// Library tile that asks for an image upload instead of placing an asset.
pub const CUSTOM_IMAGE_PLACEHOLDER: &str = "custom_image_placeholder";

/// Asset types offered by the library catalog.
pub const ASSET_TYPES: &[&str] = &[
    // Nature
    "tree_oak",
    "tree_pine",
    "bush",
    "rock",
    "boulder",
    "water",
    "campfire",
    // Furniture
    "table",
    "chair",
    "bed",
    "chest",
    "barrel",
    "crate",
    "bookshelf",
    // Structure
    "door",
    "stairs",
    "pillar",
    "statue",
    "altar",
    // Walls
    "wall_stone",
    "wall_wood",
    "wall_brick",
];

/// Whether `asset_type` is in the catalog (or is a custom image).
pub fn is_known_asset_type(asset_type: &str) -> bool {
    asset_type == CUSTOM_IMAGE || ASSET_TYPES.contains(&asset_type)
}

/// A decorative object placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: EntityId,
    pub asset_type: String,
    /// Top-left corner x.
    pub x: f64,
    /// Top-left corner y.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees around the center.
    #[serde(default)]
    pub rotation: f64,
    /// Embedded image (custom images only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Display label (custom images only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Asset {
    /// Create a catalog asset with its top-left corner at `position`.
    pub fn new(asset_type: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_type: asset_type.into(),
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            rotation: 0.0,
            image_url: None,
            label: None,
        }
    }

    /// Create a custom image asset.
    pub fn custom_image(position: Point, size: Size, image_url: String, label: Option<String>) -> Self {
        Self {
            image_url: Some(image_url),
            label,
            ..Self::new(CUSTOM_IMAGE, position, size)
        }
    }

    pub fn is_custom_image(&self) -> bool {
        self.asset_type == CUSTOM_IMAGE
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Axis-aligned box (rotation ignored).
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Box containment, edges inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.x + self.width && point.y >= self.y && point.y <= self.y + self.height
    }
}
