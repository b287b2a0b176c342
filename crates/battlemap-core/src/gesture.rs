//! Rotate/scale handles for the selected asset.

use crate::scene::{Asset, EntityId};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Distance from the asset's top edge to the rotation handle (world units).
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;

/// Kind of transform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Rotate,
    Scale,
}

/// A handle with its position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.position.distance(point) <= tolerance
    }
}

/// Handles of an asset, rotated with it around its center.
///
/// The rotation handle sits above the top-center, the scale handle on the
/// bottom-right corner.
pub fn handles_for(asset: &Asset) -> [Handle; 2] {
    let center = asset.center();
    let (sin_r, cos_r) = asset.rotation.to_radians().sin_cos();
    let rotate_point = |dx: f64, dy: f64| Point::new(center.x + dx * cos_r - dy * sin_r, center.y + dx * sin_r + dy * cos_r);
    let half_w = asset.width / 2.0;
    let half_h = asset.height / 2.0;
    [
        Handle {
            position: rotate_point(0.0, -half_h - ROTATE_HANDLE_OFFSET),
            kind: HandleKind::Rotate,
        },
        Handle {
            position: rotate_point(half_w, half_h),
            kind: HandleKind::Scale,
        },
    ]
}

/// Find which handle (if any) of `asset` is hit at `point`.
pub fn hit_test_handles(asset: &Asset, point: Point, tolerance: f64) -> Option<HandleKind> {
    handles_for(asset)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Values captured when a rotate/scale gesture starts.
///
/// The center stays fixed for the whole gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformGesture {
    pub asset_id: EntityId,
    pub kind: HandleKind,
    pub center: Point,
    pub initial_width: f64,
    pub initial_height: f64,
    pub initial_rotation: f64,
    /// Pointer angle relative to the center, radians.
    pub initial_angle: f64,
    /// Pointer distance from the center.
    pub initial_distance: f64,
    /// Smallest width/height the scale handle can reach.
    pub min_size: f64,
}

/// Geometry produced by one gesture update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformUpdate {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl TransformGesture {
    /// Capture the starting state of a gesture on `asset`.
    pub fn begin(asset: &Asset, kind: HandleKind, pointer: Point, min_size: f64) -> Self {
        let center = asset.center();
        let offset = pointer - center;
        Self {
            asset_id: asset.id,
            kind,
            center,
            initial_width: asset.width,
            initial_height: asset.height,
            initial_rotation: asset.rotation,
            initial_angle: offset.y.atan2(offset.x),
            initial_distance: offset.hypot(),
            min_size,
        }
    }

    /// Compute the asset geometry for the current pointer position.
    pub fn update(&self, pointer: Point) -> TransformUpdate {
        let offset: Vec2 = pointer - self.center;
        match self.kind {
            HandleKind::Rotate => {
                let angle = offset.y.atan2(offset.x);
                let rotation = (self.initial_rotation + (angle - self.initial_angle).to_degrees()).rem_euclid(360.0);
                TransformUpdate {
                    x: self.center.x - self.initial_width / 2.0,
                    y: self.center.y - self.initial_height / 2.0,
                    width: self.initial_width,
                    height: self.initial_height,
                    rotation,
                }
            }
            HandleKind::Scale => {
                let factor = if self.initial_distance > f64::EPSILON {
                    offset.hypot() / self.initial_distance
                } else {
                    1.0
                };
                let width = (self.initial_width * factor).max(self.min_size);
                let height = (self.initial_height * factor).max(self.min_size);
                TransformUpdate {
                    x: self.center.x - width / 2.0,
                    y: self.center.y - height / 2.0,
                    width,
                    height,
                    rotation: self.initial_rotation,
                }
            }
        }
    }

    /// Write an update into the asset.
    pub fn apply(update: TransformUpdate, asset: &mut Asset) {
        asset.x = update.x;
        asset.y = update.y;
        asset.width = update.width;
        asset.height = update.height;
        asset.rotation = update.rotation;
    }
}
