//! Grid snapping for committed positions.

use kurbo::Point;

/// Size of one grid cell in world units (matches the visual grid).
pub const GRID_SIZE: f64 = 50.0;

/// Snap increment: half a grid cell.
pub const SNAP_STEP: f64 = GRID_SIZE / 2.0;

/// Round `value` to the nearest multiple of `step`.
///
/// Ties round towards positive infinity so that negative coordinates snap
/// the same way as saved maps expect (`-12.5` snaps to `0`, not `-25`).
pub fn snap_to(value: f64, step: f64) -> f64 {
    (value / step + 0.5).floor() * step
}

/// Round a coordinate to the nearest half grid cell.
pub fn snap(value: f64) -> f64 {
    snap_to(value, SNAP_STEP)
}

/// Snap both coordinates of a point with the given step.
pub fn snap_point_to(point: Point, step: f64) -> Point {
    Point::new(snap_to(point.x, step), snap_to(point.y, step))
}

/// Snap both coordinates of a point to the nearest half grid cell.
pub fn snap_point(point: Point) -> Point {
    snap_point_to(point, SNAP_STEP)
}
