//! Vector drawings: freehand paths, walls, rectangles and circles.

use super::EntityId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDrawing {
    pub id: EntityId,
    /// Ordered stroke points (never empty).
    pub points: Vec<Point>,
    pub color: String,
    pub stroke_width: f64,
}

/// A wall segment between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallDrawing {
    pub id: EntityId,
    pub points: [Point; 2],
    pub color: String,
    pub stroke_width: f64,
    /// Decorative wall kind (stone, wood, ...).
    pub wall_type: String,
    /// Asset tiled along the segment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

/// An axis-aligned rectangle outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectDrawing {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub stroke_width: f64,
}

/// A circle outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleDrawing {
    pub id: EntityId,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    pub radius: f64,
    pub color: String,
    pub stroke_width: f64,
}

/// A vector drawing on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Drawing {
    Path(PathDrawing),
    Wall(WallDrawing),
    Rect(RectDrawing),
    Circle(CircleDrawing),
}

impl Drawing {
    /// Create a freehand path. Returns `None` for an empty point list.
    pub fn path(points: Vec<Point>, color: impl Into<String>, stroke_width: f64) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Drawing::Path(PathDrawing {
            id: Uuid::new_v4(),
            points,
            color: color.into(),
            stroke_width,
        }))
    }

    /// Create a wall segment.
    pub fn wall(
        start: Point,
        end: Point,
        color: impl Into<String>,
        stroke_width: f64,
        wall_type: impl Into<String>,
        asset_type: Option<String>,
    ) -> Self {
        Drawing::Wall(WallDrawing {
            id: Uuid::new_v4(),
            points: [start, end],
            color: color.into(),
            stroke_width,
            wall_type: wall_type.into(),
            asset_type,
        })
    }

    /// Create a rectangle from two corners, normalized to the min corner.
    pub fn rect_from_corners(p1: Point, p2: Point, color: impl Into<String>, stroke_width: f64) -> Self {
        Drawing::Rect(RectDrawing {
            id: Uuid::new_v4(),
            x: p1.x.min(p2.x),
            y: p1.y.min(p2.y),
            width: (p2.x - p1.x).abs(),
            height: (p2.y - p1.y).abs(),
            color: color.into(),
            stroke_width,
        })
    }

    /// Create a circle anchored at `center` reaching through `edge`.
    pub fn circle_from_anchor(center: Point, edge: Point, color: impl Into<String>, stroke_width: f64) -> Self {
        Drawing::Circle(CircleDrawing {
            id: Uuid::new_v4(),
            x: center.x,
            y: center.y,
            radius: center.distance(edge),
            color: color.into(),
            stroke_width,
        })
    }

    pub fn id(&self) -> EntityId {
        match self {
            Drawing::Path(d) => d.id,
            Drawing::Wall(d) => d.id,
            Drawing::Rect(d) => d.id,
            Drawing::Circle(d) => d.id,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Drawing::Path(d) => &d.color,
            Drawing::Wall(d) => &d.color,
            Drawing::Rect(d) => &d.color,
            Drawing::Circle(d) => &d.color,
        }
    }

    pub fn stroke_width(&self) -> f64 {
        match self {
            Drawing::Path(d) => d.stroke_width,
            Drawing::Wall(d) => d.stroke_width,
            Drawing::Rect(d) => d.stroke_width,
            Drawing::Circle(d) => d.stroke_width,
        }
    }

    /// Bounding box in world coordinates (stroke width not included).
    pub fn bounds(&self) -> Rect {
        match self {
            Drawing::Path(d) => points_bounds(&d.points),
            Drawing::Wall(d) => points_bounds(&d.points),
            Drawing::Rect(d) => Rect::new(d.x, d.y, d.x + d.width, d.y + d.height),
            Drawing::Circle(d) => Rect::new(d.x - d.radius, d.y - d.radius, d.x + d.radius, d.y + d.radius),
        }
    }

    /// Eraser hit test.
    ///
    /// Paths and walls match when any of their vertices lies within `reach`
    /// of `point`; rectangles and circles match when `point` is inside.
    pub fn erase_hit(&self, point: Point, reach: f64) -> bool {
        match self {
            Drawing::Path(d) => d.points.iter().any(|p| p.distance(point) <= reach),
            Drawing::Wall(d) => d.points.iter().any(|p| p.distance(point) <= reach),
            Drawing::Rect(d) => {
                point.x >= d.x && point.x <= d.x + d.width && point.y >= d.y && point.y <= d.y + d.height
            }
            Drawing::Circle(d) => Point::new(d.x, d.y).distance(point) <= d.radius,
        }
    }
}

fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}
