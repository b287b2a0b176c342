//! Tool selection and the in-progress interaction session.

use crate::config::EditorConfig;
use crate::gesture::TransformGesture;
use crate::scene::{Drawing, EntityRef};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Brush,
    Wall,
    Rect,
    Circle,
    Erase,
    Transform,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Brush,
        ToolKind::Wall,
        ToolKind::Rect,
        ToolKind::Circle,
        ToolKind::Erase,
        ToolKind::Transform,
    ];

    /// Tools that commit a two-point drawing on release.
    pub fn is_segment_tool(self) -> bool {
        matches!(self, ToolKind::Wall | ToolKind::Rect | ToolKind::Circle)
    }
}

/// State of the current pointer interaction.
///
/// This is the whole of the gesture bookkeeping: it can be inspected,
/// serialized and restored independently of any pointer device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Interaction {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// Panning the view. `anchor` is in screen coordinates.
    Panning { anchor: Point },
    /// Moving a token or asset. `grab_offset` is the entity position minus
    /// the pointer position at pointer-down, in world units.
    #[serde(rename_all = "camelCase")]
    Dragging {
        target: EntityRef,
        grab_offset: Vec2,
        moved: bool,
    },
    /// Collecting a freehand stroke (world coordinates).
    Stroke { points: Vec<Point> },
    /// Tracking a wall, rect or circle between two world points.
    Segment { start: Point, end: Point },
    /// Rotating or scaling the selected asset.
    Transforming(TransformGesture),
}

/// Style applied to new drawings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    /// Stroke color for brush, rect and circle.
    pub color: String,
    pub stroke_width: f64,
    /// Wall kind tag attached to committed walls.
    pub wall_type: String,
    /// Asset tiled along committed walls.
    pub wall_asset: Option<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: "#e2e8f0".to_string(),
            stroke_width: 4.0,
            wall_type: "stone".to_string(),
            wall_asset: None,
        }
    }
}

/// Manages the current tool and its interaction session.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current interaction session.
    pub session: Interaction,
    /// Current style to apply to new drawings.
    pub settings: ToolSettings,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool. Any in-progress interaction is dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.session = Interaction::Idle;
    }

    /// Check if an interaction is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.session, Interaction::Idle)
    }

    /// Start a stroke or segment for the current drawing tool.
    /// Returns false if the tool does not draw.
    pub fn begin_drawing(&mut self, point: Point) -> bool {
        self.session = match self.current_tool {
            ToolKind::Brush => Interaction::Stroke { points: vec![point] },
            tool if tool.is_segment_tool() => Interaction::Segment { start: point, end: point },
            _ => return false,
        };
        true
    }

    /// Extend the in-progress stroke or move the segment end.
    pub fn update_drawing(&mut self, point: Point) {
        match &mut self.session {
            Interaction::Stroke { points } => points.push(point),
            Interaction::Segment { end, .. } => *end = point,
            _ => {}
        }
    }

    /// End the current stroke or segment and return the drawing to commit.
    ///
    /// Strokes with fewer than two points produce nothing.
    pub fn end_drawing(&mut self, config: &EditorConfig) -> Option<Drawing> {
        let session = std::mem::take(&mut self.session);
        match session {
            Interaction::Stroke { points } if points.len() >= 2 => {
                Drawing::path(points, self.settings.color.clone(), self.settings.stroke_width)
            }
            Interaction::Segment { start, end } => self.segment_drawing(start, end, config),
            Interaction::Stroke { .. } => None,
            other => {
                self.session = other;
                None
            }
        }
    }

    /// The in-progress stroke or segment as a drawing, for rendering.
    pub fn preview_drawing(&self, config: &EditorConfig) -> Option<Drawing> {
        match &self.session {
            Interaction::Stroke { points } => {
                Drawing::path(points.clone(), self.settings.color.clone(), self.settings.stroke_width)
            }
            Interaction::Segment { start, end } => self.segment_drawing(*start, *end, config),
            _ => None,
        }
    }

    fn segment_drawing(&self, start: Point, end: Point, config: &EditorConfig) -> Option<Drawing> {
        let settings = &self.settings;
        match self.current_tool {
            ToolKind::Wall => Some(Drawing::wall(
                start,
                end,
                config.wall_color.clone(),
                config.wall_width,
                settings.wall_type.clone(),
                settings.wall_asset.clone(),
            )),
            ToolKind::Rect => Some(Drawing::rect_from_corners(start, end, settings.color.clone(), settings.stroke_width)),
            ToolKind::Circle => Some(Drawing::circle_from_anchor(start, end, settings.color.clone(), settings.stroke_width)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_tool_selection_resets_session() {
        let mut tm = ToolManager::new();
        assert_eq!(tm.current_tool, ToolKind::Select);

        tm.set_tool(ToolKind::Brush);
        assert!(tm.begin_drawing(Point::ZERO));
        assert!(tm.is_active());

        tm.set_tool(ToolKind::Rect);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_non_drawing_tools_do_not_begin() {
        let mut tm = ToolManager::new();
        for tool in [ToolKind::Select, ToolKind::Pan, ToolKind::Erase, ToolKind::Transform] {
            tm.set_tool(tool);
            assert!(!tm.begin_drawing(Point::ZERO), "{tool:?}");
        }
    }

    #[test]
    fn test_single_point_stroke_is_discarded() {
        let config = EditorConfig::default();
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Brush);
        tm.begin_drawing(Point::new(1.0, 1.0));
        assert!(tm.end_drawing(&config).is_none());
        assert!(!tm.is_active());
    }

    #[test]
    fn test_wall_uses_fixed_style() {
        let config = EditorConfig::default();
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Wall);
        tm.settings.wall_type = "wood".to_string();
        tm.settings.wall_asset = Some("wall_wood".to_string());
        tm.begin_drawing(Point::new(0.0, 0.0));
        tm.update_drawing(Point::new(10.0, 0.0));
        tm.update_drawing(Point::new(100.0, 0.0));

        let Some(Drawing::Wall(wall)) = tm.end_drawing(&config) else {
            panic!("expected a wall");
        };
        assert_eq!(wall.points, [Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert_eq!(wall.color, "#ef4444");
        assert!((wall.stroke_width - 8.0).abs() < f64::EPSILON);
        assert_eq!(wall.wall_type, "wood");
        assert_eq!(wall.asset_type.as_deref(), Some("wall_wood"));
    }

    #[test]
    fn test_circle_is_anchored_at_start() {
        let config = EditorConfig::default();
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Circle);
        tm.begin_drawing(Point::new(10.0, 10.0));
        tm.update_drawing(Point::new(13.0, 14.0));
        let Some(Drawing::Circle(circle)) = tm.end_drawing(&config) else {
            panic!("expected a circle");
        };
        assert_eq!((circle.x, circle.y), (10.0, 10.0));
        assert!((circle.radius - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_preview_follows_session() {
        let config = EditorConfig::default();
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Rect);
        assert!(tm.preview_drawing(&config).is_none());
        tm.begin_drawing(Point::new(100.0, 100.0));
        tm.update_drawing(Point::new(50.0, 40.0));
        let Some(Drawing::Rect(rect)) = tm.preview_drawing(&config) else {
            panic!("expected a rect preview");
        };
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (50.0, 40.0, 50.0, 60.0));
        // Preview does not end the session.
        assert!(tm.is_active());
    }

    #[test]
    fn test_session_serializes() {
        let session = Interaction::Dragging {
            target: EntityRef::Asset(Uuid::nil()),
            grab_offset: Vec2::new(-5.0, 2.5),
            moved: true,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"], "dragging");
        assert_eq!(json["grabOffset"]["x"], -5.0);
        let back: Interaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);

        let json = serde_json::to_string(&Interaction::Idle).unwrap();
        assert_eq!(json, r#"{"state":"idle"}"#);
    }

    #[test]
    fn test_tool_wire_names() {
        let names: Vec<String> = ToolKind::ALL
            .iter()
            .map(|t| serde_json::to_value(t).unwrap().as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, ["select", "pan", "brush", "wall", "rect", "circle", "erase", "transform"]);
    }
}
