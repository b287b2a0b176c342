//! Circular tokens for characters, NPCs, monsters and plain markers.

use super::EntityId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Character,
    Npc,
    Monster,
    /// Inline label/color with no reference.
    Marker,
}

impl TokenKind {
    /// Border color used for tokens dropped from the library.
    pub fn default_color(self) -> &'static str {
        match self {
            TokenKind::Monster => "#ef4444",
            TokenKind::Npc => "#f59e0b",
            TokenKind::Character => "#3b82f6",
            TokenKind::Marker => "#a855f7",
        }
    }
}

/// A token on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: EntityId,
    pub kind: TokenKind,
    /// Id of the referenced character/NPC/monster.
    #[serde(default)]
    pub reference_id: Option<String>,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Radius.
    pub size: f64,
    pub label: String,
    /// Border color.
    pub color: String,
    /// Cached portrait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Token {
    /// Create a token bound to a reference entry.
    pub fn referenced(kind: TokenKind, reference_id: impl Into<String>, label: impl Into<String>, center: Point, size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            reference_id: Some(reference_id.into()),
            x: center.x,
            y: center.y,
            size,
            label: label.into(),
            color: kind.default_color().to_string(),
            image: None,
        }
    }

    /// Create a free-standing marker.
    pub fn marker(label: impl Into<String>, color: impl Into<String>, center: Point, size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TokenKind::Marker,
            reference_id: None,
            x: center.x,
            y: center.y,
            size,
            label: label.into(),
            color: color.into(),
            image: None,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_center(&mut self, center: Point) {
        self.x = center.x;
        self.y = center.y;
    }

    /// Circle containment, boundary inclusive.
    pub fn contains(&self, point: Point) -> bool {
        self.center().distance(point) <= self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_colors() {
        assert_eq!(TokenKind::Monster.default_color(), "#ef4444");
        assert_eq!(TokenKind::Npc.default_color(), "#f59e0b");
        assert_eq!(TokenKind::Character.default_color(), "#3b82f6");
    }

    #[test]
    fn test_contains_boundary() {
        let token = Token::marker("X", "#fff", Point::new(0.0, 0.0), 30.0);
        assert!(token.contains(Point::new(30.0, 0.0)));
        assert!(!token.contains(Point::new(22.0, 22.0)));
    }

    #[test]
    fn test_kind_wire_names() {
        let token = Token::referenced(TokenKind::Npc, "n1", "Innkeeper", Point::ZERO, 30.0);
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["kind"], "npc");
        assert_eq!(json["referenceId"], "n1");
    }
}
