//! Backend-neutral display list.

use crate::renderer::AssetRenderer;
use battlemap_core::gesture::HandleKind;
use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// Paint layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Grid,
    Drawings,
    Assets,
    Preview,
    Handles,
    Tokens,
    /// Screen-space particle overlay.
    Weather,
}

impl Layer {
    /// Whether the layer is drawn in screen pixels rather than world units.
    pub fn is_screen_space(self) -> bool {
        matches!(self, Layer::Background | Layer::Weather)
    }
}

/// A single drawing primitive.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    Polyline {
        points: Vec<Point>,
        color: Color,
        width: f64,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f64,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        color: Color,
        width: f64,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Color,
    },
    /// A placed asset, drawn by the [`AssetRenderer`].
    Asset {
        asset_type: String,
        rect: Rect,
        /// Degrees about the rect center.
        rotation: f64,
        image_url: Option<String>,
        label: Option<String>,
    },
    /// One repeated asset tile along a wall.
    WallTile {
        asset_type: String,
        center: Point,
        size: f64,
        rotation: f64,
    },
    Token {
        center: Point,
        radius: f64,
        border: Color,
        label: String,
        image: Option<String>,
    },
    Handle {
        position: Point,
        kind: HandleKind,
        radius: f64,
        color: Color,
    },
}

/// A command tagged with its layer.
#[derive(Debug, Clone)]
pub struct DisplayItem {
    pub layer: Layer,
    pub command: DrawCommand,
}

/// Ordered draw commands for one frame.
#[derive(Debug, Clone)]
pub struct DisplayList {
    pub background: Color,
    /// World to device pixels.
    pub world_transform: Affine,
    /// Logical to device pixels.
    pub screen_transform: Affine,
    items: Vec<DisplayItem>,
}

impl DisplayList {
    pub fn new(background: Color, world_transform: Affine, screen_transform: Affine) -> Self {
        Self {
            background,
            world_transform,
            screen_transform,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer, command: DrawCommand) {
        self.items.push(DisplayItem { layer, command });
    }

    /// Append another list's items, keeping their layers.
    pub fn extend(&mut self, other: DisplayList) {
        self.items.extend(other.items);
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Commands of one layer, in paint order.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.items.iter().filter(move |i| i.layer == layer).map(|i| &i.command)
    }

    pub fn transform_for(&self, layer: Layer) -> Affine {
        if layer.is_screen_space() {
            self.screen_transform
        } else {
            self.world_transform
        }
    }

    /// Ask `renderer` for a visual per asset and wall tile, in paint order.
    pub fn render_assets<A: AssetRenderer>(&self, renderer: &A) -> Vec<A::Visual> {
        self.items
            .iter()
            .filter_map(|item| match &item.command {
                DrawCommand::Asset {
                    asset_type,
                    rect,
                    rotation,
                    image_url,
                    ..
                } => Some(renderer.render(
                    asset_type,
                    rect.width(),
                    rect.height(),
                    Some(*rotation),
                    image_url.as_deref(),
                )),
                DrawCommand::WallTile {
                    asset_type,
                    size,
                    rotation,
                    ..
                } => Some(renderer.render(asset_type, *size, *size, Some(*rotation), None)),
                _ => None,
            })
            .collect()
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Color::from_rgba8(rgb[0], rgb[1], rgb[2], 255))
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some(Color::from_rgba8(r, g, b, a))
        }
        _ => None,
    }
}

/// Scene color with a neutral fallback for unparseable values.
pub fn color_or_default(value: &str) -> Color {
    parse_color(value).unwrap_or_else(|| {
        log::debug!("Unparseable color {:?}, using fallback", value);
        Color::from_rgba8(148, 163, 184, 255)
    })
}
