//! Battle-map render library
//!
//! Layered composition of a scene into a backend-neutral display list, the
//! renderer and asset-renderer contracts, and the read-only viewer.

mod compose;
mod display;
mod renderer;
pub mod viewer;

pub use compose::{WALL_TILE_SPACING, compose, compose_weather, wall_tile_centers};
pub use display::{DisplayItem, DisplayList, DrawCommand, Layer, color_or_default, parse_color};
pub use renderer::{AssetRenderer, GridStyle, RenderContext, RenderResult, Renderer, RendererError};
pub use viewer::Viewer;
