//! Renderer trait abstraction.

use crate::display::{DisplayList, DrawCommand};
use battlemap_core::camera::Camera;
use battlemap_core::editor::Editor;
use battlemap_core::gesture::Handle;
use battlemap_core::scene::{Drawing, Scene};
use battlemap_core::snap::GRID_SIZE;
use kurbo::{Affine, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid.
    None,
    /// Full grid lines.
    #[default]
    Lines,
}

impl GridStyle {
    /// Toggle the grid.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Lines => "Lines",
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The scene to render.
    pub scene: &'a Scene,
    pub camera: Camera,
    /// Viewport size in logical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    pub background_color: Color,
    pub grid_style: GridStyle,
    /// Grid spacing in world units.
    pub grid_size: f64,
    pub grid_color: Color,
    /// Handle highlight color.
    pub selection_color: Color,
    /// In-progress stroke or segment.
    pub preview: Option<Drawing>,
    /// Handles of the selected asset (transform tool only).
    pub handles: Option<[Handle; 2]>,
    /// Handle radius in screen pixels.
    pub handle_radius: f64,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(scene: &'a Scene, camera: Camera, viewport_size: Size) -> Self {
        Self {
            scene,
            camera,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(15, 23, 42, 255),
            grid_style: GridStyle::Lines,
            grid_size: GRID_SIZE,
            grid_color: Color::from_rgba8(51, 65, 85, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            preview: None,
            handles: None,
            handle_radius: 12.0,
        }
    }

    /// Context for the author's view: includes the preview and handles.
    pub fn for_editor(editor: &'a Editor, viewport_size: Size) -> Self {
        let config = editor.config();
        let mut ctx = Self::new(editor.scene(), editor.camera(), viewport_size);
        ctx.grid_size = config.grid_size;
        ctx.handle_radius = config.handle_radius;
        ctx.preview = editor.preview();
        ctx.handles = editor.handles();
        ctx
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    pub fn with_preview(mut self, preview: Option<Drawing>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_handles(mut self, handles: Option<[Handle; 2]>) -> Self {
        self.handles = handles;
        self
    }

    /// World to device pixels.
    pub fn world_transform(&self) -> Affine {
        Affine::scale(self.scale_factor) * self.camera.transform()
    }
}

/// Trait for rendering backends.
///
/// A backend replays a [`DisplayList`] front to back; layers arrive in
/// paint order.
pub trait Renderer: Send + Sync {
    /// Start a frame, clearing to `background`.
    fn begin_frame(&mut self, _background: Color) {}

    /// Draw one command with the transform of its layer.
    fn draw(&mut self, command: &DrawCommand, transform: Affine) -> RenderResult<()>;

    fn end_frame(&mut self) -> RenderResult<()> {
        Ok(())
    }

    /// Replay a whole display list.
    fn render(&mut self, list: &DisplayList) -> RenderResult<()> {
        self.begin_frame(list.background);
        for item in list.items() {
            self.draw(&item.command, list.transform_for(item.layer))?;
        }
        self.end_frame()
    }
}

/// Turns an asset type into a picture.
///
/// Implementations must tolerate unknown types and return a placeholder
/// instead of failing.
pub trait AssetRenderer {
    type Visual;

    fn render(
        &self,
        asset_type: &str,
        width: f64,
        height: f64,
        rotation: Option<f64>,
        image_url: Option<&str>,
    ) -> Self::Visual;
}
