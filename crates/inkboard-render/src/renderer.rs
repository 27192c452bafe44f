//! Renderer trait abstraction.

use inkboard_core::Whiteboard;
use inkboard_core::shapes::ShapeId;
use kurbo::Size;
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

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The board to render.
    pub board: &'a Whiteboard,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Window color around the stage.
    pub background_color: Color,
    /// Stage fill. Erase strokes are painted with it.
    pub stage_color: Color,
    /// Transformer outline and anchor color.
    pub selection_color: Color,
    /// Text node being edited. Drawn separately with its caret.
    pub editing_shape_id: Option<ShapeId>,
}

impl<'a> RenderContext<'a> {
    pub fn new(board: &'a Whiteboard, viewport_size: Size) -> Self {
        Self {
            board,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(235, 235, 235, 255),
            stage_color: board.config().background.into(),
            selection_color: Color::from_rgba8(0, 161, 255, 255),
            editing_shape_id: board.text_edit().map(|edit| edit.shape_id),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the drawing commands for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
