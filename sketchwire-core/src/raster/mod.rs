//! Drawing surface: canvas, brush, and gesture rasterization.

pub mod brush;
pub mod canvas;
pub mod rasterizer;

// ── Re-exports ───────────────────────────────────────────────────

pub use brush::{Brush, BrushMode, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
pub use canvas::{CANVAS_HEIGHT, CANVAS_WIDTH, Canvas, CanvasPoint, LUM_OFF, LUM_ON};
pub use rasterizer::Rasterizer;
