//! Pointer-gesture to pixel-state translation.
//!
//! The rasterizer owns the canvas and the brush, and turns a stream of
//! `begin` / `extend` / `end` gesture events into plotted pixels. Line
//! segments between successive points are stepped with integer
//! Bresenham — no floating point — and every visited coordinate gets a
//! full brush-sized stamp, so a stroke has uniform thickness.

use crate::bitmap::PackedBitmap;
use crate::raster::brush::{Brush, BrushMode};
use crate::raster::canvas::{CANVAS_HEIGHT, CANVAS_WIDTH, Canvas, CanvasPoint};

/// Owned drawing-surface state: canvas + brush + active stroke.
///
/// All mutation happens on the caller's event loop; the type is
/// deliberately not `Sync` shared — snapshots for packing are taken
/// through [`canvas`](Self::canvas).
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    canvas: Canvas,
    brush: Brush,
    /// Last plotted point of the active stroke, if any.
    last: Option<CanvasPoint>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Gesture operations ───────────────────────────────────────

    /// Start a stroke: stamp the brush at `p` and remember it.
    pub fn begin(&mut self, p: CanvasPoint) {
        self.plot(p);
        self.last = Some(p);
    }

    /// Continue a stroke: draw a line from the last point to `p`.
    ///
    /// Ignored when no stroke is active (a move event without a prior
    /// press delivers no pixels, same as the pointer model).
    pub fn extend(&mut self, p: CanvasPoint) {
        if let Some(last) = self.last {
            self.line(last, p);
            self.last = Some(p);
        }
    }

    /// Terminate the stroke; further `extend` calls are no-ops until
    /// the next `begin`.
    pub fn end(&mut self) {
        self.last = None;
    }

    /// Reset every pixel to off. Does not touch the brush.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.last = None;
    }

    /// Replace the canvas contents with a retrieved bitmap.
    pub fn load_bitmap(&mut self, bitmap: &PackedBitmap) {
        bitmap.apply_to(&mut self.canvas);
        self.last = None;
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Read-only snapshot handle for the bit-packer.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn set_brush_size(&mut self, size: u8) {
        self.brush.set_size(size);
    }

    pub fn set_brush_mode(&mut self, mode: BrushMode) {
        self.brush.set_mode(mode);
    }

    /// Whether a stroke is currently open.
    pub fn stroke_active(&self) -> bool {
        self.last.is_some()
    }

    // ── Plotting ─────────────────────────────────────────────────

    /// Stamp an `s×s` brush square centered on `p`, truncating the
    /// center toward the lower-left (`r = s / 2`) and clipping to the
    /// canvas bounds.
    fn plot(&mut self, p: CanvasPoint) {
        let s = self.brush.size() as i32;
        let r = s / 2;
        let lum = self.brush.luminance();

        for dy in 0..s {
            let y = p.y() - r + dy;
            if y < 0 || y >= CANVAS_HEIGHT as i32 {
                continue;
            }
            for dx in 0..s {
                let x = p.x() - r + dx;
                if x < 0 || x >= CANVAS_WIDTH as i32 {
                    continue;
                }
                self.canvas.set(CanvasPoint::clamped(x, y), lum);
            }
        }
    }

    /// Integer Bresenham line from `a` to `b`, plotting the brush at
    /// every step. The balanced-error form visits the same pixel set
    /// in either direction.
    fn line(&mut self, a: CanvasPoint, b: CanvasPoint) {
        let (mut x0, mut y0) = (a.x(), a.y());
        let (x1, y1) = (b.x(), b.y());

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(CanvasPoint::clamped(x0, y0));
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
