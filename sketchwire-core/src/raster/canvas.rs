//! The fixed-size monochrome drawing surface.

// ── Dimensions ───────────────────────────────────────────────────

/// Canvas width in pixels. Matches the target display panel.
pub const CANVAS_WIDTH: usize = 128;

/// Canvas height in pixels.
pub const CANVAS_HEIGHT: usize = 64;

/// Luminance written by a draw-mode plot.
pub const LUM_ON: u8 = 0xFF;

/// Luminance written by an erase-mode plot (and the cleared state).
pub const LUM_OFF: u8 = 0x00;

// ── CanvasPoint ──────────────────────────────────────────────────

/// An integer pixel coordinate guaranteed to lie on the canvas.
///
/// Construct via [`CanvasPoint::clamped`] or
/// [`CanvasPoint::from_widget`]; both clamp rather than fail, so
/// out-of-range pointer input can never error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasPoint {
    x: i32,
    y: i32,
}

impl CanvasPoint {
    /// Clamp arbitrary integer coordinates onto the canvas.
    pub fn clamped(x: i32, y: i32) -> Self {
        Self {
            x: x.clamp(0, CANVAS_WIDTH as i32 - 1),
            y: y.clamp(0, CANVAS_HEIGHT as i32 - 1),
        }
    }

    /// Map continuous widget-space coordinates to a canvas pixel.
    ///
    /// `widget_w`/`widget_h` are the displayed size of the drawing
    /// widget; the input position is scaled linearly, floored, then
    /// clamped onto the canvas.
    pub fn from_widget(x: f64, y: f64, widget_w: f64, widget_h: f64) -> Self {
        let cx = (x / widget_w * CANVAS_WIDTH as f64).floor() as i32;
        let cy = (y / widget_h * CANVAS_HEIGHT as f64).floor() as i32;
        Self::clamped(cx, cy)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }
}

// ── Canvas ───────────────────────────────────────────────────────

/// A `CANVAS_WIDTH × CANVAS_HEIGHT` luminance surface.
///
/// Each pixel carries an 8-bit luminance value; the bit-packer later
/// thresholds it to a single bit. Dimensions are constant for the
/// process lifetime — there is no resizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pixels: Vec<u8>,
}

impl Canvas {
    /// A fully-off canvas.
    pub fn new() -> Self {
        Self {
            pixels: vec![LUM_OFF; CANVAS_WIDTH * CANVAS_HEIGHT],
        }
    }

    /// Reset every pixel to off.
    pub fn clear(&mut self) {
        self.pixels.fill(LUM_OFF);
    }

    /// Luminance at `(x, y)`.
    pub fn get(&self, p: CanvasPoint) -> u8 {
        self.pixels[p.y as usize * CANVAS_WIDTH + p.x as usize]
    }

    /// Overwrite the luminance at `(x, y)`.
    pub fn set(&mut self, p: CanvasPoint, lum: u8) {
        self.pixels[p.y as usize * CANVAS_WIDTH + p.x as usize] = lum;
    }

    /// Raw row-major luminance buffer.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Count of pixels currently above the packing threshold.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&l| l > 127).count()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_is_blank() {
        let c = Canvas::new();
        assert_eq!(c.pixels().len(), CANVAS_WIDTH * CANVAS_HEIGHT);
        assert!(c.pixels().iter().all(|&l| l == LUM_OFF));
        assert_eq!(c.lit_count(), 0);
    }

    #[test]
    fn set_get_roundtrip() {
        let mut c = Canvas::new();
        let p = CanvasPoint::clamped(5, 7);
        c.set(p, LUM_ON);
        assert_eq!(c.get(p), LUM_ON);
        assert_eq!(c.lit_count(), 1);

        c.clear();
        assert_eq!(c.get(p), LUM_OFF);
    }

    #[test]
    fn point_clamps_to_bounds() {
        let p = CanvasPoint::clamped(-10, 9999);
        assert_eq!(p.x(), 0);
        assert_eq!(p.y(), CANVAS_HEIGHT as i32 - 1);
    }

    #[test]
    fn widget_mapping_scales_and_clamps() {
        // A 512×256 widget maps 4:1 onto the 128×64 canvas.
        let p = CanvasPoint::from_widget(256.0, 128.0, 512.0, 256.0);
        assert_eq!((p.x(), p.y()), (64, 32));

        // Positions outside the widget clamp instead of erroring.
        let p = CanvasPoint::from_widget(-30.0, 400.0, 512.0, 256.0);
        assert_eq!((p.x(), p.y()), (0, 63));

        // The far edge maps to the last pixel, not one past it.
        let p = CanvasPoint::from_widget(511.9, 255.9, 512.0, 256.0);
        assert_eq!((p.x(), p.y()), (127, 63));
    }
}
