//! Brush configuration consumed by plot operations.

use crate::raster::canvas::{LUM_OFF, LUM_ON};

/// Smallest allowed brush edge in pixels.
pub const MIN_BRUSH_SIZE: u8 = 1;

/// Largest allowed brush edge in pixels.
pub const MAX_BRUSH_SIZE: u8 = 10;

// ── BrushMode ────────────────────────────────────────────────────

/// Whether plots turn pixels on or off. The modes are mutually
/// exclusive — there is no blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushMode {
    #[default]
    Draw,
    Erase,
}

impl BrushMode {
    /// Luminance written by a plot in this mode.
    pub const fn luminance(self) -> u8 {
        match self {
            BrushMode::Draw => LUM_ON,
            BrushMode::Erase => LUM_OFF,
        }
    }
}

// ── Brush ────────────────────────────────────────────────────────

/// Mutable brush settings: an `s×s` square stamp and a draw/erase
/// mode. Updated synchronously from user input; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brush {
    size: u8,
    mode: BrushMode,
}

impl Brush {
    pub fn new() -> Self {
        Self {
            size: 2,
            mode: BrushMode::Draw,
        }
    }

    /// Brush edge length in pixels, always within `[1, 10]`.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Set the brush size. Out-of-range values are clamped, not
    /// rejected.
    pub fn set_size(&mut self, size: u8) {
        self.size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    pub fn mode(&self) -> BrushMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: BrushMode) {
        self.mode = mode;
    }

    /// Luminance this brush currently writes.
    pub fn luminance(&self) -> u8 {
        self.mode.luminance()
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
