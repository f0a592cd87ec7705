//! Bitmap mask collaborator.
//!
//! The mask attenuates output brightness per canvas pixel. Sampling the
//! bitmap is the implementor's business; the pipeline only forwards pixels to
//! projectors and, optionally, traces the mask's outlines.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Greyscale mask pixels, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskPixels {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl MaskPixels {
    /// A fully open mask (every pixel at full brightness).
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![255; width * height],
        }
    }

    /// Brightness in 0..=1 at a pixel, or 0 outside the bitmap.
    pub fn brightness_at(&self, x: usize, y: usize) -> f64 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data
            .get(y * self.width + x)
            .map_or(0.0, |&v| v as f64 / 255.0)
    }
}

pub trait MaskSource {
    /// (Re)allocate for a canvas of `width` x `height`.
    fn init(&mut self, width: usize, height: usize);
    /// Advance per-frame state.
    fn update(&mut self);
    fn pixels(&self) -> &MaskPixels;
    /// Brightness multiplier in 0..=1 at a canvas position.
    fn brightness(&self, x: f64, y: f64) -> f64;
    /// Outline polygons of the masked regions. The caller owns the result.
    fn outline_shapes(&self) -> Vec<Vec<Point>>;
}
