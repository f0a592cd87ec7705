use std::fmt;

use serde::{Deserialize, Serialize};

/// RGB colour of a shape or laser point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const CYAN: Color = Color { r: 0, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, clamped to 0..=1.
    pub fn scaled(&self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let ch = |c: u8| (c as f64 * f).round() as u8;
        Self {
            r: ch(self.r),
            g: ch(self.g),
            b: ch(self.b),
        }
    }

    pub fn to_f32_array(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Named rendering profile. It governs point density and scan speed in the
/// projector; this crate only carries the name through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile(String);

impl Profile {
    pub const FAST: &'static str = "FAST";
    pub const DEFAULT: &'static str = "DEFAULT";
    pub const DETAIL: &'static str = "DETAIL";

    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn fast() -> Self {
        Self::named(Self::FAST)
    }

    pub fn detail() -> Self {
        Self::named(Self::DETAIL)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::named(Self::DEFAULT)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
