//! Colors and the cluster palette.

use crate::dataset::ClusterId;

/// RGBA color in linear space.
///
/// All components are expected to be in the 0.0..=1.0 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
}

/// Colors assigned to clusters by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Color>,
    muted: Color,
}

impl Palette {
    /// Create a palette. An empty color list falls back to black.
    pub fn new(colors: Vec<Color>, muted: Color) -> Self {
        Self { colors, muted }
    }

    /// Color for the cluster at `index`, or the muted color when another
    /// cluster has focus.
    pub fn color(&self, index: usize, cluster: &ClusterId, focus: Option<&ClusterId>) -> Color {
        if focus.is_some_and(|focus| focus != cluster) {
            return self.muted;
        }
        if self.colors.is_empty() {
            return Color::BLACK;
        }
        self.colors[index % self.colors.len()]
    }

    /// Color used for unfocused clusters.
    pub fn muted(&self) -> Color {
        self.muted
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(
            vec![
                Color::from_rgb8(0x1f, 0x77, 0xb4),
                Color::from_rgb8(0xff, 0x7f, 0x0e),
                Color::from_rgb8(0x2c, 0xa0, 0x2c),
                Color::from_rgb8(0xd6, 0x27, 0x28),
                Color::from_rgb8(0x94, 0x67, 0xbd),
                Color::from_rgb8(0x8c, 0x56, 0x4b),
                Color::from_rgb8(0xe3, 0x77, 0xc2),
                Color::from_rgb8(0x17, 0xbe, 0xcf),
            ],
            Color::from_rgb8(0xcc, 0xcc, 0xcc),
        )
    }
}
