//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what images to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). Tests swap in a mock backend and check
//! the parameters alone.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1-100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters applied after downscaling.
//! - [`ResizeParams`]: Scale to exact dimensions, optionally sharpen.
//! - [`CoverParams`]: Cut a fixed-size cover out of a source.
//! - [`CombineParams`]: Put two pages side by side at a common height.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening that keeps small print legible after downscaling.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Parameters for a resize operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

/// Which part of a fill-resized image survives the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    /// Keep the top edge (magazine covers: masthead and headline).
    Top,
}

/// How the cover region is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropRegion {
    /// Resize to cover the target, then crop at the anchor.
    Fill(Anchor),
    /// Cut this pixel box out of the source first, then fill the target.
    Box {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Parameters for a cover operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Final cover dimensions.
    pub width: u32,
    pub height: u32,
    pub region: CropRegion,
    pub quality: Quality,
}

/// Parameters for joining two pages into one spread image.
///
/// Both pages are scaled to `height`; the canvas is
/// `left_width + right_width` wide with a white background.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineParams {
    pub left: PathBuf,
    pub right: PathBuf,
    pub output: PathBuf,
    pub left_width: u32,
    pub right_width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn sharpening_light_values() {
        let s = Sharpening::light();
        assert_eq!(s.sigma, 0.5);
        assert_eq!(s.threshold, 0);
    }
}
