//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    SpreadLayout, calculate_full_dimensions, calculate_spread_layout, is_text_heavy,
    normalized_box_to_pixels,
};
use super::params::{
    Anchor, CombineParams, CoverParams, CropRegion, Quality, ResizeParams, Sharpening,
};
use crate::config::ImagesConfig;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    Ok(backend.identify(path)?.as_tuple())
}

/// Configuration for full image generation.
#[derive(Debug, Clone)]
pub struct FullConfig {
    pub max_width: u32,
    pub quality: Quality,
    pub text_heavy_quality: Quality,
}

impl From<&ImagesConfig> for FullConfig {
    fn from(config: &ImagesConfig) -> Self {
        Self {
            max_width: config.full_max_width,
            quality: Quality::new(config.full_quality),
            text_heavy_quality: Quality::new(config.text_heavy_quality),
        }
    }
}

impl Default for FullConfig {
    fn default() -> Self {
        Self::from(&ImagesConfig::default())
    }
}

/// Plan a full image without executing it.
///
/// Text-heavy sources get the higher quality, and light sharpening when
/// they were actually scaled down.
pub fn plan_full_image(
    source: &Path,
    output_path: &Path,
    source_dims: (u32, u32),
    config: &FullConfig,
) -> ResizeParams {
    let (width, height) = calculate_full_dimensions(source_dims, config.max_width);
    let text_heavy = is_text_heavy(source_dims.0);
    let downscaled = (width, height) != source_dims;

    ResizeParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        quality: if text_heavy {
            config.text_heavy_quality
        } else {
            config.quality
        },
        sharpening: (text_heavy && downscaled).then(Sharpening::light),
    }
}

/// Create `{id}.avif` in `output_dir`. Returns the file name.
pub fn create_full_image(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    id: &str,
    source_dims: (u32, u32),
    config: &FullConfig,
) -> Result<String> {
    let name = format!("{}.avif", id);
    let params = plan_full_image(source, &output_dir.join(&name), source_dims, config);
    backend.resize(&params)?;
    Ok(name)
}

/// Configuration for cover generation.
#[derive(Debug, Clone)]
pub struct CoverConfig {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

impl From<&ImagesConfig> for CoverConfig {
    fn from(config: &ImagesConfig) -> Self {
        Self {
            width: config.cover_width,
            height: config.cover_height,
            quality: Quality::new(config.cover_quality),
        }
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self::from(&ImagesConfig::default())
    }
}

/// Which part of a source becomes the cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverCrop {
    /// Fill the cover size, crop at the anchor.
    Fill(Anchor),
    /// A box in fractions of the source size.
    Box {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
}

impl Default for CoverCrop {
    fn default() -> Self {
        CoverCrop::Fill(Anchor::Center)
    }
}

/// Plan a cover operation without executing it.
pub fn plan_cover(
    source: &Path,
    output_path: &Path,
    source_dims: (u32, u32),
    crop: &CoverCrop,
    config: &CoverConfig,
) -> CoverParams {
    let region = match *crop {
        CoverCrop::Fill(anchor) => CropRegion::Fill(anchor),
        CoverCrop::Box {
            left,
            top,
            width,
            height,
        } => {
            let px = normalized_box_to_pixels(source_dims, left, top, width, height);
            CropRegion::Box {
                x: px.x,
                y: px.y,
                width: px.width,
                height: px.height,
            }
        }
    };

    CoverParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width: config.width,
        height: config.height,
        region,
        quality: config.quality,
    }
}

/// Create `{id}_cover.avif` in `output_dir`. Returns the file name.
pub fn create_cover(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    id: &str,
    source_dims: (u32, u32),
    crop: &CoverCrop,
    config: &CoverConfig,
) -> Result<String> {
    let name = format!("{}_cover.avif", id);
    let params = plan_cover(source, &output_dir.join(&name), source_dims, crop, config);
    backend.cover(&params)?;
    Ok(name)
}

/// Plan a two-page spread without executing it.
pub fn plan_combine(
    left: &Path,
    right: &Path,
    output_path: &Path,
    left_dims: (u32, u32),
    right_dims: (u32, u32),
    quality: Quality,
) -> CombineParams {
    let layout = calculate_spread_layout(left_dims, right_dims);
    CombineParams {
        left: left.to_path_buf(),
        right: right.to_path_buf(),
        output: output_path.to_path_buf(),
        left_width: layout.left_width,
        right_width: layout.right_width,
        height: layout.height,
        quality,
    }
}

/// Join two pages into one spread image at `output_path`.
pub fn combine_spread(
    backend: &impl ImageBackend,
    left: &Path,
    right: &Path,
    output_path: &Path,
    quality: Quality,
) -> Result<SpreadLayout> {
    let left_dims = get_dimensions(backend, left)?;
    let right_dims = get_dimensions(backend, right)?;
    let params = plan_combine(left, right, output_path, left_dims, right_dims, quality);
    backend.combine(&params)?;
    Ok(SpreadLayout {
        height: params.height,
        left_width: params.left_width,
        right_width: params.right_width,
    })
}
