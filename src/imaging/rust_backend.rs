//! [`ImageBackend`] on top of the `image` crate.
//!
//! No external tools: decoders and the AV1 encoder are compiled in.
//!
//! | Step | Implementation |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate, format sniffed from content |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Cover crop | fill resize + `crop_imm`, or `crop_imm` + `resize_to_fill` |
//! | Spread canvas | `image::RgbImage` + `imageops::overlay` |
//! | AVIF output | `AvifEncoder::new_with_speed_quality`, speed 6 |
//! | JPEG output | `JpegEncoder::new_with_quality`, flattened to RGB |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_crop_offset, calculate_fill_dimensions};
use super::params::{CombineParams, CoverParams, CropRegion, ResizeParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use std::path::Path;
use std::sync::LazyLock;

/// Source extensions the optimizer picks up.
///
/// AVIF is not among them: the `image` crate's `"avif"` feature only enables
/// the encoder.
const SOURCE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    SOURCE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Source extensions `optimize` accepts in this build.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// The production backend. Stateless, so one instance serves all workers.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    // Downloaded pages may have no extension, so sniff the format.
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

fn decode(path: &Path) -> Result<DynamicImage, BackendError> {
    open(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("cannot decode {}: {}", path.display(), e))
    })
}

/// Encoder chosen by the output extension.
fn encode(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "avif" => encode_avif(img, path, quality),
        "jpg" | "jpeg" => encode_jpeg(img, path, quality),
        other => Err(BackendError::ProcessingFailed(format!(
            "no encoder for .{other} output"
        ))),
    }
}

fn encode_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let out = std::io::BufWriter::new(std::fs::File::create(path)?);
    img.write_with_encoder(image::codecs::avif::AvifEncoder::new_with_speed_quality(
        out,
        6,
        quality as u8,
    ))
    .map_err(|e| BackendError::ProcessingFailed(format!("cannot encode AVIF: {e}")))
}

/// JPEG has no alpha channel, so the image is flattened to RGB first.
fn encode_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let out = std::io::BufWriter::new(std::fs::File::create(path)?);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            out,
            quality as u8,
        ))
        .map_err(|e| BackendError::ProcessingFailed(format!("cannot encode JPEG: {e}")))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        open(path)?
            .into_dimensions()
            .map(|(width, height)| Dimensions { width, height })
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("cannot read size of {}: {e}", path.display()))
            })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = decode(&params.source)?;
        let resized = if (img.width(), img.height()) == (params.width, params.height) {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        let out = match params.sharpening {
            Some(sharpening) => DynamicImage::from(image::imageops::unsharpen(
                &resized,
                sharpening.sigma,
                sharpening.threshold,
            )),
            None => resized,
        };

        encode(&out, &params.output, params.quality.value())
    }

    fn cover(&self, params: &CoverParams) -> Result<(), BackendError> {
        let img = decode(&params.source)?;
        let target = (params.width, params.height);

        let cover = match params.region {
            CropRegion::Fill(anchor) => {
                let (fill_w, fill_h) = calculate_fill_dimensions((img.width(), img.height()), target);
                let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
                let (x, y) = calculate_crop_offset((fill_w, fill_h), target, anchor);
                filled.crop_imm(x, y, params.width, params.height)
            }
            CropRegion::Box {
                x,
                y,
                width,
                height,
            } => img
                .crop_imm(x, y, width, height)
                .resize_to_fill(params.width, params.height, FilterType::Lanczos3),
        };

        encode(&cover, &params.output, params.quality.value())
    }

    fn combine(&self, params: &CombineParams) -> Result<(), BackendError> {
        let left = decode(&params.left)?.resize_exact(
            params.left_width,
            params.height,
            FilterType::Lanczos3,
        );
        let right = decode(&params.right)?.resize_exact(
            params.right_width,
            params.height,
            FilterType::Lanczos3,
        );

        let mut canvas = RgbImage::from_pixel(
            params.left_width + params.right_width,
            params.height,
            Rgb([255, 255, 255]),
        );
        image::imageops::overlay(&mut canvas, &left.to_rgb8(), 0, 0);
        image::imageops::overlay(&mut canvas, &right.to_rgb8(), params.left_width as i64, 0);

        encode(
            &DynamicImage::ImageRgb8(canvas),
            &params.output,
            params.quality.value(),
        )
    }
}
