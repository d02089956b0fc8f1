//! Offline image optimization for self-hosted press images.
//!
//! Every source in `images/src` becomes a full-size AVIF and a fixed-size
//! cover crop; `images/manifest.json` lists what was produced.
//!
//! ## Output Structure
//!
//! ```text
//! images/
//! ├── src/                  # Sources (jpg, jpeg, png, webp)
//! │   └── interview.jpg
//! ├── crops.json            # Optional per-image cover crops
//! ├── full/
//! │   └── interview.avif    # Width capped, sharpened if text-heavy
//! ├── cover/
//! │   └── interview_cover.avif
//! └── manifest.json
//! ```
//!
//! ## crops.json
//!
//! Keyed by image id (file stem):
//!
//! ```json
//! {
//!   "interview": { "left": 0.1, "top": 0.05, "width": 0.6 },
//!   "magazine":  { "strategy": "north" }
//! }
//! ```
//!
//! Box values are fractions of the source size; a missing `width` or
//! `height` is `0.5`. `north` keeps the top edge, any other strategy centers.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel on the global rayon pool. Progress is
//! reported as [`OptimizeEvent`]s over an optional channel.

use crate::config::ImagesConfig;
use crate::imaging::{
    Anchor, BackendError, CoverConfig, CoverCrop, FullConfig, ImageBackend, RustBackend,
    create_cover, create_full_image, get_dimensions, supported_input_extensions,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

pub const SOURCE_DIR: &str = "images/src";
pub const FULL_DIR: &str = "images/full";
pub const COVER_DIR: &str = "images/cover";
pub const CROPS_FILE: &str = "images/crops.json";
pub const MANIFEST_FILE: &str = "images/manifest.json";

/// Fraction used for a crop box side that is not given.
const DEFAULT_BOX_SIDE: f64 = 0.5;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Cover crop entry from `crops.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CropEntry {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub strategy: Option<String>,
}

impl CropEntry {
    /// A box wins over a strategy.
    pub fn to_crop(&self) -> CoverCrop {
        if self.left.is_some() || self.top.is_some() {
            return CoverCrop::Box {
                left: self.left.unwrap_or(0.0),
                top: self.top.unwrap_or(0.0),
                width: self.width.unwrap_or(DEFAULT_BOX_SIDE),
                height: self.height.unwrap_or(DEFAULT_BOX_SIDE),
            };
        }
        match self.strategy.as_deref() {
            Some("north") => CoverCrop::Fill(Anchor::Top),
            _ => CoverCrop::Fill(Anchor::Center),
        }
    }
}

/// Read `crops.json`. A missing file means no crops.
pub fn load_crops(path: &Path) -> Result<HashMap<String, CropEntry>, OptimizeError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| OptimizeError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// One line of `manifest.json`. Paths are relative to the project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub cover: String,
    pub full: String,
    pub original: String,
}

/// Progress events emitted while optimizing.
#[derive(Debug, Clone)]
pub enum OptimizeEvent {
    Started {
        total: usize,
    },
    ImageDone {
        /// 1-based position in source order.
        index: usize,
        id: String,
        source: String,
        dimensions: (u32, u32),
        crop: CoverCrop,
        full: String,
        cover: String,
    },
    ImageFailed {
        index: usize,
        source: String,
        error: String,
    },
}

#[derive(Debug)]
pub struct OptimizeResult {
    pub manifest: Vec<ManifestEntry>,
    pub failed: usize,
}

/// Source images directly inside `dir`, sorted by file name.
pub fn find_sources(dir: &Path) -> Result<Vec<PathBuf>, OptimizeError> {
    if !dir.is_dir() {
        return Err(OptimizeError::SourceNotFound(dir.to_path_buf()));
    }
    let supported = supported_input_extensions();
    let mut sources = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_supported = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| supported.contains(&e.to_lowercase().as_str()));
        if is_supported {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

fn image_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn optimize(
    project_dir: &Path,
    config: &ImagesConfig,
    progress: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeResult, OptimizeError> {
    optimize_with_backend(&RustBackend::new(), project_dir, config, progress)
}

/// Optimize using a specific backend (allows testing with mock).
///
/// Per-image failures are reported and skipped; only setup errors (missing
/// source directory, bad `crops.json`, unwritable output) abort the run.
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    project_dir: &Path,
    config: &ImagesConfig,
    progress: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeResult, OptimizeError> {
    let sources = find_sources(&project_dir.join(SOURCE_DIR))?;
    let crops = load_crops(&project_dir.join(CROPS_FILE))?;

    let full_dir = project_dir.join(FULL_DIR);
    let cover_dir = project_dir.join(COVER_DIR);
    std::fs::create_dir_all(&full_dir)?;
    std::fs::create_dir_all(&cover_dir)?;

    let full_config = FullConfig::from(config);
    let cover_config = CoverConfig::from(config);

    if let Some(tx) = &progress {
        tx.send(OptimizeEvent::Started {
            total: sources.len(),
        })
        .ok();
    }

    let results: Vec<Option<ManifestEntry>> = sources
        .par_iter()
        .enumerate()
        .map_with(progress, |progress, (i, source)| {
            let id = image_id(source);
            let crop = crops.get(&id).map(CropEntry::to_crop).unwrap_or_default();
            let outcome = optimize_one(
                backend,
                source,
                &id,
                &crop,
                &full_dir,
                &cover_dir,
                &full_config,
                &cover_config,
            );

            let original = file_name(source);
            let (entry, event) = match outcome {
                Ok((dimensions, full, cover)) => {
                    let entry = ManifestEntry {
                        id: id.clone(),
                        cover: format!("{COVER_DIR}/{cover}"),
                        full: format!("{FULL_DIR}/{full}"),
                        original: format!("{SOURCE_DIR}/{original}"),
                    };
                    let event = OptimizeEvent::ImageDone {
                        index: i + 1,
                        id,
                        source: original,
                        dimensions,
                        crop,
                        full,
                        cover,
                    };
                    (Some(entry), event)
                }
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "image skipped");
                    let event = OptimizeEvent::ImageFailed {
                        index: i + 1,
                        source: original,
                        error: e.to_string(),
                    };
                    (None, event)
                }
            };
            if let Some(tx) = progress {
                tx.send(event).ok();
            }
            entry
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_none()).count();
    let manifest: Vec<ManifestEntry> = results.into_iter().flatten().collect();

    let json = serde_json::to_string_pretty(&manifest).map_err(|source| OptimizeError::Json {
        path: project_dir.join(MANIFEST_FILE),
        source,
    })?;
    std::fs::write(project_dir.join(MANIFEST_FILE), json)?;

    Ok(OptimizeResult { manifest, failed })
}

#[allow(clippy::too_many_arguments)]
fn optimize_one(
    backend: &impl ImageBackend,
    source: &Path,
    id: &str,
    crop: &CoverCrop,
    full_dir: &Path,
    cover_dir: &Path,
    full_config: &FullConfig,
    cover_config: &CoverConfig,
) -> Result<((u32, u32), String, String), BackendError> {
    let dimensions = get_dimensions(backend, source)?;
    let full = create_full_image(backend, source, full_dir, id, dimensions, full_config)?;
    let cover = create_cover(backend, source, cover_dir, id, dimensions, crop, cover_config)?;
    Ok((dimensions, full, cover))
}
