//! Two-page spreads from remote (or local) page images.
//!
//! `pressroom combine-spread <left> <right> <name>` downloads both pages into
//! the temp directory, scales them to a common height and writes the spread
//! to `images/src/{name}.jpg`, where [`crate::optimize`] picks it up.
//!
//! File-sharing links (`…/d/{id}/…`) are rewritten to their full-resolution
//! download form before fetching. Arguments that are not `http(s)` URLs are
//! read as local paths.

use crate::classify::drive_file_id;
use crate::imaging::{
    BackendError, ImageBackend, Quality, RustBackend, SpreadLayout, combine_spread,
};
use crate::optimize::SOURCE_DIR;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Spreads are written as JPEG so the optimizer can read them back.
pub const SPREAD_QUALITY: u32 = 90;

const DRIVE_DOWNLOAD_BASE: &str = "https://lh3.googleusercontent.com/d/";

#[derive(Error, Debug)]
pub enum CombineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download of {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("page not found: {0}")]
    MissingPage(PathBuf),
    #[error("invalid spread name {0:?} (use a plain file name without extension)")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Where page images come from.
pub trait PageFetcher {
    /// Download `url` to `dest`.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), CombineError>;
}

/// Downloads pages over HTTP.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CombineError> {
        // The image host rejects requests without a browser user agent.
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), CombineError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "image/*")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CombineError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        std::fs::write(dest, response.bytes()?)?;
        Ok(())
    }
}

/// Full-resolution download URL for a file-sharing link; other URLs pass
/// through.
pub fn download_url(link: &str) -> String {
    match drive_file_id(link) {
        Some(id) => format!("{DRIVE_DOWNLOAD_BASE}{id}=s0"),
        None => link.to_string(),
    }
}

fn is_remote(arg: &str) -> bool {
    arg.starts_with("http://") || arg.starts_with("https://")
}

fn validate_name(name: &str) -> Result<(), CombineError> {
    let invalid = name.is_empty()
        || name.contains(['/', '\\'])
        || name.starts_with('.')
        || Path::new(name).extension().is_some();
    if invalid {
        return Err(CombineError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Output path of a spread named `name`.
pub fn spread_path(project_dir: &Path, name: &str) -> PathBuf {
    project_dir.join(SOURCE_DIR).join(format!("{name}.jpg"))
}

/// What `combine-spread` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineSummary {
    pub output: PathBuf,
    pub layout: SpreadLayout,
}

pub fn combine(
    left: &str,
    right: &str,
    name: &str,
    project_dir: &Path,
    temp_dir: &Path,
) -> Result<CombineSummary, CombineError> {
    combine_with(
        &HttpFetcher::new()?,
        &RustBackend::new(),
        left,
        right,
        name,
        project_dir,
        temp_dir,
    )
}

/// Combine with a specific fetcher and backend (allows testing with mocks).
pub fn combine_with(
    fetcher: &impl PageFetcher,
    backend: &impl ImageBackend,
    left: &str,
    right: &str,
    name: &str,
    project_dir: &Path,
    temp_dir: &Path,
) -> Result<CombineSummary, CombineError> {
    validate_name(name)?;

    let left_path = resolve_page(fetcher, left, &temp_dir.join(format!("{name}-left")))?;
    let right_path = resolve_page(fetcher, right, &temp_dir.join(format!("{name}-right")))?;

    let output = spread_path(project_dir, name);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let layout = combine_spread(
        backend,
        &left_path,
        &right_path,
        &output,
        Quality::new(SPREAD_QUALITY),
    )?;
    tracing::info!(
        output = %output.display(),
        width = layout.total_width(),
        height = layout.height,
        "spread written"
    );
    Ok(CombineSummary { output, layout })
}

/// Download a remote page to `dest`, or check that a local one exists.
fn resolve_page(
    fetcher: &impl PageFetcher,
    arg: &str,
    dest: &Path,
) -> Result<PathBuf, CombineError> {
    if !is_remote(arg) {
        let path = PathBuf::from(arg);
        if !path.is_file() {
            return Err(CombineError::MissingPage(path));
        }
        return Ok(path);
    }

    let url = download_url(arg);
    tracing::debug!(%url, dest = %dest.display(), "downloading page");
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    fetcher.fetch(&url, dest)?;
    Ok(dest.to_path_buf())
}
