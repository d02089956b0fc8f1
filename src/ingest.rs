//! Row ingestion: cache first, then the spreadsheet.
//!
//! ```text
//! RowCache::get ── hit ──────────────────────────────► rows
//!      │ miss
//!      ▼
//! SheetSource::fetch ─► sheet::parse_table ─► prepare_rows ─► RowCache::put ─► rows
//! ```
//!
//! Failures are returned, not retried. Callers treat an error as "keep the
//! static page" (see [`crate::pipeline`]).

use crate::cache::RowCache;
use crate::config::SheetConfig;
use crate::sheet::{self, SheetError};
use crate::types::Row;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("invalid sheet URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("unreadable sheet response: {0}")]
    Sheet(#[from] SheetError),
}

/// Where raw sheet responses come from.
pub trait SheetSource {
    /// Identifier used in the cache key.
    fn id(&self) -> &str;

    /// Fetch the raw response body.
    fn fetch(&self) -> Result<String, FetchError>;
}

/// The spreadsheet query endpoint over HTTP.
pub struct HttpSheetSource {
    client: reqwest::blocking::Client,
    url: Url,
    id: String,
}

impl HttpSheetSource {
    pub fn new(sheet: &SheetConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pressroom/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: sheet::sheet_url(sheet)?,
            id: sheet.id.trim().to_string(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SheetSource for HttpSheetSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&self) -> Result<String, FetchError> {
        let response = self.client.get(self.url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

/// Drop rows without a numeric position and sort the rest by it.
///
/// The sort is stable, so rows sharing a position keep sheet order.
pub fn prepare_rows(rows: Vec<Row>) -> Vec<Row> {
    let mut keyed: Vec<(f64, Row)> = rows
        .into_iter()
        .filter_map(|row| match row.position() {
            Some(p) => Some((p, row)),
            None => {
                if row.get("position").is_some() {
                    tracing::warn!(
                        position = row.text("position"),
                        "row position is not a number, row skipped"
                    );
                }
                None
            }
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Load rows, preferring a fresh cache entry over the network.
pub fn load(source: &impl SheetSource, cache: &RowCache) -> Result<Vec<Row>, IngestError> {
    if let Some(rows) = cache.get() {
        tracing::debug!(rows = rows.len(), path = %cache.path().display(), "row cache hit");
        return Ok(rows);
    }
    tracing::debug!(source = source.id(), "row cache miss, fetching sheet");

    let body = source.fetch()?;
    let rows = prepare_rows(sheet::parse_table(&body)?);

    if let Err(e) = cache.put(&rows) {
        tracing::warn!(error = %e, "could not write row cache");
    }
    Ok(rows)
}
