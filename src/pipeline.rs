//! Stage orchestration for the CLI commands.
//!
//! ```text
//! fetch     sheet (or cache)  →  {temp}/rows.json
//! generate  rows.json         →  {output}/index.html
//! build     fetch + generate; no rows or a failed fetch keeps the static page
//! reload    clear cache entry + build
//! check     fetch + classify + layout, nothing written but rows.json
//! ```
//!
//! Every stage takes its sheet source as a parameter (`*_with`), so tests
//! run the whole pipeline against canned responses.

use crate::cache::RowCache;
use crate::config::SiteConfig;
use crate::generate::{self, GenerateError, ROWS_FILE, RenderOutcome, RenderSummary};
use crate::ingest::{self, FetchError, HttpSheetSource, IngestError, SheetSource};
use crate::layout::Columns;
use crate::types::Row;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no spreadsheet configured (set [sheet] id in config.toml)")]
    NotConfigured,
    #[error("the sheet has no rows with a position")]
    NoRows,
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FetchError> for PipelineError {
    fn from(e: FetchError) -> Self {
        PipelineError::Ingest(IngestError::Fetch(e))
    }
}

/// Result of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Rendered(RenderSummary),
    /// Rows were fetched but the page had no containers.
    Skipped,
    /// Ingestion failed or found no rows; the static page was kept.
    Fallback { reason: String, wrote_shell: bool },
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub template: Option<PathBuf>,
    pub config: SiteConfig,
}

impl Pipeline {
    pub fn rows_path(&self) -> PathBuf {
        self.temp_dir.join(ROWS_FILE)
    }

    pub fn row_cache(&self) -> RowCache {
        RowCache::new(
            &self.temp_dir,
            &self.config.cache.key_prefix,
            self.config.sheet.id.trim(),
            self.config.cache.ttl(),
        )
    }

    fn http_source(&self) -> Result<HttpSheetSource, PipelineError> {
        if !self.config.sheet_configured() {
            return Err(PipelineError::NotConfigured);
        }
        Ok(HttpSheetSource::new(&self.config.sheet)?)
    }

    fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    pub fn fetch(&self) -> Result<Vec<Row>, PipelineError> {
        self.fetch_with(&self.http_source()?)
    }

    /// Ingest rows and write them to `rows.json`.
    pub fn fetch_with(&self, source: &impl SheetSource) -> Result<Vec<Row>, PipelineError> {
        let rows = ingest::load(source, &self.row_cache())?;
        fs::create_dir_all(&self.temp_dir)?;
        fs::write(self.rows_path(), serde_json::to_string_pretty(&rows)?)?;
        Ok(rows)
    }

    pub fn generate(&self) -> Result<RenderOutcome, PipelineError> {
        Ok(generate::generate(
            &self.rows_path(),
            &self.output_dir,
            self.template(),
            &self.config,
        )?)
    }

    pub fn build(&self) -> Result<BuildOutcome, PipelineError> {
        match self.http_source() {
            Ok(source) => self.build_with(&source),
            Err(PipelineError::NotConfigured) => self.fall_back(PipelineError::NotConfigured),
            Err(e) => Err(e),
        }
    }

    /// Fetch and generate. A failed ingestion, or one without any usable
    /// row, is logged and turns into [`BuildOutcome::Fallback`]; other
    /// errors propagate.
    pub fn build_with(&self, source: &impl SheetSource) -> Result<BuildOutcome, PipelineError> {
        match self.fetch_with(source) {
            Ok(rows) if rows.is_empty() => return self.fall_back(PipelineError::NoRows),
            Ok(_) => {}
            Err(e @ PipelineError::Ingest(_)) => return self.fall_back(e),
            Err(e) => return Err(e),
        }
        match self.generate()? {
            RenderOutcome::Rendered(summary) => Ok(BuildOutcome::Rendered(summary)),
            RenderOutcome::Skipped => Ok(BuildOutcome::Skipped),
        }
    }

    fn fall_back(&self, reason: PipelineError) -> Result<BuildOutcome, PipelineError> {
        tracing::error!(error = %reason, "no rows, keeping the static page");
        let wrote_shell =
            generate::write_fallback(&self.output_dir, self.template(), &self.config.site)?;
        Ok(BuildOutcome::Fallback {
            reason: reason.to_string(),
            wrote_shell,
        })
    }

    pub fn reload(&self) -> Result<BuildOutcome, PipelineError> {
        self.clear_cache()?;
        self.build()
    }

    /// Drop the cache entry, then build.
    pub fn reload_with(&self, source: &impl SheetSource) -> Result<BuildOutcome, PipelineError> {
        self.clear_cache()?;
        self.build_with(source)
    }

    fn clear_cache(&self) -> Result<(), PipelineError> {
        let cache = self.row_cache();
        cache.clear()?;
        tracing::info!(path = %cache.path().display(), "row cache cleared");
        Ok(())
    }

    pub fn check(&self) -> Result<Columns, PipelineError> {
        self.check_with(&self.http_source()?)
    }

    /// Fetch, classify and lay out without touching the output page.
    pub fn check_with(&self, source: &impl SheetSource) -> Result<Columns, PipelineError> {
        let rows = self.fetch_with(source)?;
        Ok(generate::build_columns(&rows, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::INDEX_FILE;
    use crate::ingest::tests::StaticSource;
    use crate::sheet::tests::wrap;
    use tempfile::TempDir;

    fn pipeline(tmp: &TempDir) -> Pipeline {
        let mut config = SiteConfig::default();
        config.sheet.id = "SHEET".into();
        Pipeline {
            source_dir: tmp.path().to_path_buf(),
            output_dir: tmp.path().join("dist"),
            temp_dir: tmp.path().join(".pressroom-temp"),
            template: None,
            config,
        }
    }

    fn body() -> String {
        wrap(
            r#"{"cols":[{"label":"Position"},{"label":"Typ"},{"label":"Spalte"},{"label":"Bild-URL"},{"label":"Zitat DE"}],
                "rows":[
                  {"c":[{"v":3},{"v":"bild"},{"v":"rechts"},{"v":"https://c"},null]},
                  {"c":[{"v":1},{"v":"bild"},{"v":"links"},{"v":"https://drive.google.com/file/d/ABC/view"},null]},
                  {"c":[{"v":2},{"v":"zitat"},{"v":"rechts"},null,{"v":"X"}]}
                ]}"#,
        )
    }

    #[test]
    fn fetch_writes_sorted_rows() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        let rows = p.fetch_with(&StaticSource::ok(body())).unwrap();
        assert_eq!(rows.len(), 3);

        let written: Vec<Row> =
            serde_json::from_str(&fs::read_to_string(p.rows_path()).unwrap()).unwrap();
        assert_eq!(written, rows);
        assert_eq!(written[0].text("position"), "1");
        assert_eq!(written[1].text("zitat_de"), "X");
    }

    #[test]
    fn build_renders_page() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        let outcome = p.build_with(&StaticSource::ok(body())).unwrap();
        let BuildOutcome::Rendered(summary) = outcome else {
            panic!("expected a render, got {outcome:?}");
        };
        assert_eq!((summary.left, summary.right), (1, 2));
        let html = fs::read_to_string(p.output_dir.join(INDEX_FILE)).unwrap();
        assert!(html.contains("https://lh3.googleusercontent.com/d/ABC"));
    }

    #[test]
    fn build_failure_writes_shell_once() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        let outcome = p.build_with(&StaticSource::failing(500)).unwrap();
        assert!(matches!(
            outcome,
            BuildOutcome::Fallback {
                wrote_shell: true,
                ..
            }
        ));
        assert!(p.output_dir.join(INDEX_FILE).exists());
    }

    #[test]
    fn build_failure_keeps_previous_page() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        p.build_with(&StaticSource::ok(body())).unwrap();
        let before = fs::read_to_string(p.output_dir.join(INDEX_FILE)).unwrap();

        // A new sheet id bypasses the cache entry of the first build.
        let mut p2 = p.clone();
        p2.config.sheet.id = "OTHER".into();
        let outcome = p2.build_with(&StaticSource::failing(404)).unwrap();
        assert!(matches!(
            outcome,
            BuildOutcome::Fallback {
                wrote_shell: false,
                ..
            }
        ));
        let after = fs::read_to_string(p.output_dir.join(INDEX_FILE)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn build_without_positioned_rows_keeps_template_content() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("press.html");
        fs::write(
            &template,
            r#"<html><body><div id="content-left"><p>STATIC LEFT</p></div><div id="content-right"><p>STATIC RIGHT</p></div></body></html>"#,
        )
        .unwrap();
        let mut p = pipeline(&tmp);
        p.template = Some(template);

        let unpositioned = wrap(
            r#"{"cols":[{"label":"Position"},{"label":"Typ"},{"label":"Bild-URL"}],
                "rows":[{"c":[null,{"v":"bild"},{"v":"https://a"}]}]}"#,
        );
        let outcome = p.build_with(&StaticSource::ok(unpositioned)).unwrap();

        let BuildOutcome::Fallback { reason, wrote_shell } = outcome else {
            panic!("expected a fallback, got {outcome:?}");
        };
        assert_eq!(reason, PipelineError::NoRows.to_string());
        assert!(wrote_shell);
        let html = fs::read_to_string(p.output_dir.join(INDEX_FILE)).unwrap();
        assert!(html.contains("<p>STATIC LEFT</p>"));
        assert!(html.contains("<p>STATIC RIGHT</p>"));
    }

    #[test]
    fn empty_sheet_keeps_previous_page() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        p.build_with(&StaticSource::ok(body())).unwrap();
        let before = fs::read_to_string(p.output_dir.join(INDEX_FILE)).unwrap();

        let mut p2 = p.clone();
        p2.config.sheet.id = "EMPTY".into();
        let empty = wrap(r#"{"cols":[{"label":"Position"},{"label":"Typ"}],"rows":[]}"#);
        let outcome = p2.build_with(&StaticSource::ok(empty)).unwrap();

        assert!(matches!(
            outcome,
            BuildOutcome::Fallback {
                wrote_shell: false,
                ..
            }
        ));
        assert_eq!(fs::read_to_string(p.output_dir.join(INDEX_FILE)).unwrap(), before);
    }

    #[test]
    fn second_build_uses_cache() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        let source = StaticSource::ok(body());
        p.build_with(&source).unwrap();
        p.build_with(&source).unwrap();
        assert_eq!(source.fetches.get(), 1);
    }

    #[test]
    fn reload_bypasses_cache() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        let source = StaticSource::ok(body());
        p.build_with(&source).unwrap();
        p.reload_with(&source).unwrap();
        assert_eq!(source.fetches.get(), 2);
    }

    #[test]
    fn unconfigured_build_falls_back() {
        let tmp = TempDir::new().unwrap();
        let mut p = pipeline(&tmp);
        p.config.sheet.id = String::new();
        let outcome = p.build().unwrap();
        assert!(matches!(outcome, BuildOutcome::Fallback { .. }));
        assert!(matches!(p.fetch(), Err(PipelineError::NotConfigured)));
    }

    #[test]
    fn check_lays_out_without_output() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp);
        let columns = p.check_with(&StaticSource::ok(body())).unwrap();
        assert_eq!(columns.left.len(), 1);
        assert_eq!(columns.right.len(), 2);
        assert!(!p.output_dir.exists());
    }
}
