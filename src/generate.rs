//! Press page generation.
//!
//! Second stage of the pressroom pipeline. Reads the rows written by the
//! fetch stage, classifies and lays them out, renders each column with maud
//! and inserts the columns into the page through the [`Surface`] port.
//!
//! ## The page
//!
//! The page is either the stock shell ([`render_shell`]) or a user template
//! passed with `--template`. Either way it must contain the two containers
//! `content-left` and `content-right`; a page without them is logged and left
//! alone. The modal elements are only needed by the shipped script, which
//! checks for them before opening anything.
//!
//! ## Tile markup
//!
//! ```text
//! article.tile.tile-image  style="--mobile-order:N"
//! └── div.tile-media
//!     └── div.press-image-wrapper  data-action='{"kind":"spread",...}'
//!         ├── img
//!         └── span.zoom-hint.lang-de / .lang-en
//! └── div.tile-text  (medium, titles, date)
//! ```
//!
//! Both languages are always emitted; the body class `lang-de`/`lang-en`
//! decides which is visible. The click decision of every image tile is made
//! here ([`plan_click`]) and serialized into `data-action`, so the script
//! only executes it.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: two-column layout, mobile reflow, modals
//! - `static/press.js`: modal state machine, keyboard and backdrop handling

use crate::classify::{Caption, Classifier, ImageTile, QuoteTile, Tile, TileKind, VideoTile};
use crate::config::{PageConfig, SiteConfig};
use crate::gallery::{ExceptionRules, ModalKind, plan_click};
use crate::layout::{self, Columns, PlacedTile};
use crate::page::{HtmlPage, Surface};
use crate::types::{Column, Row};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Hand-off file between the fetch and generate stages.
pub const ROWS_FILE: &str = "rows.json";
/// The generated page inside the output directory.
pub const INDEX_FILE: &str = "index.html";

const CSS: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/press.js");

const VIDEO_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counts reported after a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub rows: usize,
    pub left: usize,
    pub right: usize,
    pub output: PathBuf,
}

impl RenderSummary {
    pub fn tiles(&self) -> usize {
        self.left + self.right
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderSummary),
    /// The page had no tile containers; nothing was written.
    Skipped,
}

/// Read the rows written by the fetch stage.
pub fn load_rows(path: &Path) -> Result<Vec<Row>, GenerateError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Classify and lay out rows.
pub fn build_columns(rows: &[Row], config: &SiteConfig) -> Columns {
    let classifier = Classifier::new(config.site.quote_author.clone());
    layout::layout(classifier.classify_all(rows))
}

/// The page tiles are inserted into: the template if given, else the stock
/// shell.
pub fn base_page(template: Option<&Path>, site: &PageConfig) -> Result<HtmlPage, GenerateError> {
    match template {
        Some(path) => Ok(HtmlPage::new(fs::read_to_string(path)?)),
        None => Ok(HtmlPage::new(render_shell(site).into_string())),
    }
}

pub fn generate(
    rows_path: &Path,
    output_dir: &Path,
    template: Option<&Path>,
    config: &SiteConfig,
) -> Result<RenderOutcome, GenerateError> {
    let rows = load_rows(rows_path)?;
    let columns = build_columns(&rows, config);
    let mut page = base_page(template, &config.site)?;

    if !render_into(&mut page, &columns, &config.gallery.rules()) {
        return Ok(RenderOutcome::Skipped);
    }

    fs::create_dir_all(output_dir)?;
    let output = output_dir.join(INDEX_FILE);
    fs::write(&output, page.into_string())?;

    Ok(RenderOutcome::Rendered(RenderSummary {
        rows: rows.len(),
        left: columns.left.len(),
        right: columns.right.len(),
        output,
    }))
}

/// Leave the static page in place after a failed ingestion.
///
/// An existing output page is kept as is. Without one, the unmodified base
/// page is written so the site still has a press page. Returns whether a
/// file was written.
pub fn write_fallback(
    output_dir: &Path,
    template: Option<&Path>,
    site: &PageConfig,
) -> Result<bool, GenerateError> {
    let output = output_dir.join(INDEX_FILE);
    if output.exists() {
        return Ok(false);
    }
    let page = base_page(template, site)?;
    fs::create_dir_all(output_dir)?;
    fs::write(&output, page.into_string())?;
    Ok(true)
}

/// Insert both columns into the page.
///
/// Returns `false`, after logging, when a container is missing. The page is
/// not modified in that case.
pub fn render_into(surface: &mut impl Surface, columns: &Columns, rules: &ExceptionRules) -> bool {
    let missing: Vec<&str> = [Column::Left, Column::Right]
        .into_iter()
        .map(Column::container_id)
        .filter(|id| !surface.has_element(id))
        .collect();
    if !missing.is_empty() {
        tracing::error!(?missing, "page has no tile containers, render skipped");
        return false;
    }

    let missing_modal: Vec<&str> = [ModalKind::Lightbox, ModalKind::Spread, ModalKind::Article]
        .into_iter()
        .flat_map(|kind| kind.required_elements().iter().copied())
        .filter(|id| !surface.has_element(id))
        .collect();
    if !missing_modal.is_empty() {
        tracing::warn!(missing = ?missing_modal, "page lacks modal elements, those modals will not open");
    }

    for column in [Column::Left, Column::Right] {
        let markup = render_column(columns.column(column), rules);
        surface.set_inner_html(column.container_id(), &markup.into_string());
    }
    true
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders one column's tiles in order.
pub fn render_column(tiles: &[PlacedTile], rules: &ExceptionRules) -> Markup {
    html! {
        @for placed in tiles {
            (render_tile(placed, rules))
        }
    }
}

pub fn render_tile(placed: &PlacedTile, rules: &ExceptionRules) -> Markup {
    let tile = &placed.tile;
    let order = format!("--mobile-order:{}", placed.mobile_order);
    match &tile.kind {
        TileKind::Image(image) => render_image_tile(tile, image, &order, rules),
        TileKind::Quote(quote) => render_quote_tile(quote, &order),
        TileKind::Video(video) => render_video_tile(&tile.caption, video, &order),
    }
}

fn render_image_tile(tile: &Tile, image: &ImageTile, order: &str, rules: &ExceptionRules) -> Markup {
    let main = image.main_image();
    // Serializing plain strings into JSON cannot fail.
    let gallery = serde_json::to_string(&image.images).unwrap_or_default();
    let action = tile
        .gallery_target()
        .map(|target| plan_click(&target, rules))
        .and_then(|action| serde_json::to_string(&action).ok())
        .unwrap_or_default();
    let has_popup = image.popup_link.is_some();

    html! {
        article.tile.tile-image data-date=(tile.caption.date) style=(order) {
            div.tile-media {
                div.press-image-wrapper
                    role="button"
                    tabindex="0"
                    data-full=(main)
                    data-gallery=(gallery)
                    data-group=(tile.group_id())
                    data-medium=(tile.caption.medium)
                    data-titel=(tile.caption.title_de)
                    data-popup-link=[image.popup_link.as_deref()]
                    data-screenshot=[image.screenshot.as_deref()]
                    data-action=(action)
                {
                    img src=(main) loading="lazy" decoding="async" alt=(tile.caption.title_de);
                    span.zoom-hint.lang-de {
                        @if has_popup { "Klick für mehr Info" } @else { "Klick zum Vergrößern" }
                    }
                    span.zoom-hint.lang-en {
                        @if has_popup { "Click for more info" } @else { "Click to enlarge" }
                    }
                }
            }
            (render_caption(&tile.caption))
        }
    }
}

fn render_quote_tile(quote: &QuoteTile, order: &str) -> Markup {
    html! {
        article.tile.tile-quote style=(order) {
            @if let Some(text) = &quote.text_de {
                blockquote.lang-de { (text) }
            }
            @if let Some(text) = &quote.text_en {
                blockquote.lang-en { (text) }
            }
            @if !quote.attribution.is_empty() {
                p.quote-meta { "– " (quote.attribution) }
            }
        }
    }
}

fn render_video_tile(caption: &Caption, video: &VideoTile, order: &str) -> Markup {
    html! {
        article.tile.tile-video style=(order) {
            div.tile-media {
                div.video-wrapper {
                    iframe
                        src=(video.embed_url)
                        title=(video.title)
                        frameborder="0"
                        allow=(VIDEO_ALLOW)
                        allowfullscreen {}
                }
            }
            (render_caption(caption))
        }
    }
}

fn render_caption(caption: &Caption) -> Markup {
    html! {
        div.tile-text {
            @if !caption.medium.is_empty() {
                span.tile-medium { (caption.medium) }
            }
            @if !caption.title_de.is_empty() {
                h3.tile-title.lang-de { (caption.title_de) }
            }
            @if !caption.title_en.is_empty() {
                h3.tile-title.lang-en { (caption.title_en) }
            }
            @if !caption.date.is_empty() {
                p.tile-date { (caption.date) }
            }
        }
    }
}

/// Renders the stock page shell with empty containers and all modals.
pub fn render_shell(site: &PageConfig) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (site.title) }
                style { (PreEscaped(CSS)) }
            }
            body class=(format!("lang-{}", site.lang)) {
                header.press-header {
                    h1 { (site.title) }
                    nav.lang-switch {
                        button type="button" data-lang="de" { "DE" }
                        button type="button" data-lang="en" { "EN" }
                    }
                }
                main.press-columns {
                    div id="content-left" class="press-column" {}
                    div id="content-right" class="press-column" {}
                }
                (render_modals())
                script { (PreEscaped(JS)) }
            }
        }
    }
}

fn render_modals() -> Markup {
    html! {
        div id="lightbox" class="modal lightbox" data-modal="lightbox" hidden {
            button.lightbox-close.modal-close type="button" aria-label="Close" { "×" }
            button.lightbox-prev type="button" aria-label="Previous" { "‹" }
            img id="lightbox-img" alt="";
            button.lightbox-next type="button" aria-label="Next" { "›" }
            a id="lightbox-link" class="lightbox-link" target="_blank" rel="noopener" {
                span.lang-de { "Original öffnen" }
                span.lang-en { "Open original" }
            }
        }
        div id="spread-modal" class="modal spread-modal" data-modal="spread" hidden {
            button.spread-modal-close.modal-close type="button" aria-label="Close" { "×" }
            div.spread-pages {
                img id="spread-img-left" alt="";
                img id="spread-img-right" alt="";
            }
            a id="spread-zoom-link" class="spread-zoom-link" target="_blank" rel="noopener" {
                span.lang-de { "Vergrößern" }
                span.lang-en { "Zoom" }
            }
        }
        div id="article-modal" class="modal article-modal" data-modal="article" hidden {
            button.article-modal-close.modal-close type="button" aria-label="Close" { "×" }
            div.article-body {
                iframe id="article-iframe" title="Article" {}
                img id="article-screenshot" alt="";
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::SpreadBehavior;
    use tempfile::TempDir;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row(&[
                ("position", "1"),
                ("typ", "bild"),
                ("bild_url", "https://drive.google.com/file/d/ABC/view"),
                ("spalte", "links"),
            ]),
            row(&[
                ("position", "2"),
                ("typ", "zitat"),
                ("zitat_de", "X"),
                ("spalte", "rechts"),
            ]),
            row(&[
                ("position", "3"),
                ("typ", "bild"),
                ("bild_url", "https://cdn.example/3.jpg"),
                ("spalte", "rechts"),
            ]),
        ]
    }

    fn write_rows(dir: &Path, rows: &[Row]) -> PathBuf {
        let path = dir.join(ROWS_FILE);
        fs::write(&path, serde_json::to_string(rows).unwrap()).unwrap();
        path
    }

    fn placed(row_pairs: &[(&str, &str)], mobile_order: usize) -> PlacedTile {
        PlacedTile {
            tile: Classifier::new("Jane Doe").classify(&row(row_pairs), 3).unwrap(),
            mobile_order,
        }
    }

    #[test]
    fn shell_has_containers_and_modals() {
        let page = HtmlPage::new(render_shell(&PageConfig::default()).into_string());
        assert!(page.as_str().starts_with("<!DOCTYPE html>"));
        for id in ["content-left", "content-right"] {
            assert!(page.has_element(id), "missing {id}");
        }
        for kind in [ModalKind::Lightbox, ModalKind::Spread, ModalKind::Article] {
            for id in kind.required_elements() {
                assert!(page.has_element(id), "missing {id}");
            }
        }
        assert!(page.has_element("lightbox-link"));
        assert!(page.has_element("spread-zoom-link"));
    }

    #[test]
    fn shell_uses_configured_language_and_title() {
        let site = PageConfig {
            title: "Presse".into(),
            lang: "en".into(),
            quote_author: String::new(),
        };
        let html = render_shell(&site).into_string();
        assert!(html.contains(r#"<body class="lang-en">"#));
        assert!(html.contains("<title>Presse</title>"));
    }

    #[test]
    fn image_tile_markup() {
        let tile = placed(
            &[
                ("typ", "bild"),
                ("bild_url", "https://a"),
                ("bild_url_2", "https://b"),
                ("medium", "Vogue"),
                ("titel_de", "Titel"),
                ("datum", "Date(2023,0,1)"),
            ],
            5,
        );
        let html = render_tile(&tile, &ExceptionRules::default()).into_string();
        assert!(html.contains(r#"class="tile tile-image""#));
        assert!(html.contains(r#"style="--mobile-order:5""#));
        assert!(html.contains(r#"data-full="https://a""#));
        assert!(html.contains(r#"data-group="gallery-3""#));
        assert!(html.contains(r#"data-screenshot="https://b""#));
        assert!(!html.contains("data-popup-link"));
        assert!(html.contains("Klick zum Vergrößern"));
        assert!(html.contains("Click to enlarge"));
        assert!(html.contains(r#"<span class="tile-medium">Vogue</span>"#));
        assert!(!html.contains("tile-date"));
        // Default spread, first image left
        assert!(html.contains(
            "&quot;kind&quot;:&quot;spread&quot;,&quot;left&quot;:&quot;https://a&quot;,&quot;right&quot;:&quot;https://b&quot;"
        ));
    }

    #[test]
    fn image_tile_with_swap_rule() {
        let mut rules = ExceptionRules::default();
        rules.add_publication("Working Women", SpreadBehavior::Swap);
        let tile = placed(
            &[
                ("typ", "bild"),
                ("bild_url", "https://a"),
                ("bild_url_2", "https://b"),
                ("medium", "working women"),
            ],
            1,
        );
        let html = render_tile(&tile, &rules).into_string();
        assert!(html.contains("&quot;left&quot;:&quot;https://b&quot;,&quot;right&quot;:&quot;https://a&quot;"));
    }

    #[test]
    fn image_tile_with_popup_link() {
        let tile = placed(
            &[("typ", "bild"), ("bild_url", "https://a"), ("link", "https://article")],
            1,
        );
        let html = render_tile(&tile, &ExceptionRules::default()).into_string();
        assert!(html.contains(r#"data-popup-link="https://article""#));
        assert!(html.contains("Klick für mehr Info"));
        assert!(html.contains("Click for more info"));
        assert!(html.contains("&quot;kind&quot;:&quot;external&quot;"));
    }

    #[test]
    fn quote_tile_markup() {
        let tile = placed(&[("typ", "zitat"), ("zitat_de", "Gut"), ("zitat_en", "Good")], 2);
        let html = render_tile(&tile, &ExceptionRules::default()).into_string();
        assert!(html.contains(r#"<blockquote class="lang-de">Gut</blockquote>"#));
        assert!(html.contains(r#"<blockquote class="lang-en">Good</blockquote>"#));
        assert!(html.contains(r#"<p class="quote-meta">– Jane Doe</p>"#));
    }

    #[test]
    fn video_tile_markup() {
        let tile = placed(
            &[("typ", "video"), ("link", "https://youtu.be/abc"), ("titel_en", "Film")],
            4,
        );
        let html = render_tile(&tile, &ExceptionRules::default()).into_string();
        assert!(html.contains(r#"src="https://www.youtube.com/embed/abc""#));
        assert!(html.contains(r#"title="Video""#));
        assert!(html.contains("allowfullscreen"));
        assert!(html.contains(r#"<h3 class="tile-title lang-en">Film</h3>"#));
    }

    #[test]
    fn text_is_escaped() {
        let tile = placed(&[("typ", "zitat"), ("zitat_de", "<script>x</script>")], 1);
        let html = render_tile(&tile, &ExceptionRules::default()).into_string();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>x"));
    }

    #[test]
    fn render_into_missing_container_leaves_page() {
        let original = r#"<div id="content-left"></div>"#;
        let mut page = HtmlPage::new(original);
        let columns = layout::layout(vec![]);
        assert!(!render_into(&mut page, &columns, &ExceptionRules::default()));
        assert_eq!(page.as_str(), original);
    }

    #[test]
    fn generate_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let rows_path = write_rows(tmp.path(), &sample_rows());
        let out = tmp.path().join("dist");

        let outcome = generate(&rows_path, &out, None, &SiteConfig::default()).unwrap();
        let RenderOutcome::Rendered(summary) = outcome else {
            panic!("expected a render");
        };
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.left, 1);
        assert_eq!(summary.right, 2);
        assert_eq!(summary.tiles(), 3);

        let page = HtmlPage::new(fs::read_to_string(out.join(INDEX_FILE)).unwrap());
        let left = page.inner_html("content-left").unwrap();
        let right = page.inner_html("content-right").unwrap();
        assert!(left.contains(r#"data-full="https://lh3.googleusercontent.com/d/ABC""#));
        assert!(right.contains(r#"<blockquote class="lang-de">X</blockquote>"#));
        assert!(right.contains(r#"<p class="quote-meta">– Kerstin Geffert</p>"#));
        assert!(right.contains(r#"data-full="https://cdn.example/3.jpg""#));
        let quote_at = right.find("tile-quote").unwrap();
        let image_at = right.find("tile-image").unwrap();
        assert!(quote_at < image_at);
    }

    #[test]
    fn generate_applies_stock_spread_rules() {
        let tmp = TempDir::new().unwrap();
        let rows = vec![
            row(&[
                ("position", "1"),
                ("typ", "bild"),
                ("medium", "Freundin"),
                ("bild_url", "https://f1"),
                ("bild_url_2", "https://f2"),
            ]),
            row(&[
                ("position", "2"),
                ("typ", "bild"),
                ("medium", "Maxi"),
                ("bild_url", "https://m1"),
                ("bild_url_2", "https://m2"),
            ]),
        ];
        let rows_path = write_rows(tmp.path(), &rows);
        let out = tmp.path().join("dist");

        generate(&rows_path, &out, None, &SiteConfig::default()).unwrap();
        let html = fs::read_to_string(out.join(INDEX_FILE)).unwrap();
        assert!(html.contains(
            "&quot;kind&quot;:&quot;spread&quot;,&quot;left&quot;:&quot;https://f2&quot;,&quot;right&quot;:&quot;https://f1&quot;"
        ));
        assert!(html.contains("&quot;kind&quot;:&quot;cover_then_spread&quot;,&quot;cover&quot;:&quot;https://m1&quot;"));
    }

    #[test]
    fn generate_with_template_keeps_surroundings() {
        let tmp = TempDir::new().unwrap();
        let rows_path = write_rows(tmp.path(), &sample_rows());
        let template = tmp.path().join("press.html");
        fs::write(
            &template,
            r#"<html><body><nav>Site nav</nav><div id="content-left">old</div><div id="content-right">old</div></body></html>"#,
        )
        .unwrap();
        let out = tmp.path().join("dist");

        generate(&rows_path, &out, Some(&template), &SiteConfig::default()).unwrap();
        let html = fs::read_to_string(out.join(INDEX_FILE)).unwrap();
        assert!(html.contains("<nav>Site nav</nav>"));
        assert!(!html.contains(">old<"));
    }

    #[test]
    fn generate_skips_template_without_containers() {
        let tmp = TempDir::new().unwrap();
        let rows_path = write_rows(tmp.path(), &sample_rows());
        let template = tmp.path().join("press.html");
        fs::write(&template, "<html><body><p>static</p></body></html>").unwrap();
        let out = tmp.path().join("dist");

        let outcome = generate(&rows_path, &out, Some(&template), &SiteConfig::default()).unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped);
        assert!(!out.join(INDEX_FILE).exists());
    }

    #[test]
    fn generate_missing_rows_errors() {
        let tmp = TempDir::new().unwrap();
        let result = generate(
            &tmp.path().join(ROWS_FILE),
            tmp.path(),
            None,
            &SiteConfig::default(),
        );
        assert!(matches!(result, Err(GenerateError::Io(_))));
    }

    #[test]
    fn fallback_keeps_existing_page() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(INDEX_FILE), "previous build").unwrap();
        assert!(!write_fallback(tmp.path(), None, &PageConfig::default()).unwrap());
        assert_eq!(
            fs::read_to_string(tmp.path().join(INDEX_FILE)).unwrap(),
            "previous build"
        );
    }

    #[test]
    fn fallback_writes_unmodified_shell() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("dist");
        assert!(write_fallback(&out, None, &PageConfig::default()).unwrap());
        let page = HtmlPage::new(fs::read_to_string(out.join(INDEX_FILE)).unwrap());
        assert_eq!(page.inner_html("content-left"), Some(""));
        assert_eq!(page.inner_html("content-right"), Some(""));
    }
}
