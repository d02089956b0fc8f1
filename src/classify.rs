//! Row → tile classification.
//!
//! Each row declares its tile variant in the `typ` column:
//!
//! | `typ` | Tile | Needs |
//! |---|---|---|
//! | `bild` / `image` | [`TileKind::Image`] | at least one `bild_url*` |
//! | `zitat` / `quote` | [`TileKind::Quote`] | `zitat_de` or `zitat_en` |
//! | `video` | [`TileKind::Video`] | `link` |
//!
//! Anything else is logged and skipped. Rows that lack what their variant
//! needs are skipped too, so a half-filled sheet row never renders an empty
//! frame.
//!
//! Link rewriting happens here so the renderer only ever sees URLs a
//! browser can load directly:
//!
//! - file-sharing links `…/d/{id}/view` → `https://lh3.googleusercontent.com/d/{id}`
//! - `watch?v={id}` and `youtu.be/{id}` → `https://www.youtube.com/embed/{id}`

use crate::gallery::GalleryTarget;
use crate::types::{Column, Row};

/// Highest numbered image column read from a row (`bild_url_2` … `bild_url_10`).
pub const MAX_IMAGE_COLUMN: usize = 10;

const DRIVE_IMAGE_BASE: &str = "https://lh3.googleusercontent.com/d/";
const VIDEO_EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// One rendered unit, derived from exactly one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Position of the source row in the sorted row list. Used for the
    /// gallery group id.
    pub index: usize,
    pub position: Option<f64>,
    pub column: Column,
    pub caption: Caption,
    pub kind: TileKind,
}

/// Caption shared by image and video tiles. Quote tiles only use `medium`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caption {
    pub medium: String,
    pub title_de: String,
    pub title_en: String,
    /// Free-text date, already formatted.
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileKind {
    Image(ImageTile),
    Quote(QuoteTile),
    Video(VideoTile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageTile {
    /// Gallery in sheet order, never empty. The first entry is the tile image.
    pub images: Vec<String>,
    pub popup_link: Option<String>,
    /// Second image, shown next to the article in the article modal.
    pub screenshot: Option<String>,
}

impl ImageTile {
    pub fn main_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTile {
    pub text_de: Option<String>,
    pub text_en: Option<String>,
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoTile {
    pub embed_url: String,
    pub title: String,
}

impl Tile {
    pub fn is_quote(&self) -> bool {
        matches!(self.kind, TileKind::Quote(_))
    }

    /// Synthetic group id tying a tile to its gallery.
    pub fn group_id(&self) -> String {
        format!("gallery-{}", self.index)
    }

    /// The click-planning view of an image tile. `None` for other variants.
    pub fn gallery_target(&self) -> Option<GalleryTarget<'_>> {
        let TileKind::Image(image) = &self.kind else {
            return None;
        };
        Some(GalleryTarget {
            images: &image.images,
            main_image: image.images.first().map(String::as_str),
            popup_link: image.popup_link.as_deref(),
            screenshot: image.screenshot.as_deref(),
            medium: &self.caption.medium,
            title: &self.caption.title_de,
            position: self.position,
        })
    }
}

/// Maps rows to tiles.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    /// Attribution for quotes without a medium.
    pub quote_author: String,
}

impl Classifier {
    pub fn new(quote_author: impl Into<String>) -> Self {
        Self {
            quote_author: quote_author.into(),
        }
    }

    /// Classify one row. `None` means the row renders nothing.
    pub fn classify(&self, row: &Row, index: usize) -> Option<Tile> {
        let typ = row.text("typ").to_lowercase();
        let kind = match typ.as_str() {
            "bild" | "image" => image_tile(row)?,
            "zitat" | "quote" => self.quote_tile(row)?,
            "video" => video_tile(row)?,
            other => {
                tracing::warn!(typ = other, position = row.text("position"), "unknown tile type");
                return None;
            }
        };

        Some(Tile {
            index,
            position: row.position(),
            column: Column::from_field(row.text("spalte")),
            caption: Caption {
                medium: row.text("medium").to_string(),
                title_de: row.text("titel_de").to_string(),
                title_en: row.text("titel_en").to_string(),
                date: format_date(row.text("datum")),
            },
            kind,
        })
    }

    /// Classify all rows, keeping each row's index.
    pub fn classify_all(&self, rows: &[Row]) -> Vec<Tile> {
        rows.iter()
            .enumerate()
            .filter_map(|(i, row)| self.classify(row, i))
            .collect()
    }

    fn quote_tile(&self, row: &Row) -> Option<TileKind> {
        let text_de = row.get("zitat_de").map(|s| s.trim().to_string());
        let text_en = row.get("zitat_en").map(|s| s.trim().to_string());
        if text_de.is_none() && text_en.is_none() {
            tracing::warn!(position = row.text("position"), "quote row without text, skipped");
            return None;
        }
        let attribution = match row.get("medium") {
            Some(medium) => medium.trim().to_string(),
            None => self.quote_author.clone(),
        };
        Some(TileKind::Quote(QuoteTile {
            text_de,
            text_en,
            attribution,
        }))
    }
}

fn image_tile(row: &Row) -> Option<TileKind> {
    let images = image_urls(row);
    if images.is_empty() {
        tracing::debug!(position = row.text("position"), "image row without URLs, skipped");
        return None;
    }
    let screenshot = images.get(1).cloned();
    Some(TileKind::Image(ImageTile {
        popup_link: row.get("link").map(|s| s.trim().to_string()),
        screenshot,
        images,
    }))
}

fn video_tile(row: &Row) -> Option<TileKind> {
    let Some(link) = row.get("link") else {
        tracing::warn!(position = row.text("position"), "video row without link, skipped");
        return None;
    };
    let title = match row.get("titel_de") {
        Some(t) => t.trim().to_string(),
        None => "Video".to_string(),
    };
    Some(TileKind::Video(VideoTile {
        embed_url: youtube_embed_url(link.trim()),
        title,
    }))
}

/// Ordered image URLs of a row, with file-sharing links rewritten.
///
/// Reads `bild_url` (or `bild_url_1`), then `bild_url_2` through
/// `bild_url_10`; blank cells are skipped.
pub fn image_urls(row: &Row) -> Vec<String> {
    let main = row.first_of(&["bild_url", "bild_url_1"]);
    let rest = (2..=MAX_IMAGE_COLUMN).filter_map(|i| row.get(&format!("bild_url_{i}")));
    main.into_iter()
        .chain(rest)
        .map(|url| drive_image_url(url.trim()))
        .collect()
}

/// File id from a `/d/{id}` path segment.
pub fn drive_file_id(url: &str) -> Option<&str> {
    let start = url.find("/d/")? + 3;
    id_prefix(&url[start..])
}

/// Direct-view URL for a file-sharing link; other URLs pass through.
pub fn drive_image_url(url: &str) -> String {
    match drive_file_id(url) {
        Some(id) => format!("{DRIVE_IMAGE_BASE}{id}"),
        None => url.to_string(),
    }
}

/// Video id from a `watch?v=` or `youtu.be/` link. The short form wins when
/// both appear.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    if let Some(i) = url.find("youtu.be/")
        && let Some(id) = id_prefix(&url[i + "youtu.be/".len()..])
    {
        return Some(id);
    }
    ["?v=", "&v="]
        .iter()
        .filter_map(|marker| url.find(marker).map(|i| &url[i + marker.len()..]))
        .find_map(id_prefix)
}

/// Embeddable URL for a video link; unrecognized links pass through.
pub fn youtube_embed_url(url: &str) -> String {
    match youtube_video_id(url) {
        Some(id) => format!("{VIDEO_EMBED_BASE}{id}"),
        None => url.to_string(),
    }
}

/// The sheet's machine date format (`Date(2023,0,1)`) renders as empty;
/// editors are expected to type free text like "Sommer 2022".
pub fn format_date(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("Date(") {
        String::new()
    } else {
        value.to_string()
    }
}

/// Leading run of `[A-Za-z0-9_-]`, if non-empty.
fn id_prefix(s: &str) -> Option<&str> {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}
