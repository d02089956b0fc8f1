//! CLI output formatting for all commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every entity (row,
//! tile, image) leads with its positional index and what it *is*; sheet
//! positions, columns and file paths follow as indented context lines.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Rows (3)
//! 001 bild Vogue
//!     Position: 1, column: links
//! 002 zitat Die Zeit
//!     Position: 2, column: rechts
//! ```
//!
//! ## Check
//!
//! ```text
//! Left column (1 tile)
//! 001 image Vogue → spread
//! Right column (2 tiles)
//! 001 quote Die Zeit
//! 002 video Interview
//!
//! Mobile order
//!     001 left image Vogue
//!     002 right quote Die Zeit
//!     003 right video Interview
//! ```
//!
//! ## Optimize
//!
//! ```text
//! Images (2)
//! 001 interview (1600x1200)
//!     Source: interview.png
//!     Full: interview.avif
//!     Cover: interview_cover.avif (center)
//! 002 (broken.jpg) failed: Processing failed: ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::classify::{Tile, TileKind};
use crate::combine::CombineSummary;
use crate::gallery::{ClickAction, ExceptionRules, plan_click};
use crate::generate::{RenderOutcome, RenderSummary};
use crate::imaging::{Anchor, CoverCrop};
use crate::layout::{Columns, PlacedTile};
use crate::optimize::{OptimizeEvent, OptimizeResult};
use crate::pipeline::BuildOutcome;
use crate::types::{Column, Row};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 tile` / `3 tiles`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { plural })
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|s| !s.trim().is_empty())
}

/// What a tile is called in listings.
fn tile_label(tile: &Tile) -> String {
    let caption = &tile.caption;
    let label = match &tile.kind {
        TileKind::Image(image) => {
            first_non_empty(&[caption.medium.as_str(), caption.title_de.as_str()])
                .map(str::to_string)
                .unwrap_or_else(|| format!("({})", image.main_image()))
        }
        TileKind::Quote(quote) => first_non_empty(&[quote.attribution.as_str()])
            .or(quote.text_de.as_deref())
            .or(quote.text_en.as_deref())
            .unwrap_or_default()
            .to_string(),
        TileKind::Video(video) => video.title.clone(),
    };
    truncate(&label, 60)
}

fn tile_kind_name(tile: &Tile) -> &'static str {
    match tile.kind {
        TileKind::Image(_) => "image",
        TileKind::Quote(_) => "quote",
        TileKind::Video(_) => "video",
    }
}

fn click_name(action: &ClickAction) -> &'static str {
    match action {
        ClickAction::Article { .. } => "article",
        ClickAction::External { .. } => "external link",
        ClickAction::Spread { .. } => "spread",
        ClickAction::CoverThenSpread { .. } => "cover, then spread",
        ClickAction::Lightbox { .. } => "lightbox",
    }
}

fn column_name(column: Column) -> &'static str {
    match column {
        Column::Left => "left",
        Column::Right => "right",
    }
}

// ============================================================================
// fetch
// ============================================================================

/// Format the row inventory after ingestion.
pub fn format_fetch_output(rows: &[Row]) -> Vec<String> {
    let mut lines = vec![format!("Rows ({})", rows.len())];
    for (i, row) in rows.iter().enumerate() {
        let typ = first_non_empty(&[row.text("typ")]).unwrap_or("?");
        let label = first_non_empty(&[row.text("medium"), row.text("titel_de")]).unwrap_or("");
        let header = format!("{} {} {}", format_index(i + 1), typ, truncate(label, 60));
        lines.push(header.trim_end().to_string());

        let column = first_non_empty(&[row.text("spalte")]).unwrap_or("links");
        lines.push(format!(
            "{}Position: {}, column: {}",
            indent(1),
            row.text("position"),
            column
        ));
    }
    lines
}

pub fn print_fetch_output(rows: &[Row]) {
    for line in format_fetch_output(rows) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

fn format_column(title: &str, tiles: &[PlacedTile], rules: &ExceptionRules) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", title, count(tiles.len(), "tile", "tiles"))];
    for (i, placed) in tiles.iter().enumerate() {
        let tile = &placed.tile;
        let mut line = format!(
            "{} {} {}",
            format_index(i + 1),
            tile_kind_name(tile),
            tile_label(tile)
        );
        if let Some(target) = tile.gallery_target() {
            line.push_str(" → ");
            line.push_str(click_name(&plan_click(&target, rules)));
        }
        lines.push(line);
    }
    lines
}

/// Format the column plan: both desktop columns, then the narrow-screen
/// reading order.
pub fn format_layout_output(columns: &Columns, rules: &ExceptionRules) -> Vec<String> {
    let mut lines = format_column("Left column", &columns.left, rules);
    lines.extend(format_column("Right column", &columns.right, rules));

    if !columns.is_empty() {
        lines.push(String::new());
        lines.push("Mobile order".to_string());
        for placed in columns.mobile_sequence() {
            lines.push(format!(
                "{}{} {} {} {}",
                indent(1),
                format_index(placed.mobile_order),
                column_name(placed.tile.column),
                tile_kind_name(&placed.tile),
                tile_label(&placed.tile)
            ));
        }
    }
    lines
}

pub fn print_layout_output(columns: &Columns, rules: &ExceptionRules) {
    for line in format_layout_output(columns, rules) {
        println!("{}", line);
    }
}

// ============================================================================
// generate / build / reload
// ============================================================================

fn render_summary_line(summary: &RenderSummary) -> String {
    format!(
        "Rendered {} from {} ({} left, {} right) → {}",
        count(summary.tiles(), "tile", "tiles"),
        count(summary.rows, "row", "rows"),
        summary.left,
        summary.right,
        summary.output.display()
    )
}

const SKIPPED_LINE: &str = "Page has no content-left/content-right containers, nothing written";

pub fn format_generate_output(outcome: &RenderOutcome) -> Vec<String> {
    match outcome {
        RenderOutcome::Rendered(summary) => vec![render_summary_line(summary)],
        RenderOutcome::Skipped => vec![SKIPPED_LINE.to_string()],
    }
}

pub fn print_generate_output(outcome: &RenderOutcome) {
    for line in format_generate_output(outcome) {
        println!("{}", line);
    }
}

pub fn format_build_output(outcome: &BuildOutcome) -> Vec<String> {
    match outcome {
        BuildOutcome::Rendered(summary) => vec![render_summary_line(summary)],
        BuildOutcome::Skipped => vec![SKIPPED_LINE.to_string()],
        BuildOutcome::Fallback {
            reason,
            wrote_shell,
        } => {
            let kept = if *wrote_shell {
                "Wrote the static page shell"
            } else {
                "Kept the existing page"
            };
            vec![
                format!("Sheet unavailable: {}", reason),
                format!("{}{}", indent(1), kept),
            ]
        }
    }
}

pub fn print_build_output(outcome: &BuildOutcome) {
    for line in format_build_output(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// optimize / combine-spread
// ============================================================================

fn describe_crop(crop: &CoverCrop) -> String {
    match crop {
        CoverCrop::Fill(Anchor::Center) => "center".to_string(),
        CoverCrop::Fill(Anchor::Top) => "top".to_string(),
        CoverCrop::Box {
            left,
            top,
            width,
            height,
        } => format!(
            "box at {:.0}%,{:.0}% size {:.0}%x{:.0}%",
            left * 100.0,
            top * 100.0,
            width * 100.0,
            height * 100.0
        ),
    }
}

/// Format a single optimize progress event as display lines.
pub fn format_optimize_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::Started { total } => vec![format!("Images ({})", total)],
        OptimizeEvent::ImageDone {
            index,
            id,
            source,
            dimensions,
            crop,
            full,
            cover,
        } => vec![
            format!(
                "{} {} ({}x{})",
                format_index(*index),
                id,
                dimensions.0,
                dimensions.1
            ),
            format!("{}Source: {}", indent(1), source),
            format!("{}Full: {}", indent(1), full),
            format!("{}Cover: {} ({})", indent(1), cover, describe_crop(crop)),
        ],
        OptimizeEvent::ImageFailed {
            index,
            source,
            error,
        } => vec![format!(
            "{} ({}) failed: {}",
            format_index(*index),
            source,
            error
        )],
    }
}

pub fn format_optimize_summary(result: &OptimizeResult, manifest: &Path) -> Vec<String> {
    let mut line = format!(
        "Wrote {} → {}",
        count(result.manifest.len(), "entry", "entries"),
        manifest.display()
    );
    if result.failed > 0 {
        line.push_str(&format!(" ({} failed)", result.failed));
    }
    vec![line]
}

pub fn print_optimize_summary(result: &OptimizeResult, manifest: &Path) {
    for line in format_optimize_summary(result, manifest) {
        println!("{}", line);
    }
}

pub fn format_combine_output(summary: &CombineSummary) -> Vec<String> {
    let layout = &summary.layout;
    vec![
        format!(
            "Spread {}x{} → {}",
            layout.total_width(),
            layout.height,
            summary.output.display()
        ),
        format!(
            "{}Left page: {}px, right page: {}px",
            indent(1),
            layout.left_width,
            layout.right_width
        ),
    ]
}

pub fn print_combine_output(summary: &CombineSummary) {
    for line in format_combine_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
