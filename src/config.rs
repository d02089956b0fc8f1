//! Project configuration.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the project directory (`--source`, default `.`) and is sparse: stock
//! defaults are the base layer, user values are merged on top key by key.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [sheet]
//! id = ""                       # Spreadsheet id; empty keeps the static page
//! tab = "Tabellenblatt1"        # Tab name at the bottom of the sheet
//! base_url = "https://docs.google.com/spreadsheets/d"
//!
//! [cache]
//! ttl_minutes = 5               # 0 disables the row cache
//! key_prefix = "press_content"
//!
//! [site]
//! title = "Press"
//! lang = "de"                   # Initial language class on <body>
//! quote_author = "Kerstin Geffert" # Attribution for quotes without a medium
//!
//! [gallery.publications]        # Publication name -> spread behavior
//! "Freundin" = "swap"
//! "Maxi" = "cover-first"
//! "Working Women" = "swap"
//!
//! [gallery.positions]           # Row position -> spread behavior
//! "14" = "cover-first"
//!
//! [images]                      # Offline `optimize` tool
//! full_max_width = 2400
//! full_quality = 88
//! text_heavy_quality = 90
//! cover_width = 1200
//! cover_height = 675
//! cover_quality = 85
//!
//! [processing]
//! max_processes = 4             # Omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::gallery::{ExceptionRules, SpreadBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Attribution for quote tiles whose row names no medium.
pub const DEFAULT_QUOTE_AUTHOR: &str = "Kerstin Geffert";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where the rows come from.
    pub sheet: SheetConfig,
    /// Local row cache.
    pub cache: CacheConfig,
    /// Page-level settings.
    pub site: PageConfig,
    /// Per-publication spread exceptions.
    pub gallery: GalleryConfig,
    /// Settings for the offline `optimize` tool.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sheet.base_url must not be empty".into(),
            ));
        }
        if self.sheet.tab.trim().is_empty() {
            return Err(ConfigError::Validation("sheet.tab must not be empty".into()));
        }
        for (name, value) in [
            ("images.full_quality", self.images.full_quality),
            ("images.text_heavy_quality", self.images.text_heavy_quality),
            ("images.cover_quality", self.images.cover_quality),
        ] {
            if value > 100 {
                return Err(ConfigError::Validation(format!("{name} must be 0-100")));
            }
        }
        if self.images.cover_width == 0 || self.images.cover_height == 0 {
            return Err(ConfigError::Validation(
                "images.cover_width and images.cover_height must be non-zero".into(),
            ));
        }
        if self.images.full_max_width == 0 {
            return Err(ConfigError::Validation(
                "images.full_max_width must be non-zero".into(),
            ));
        }
        for key in self.gallery.positions.keys() {
            if key.trim().parse::<f64>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "gallery.positions key '{key}' is not a number"
                )));
            }
        }
        Ok(())
    }

    /// Whether a spreadsheet has been configured at all.
    pub fn sheet_configured(&self) -> bool {
        !self.sheet.id.trim().is_empty()
    }
}

/// Spreadsheet source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    /// Spreadsheet id, copied from the sheet URL.
    pub id: String,
    /// Tab name.
    pub tab: String,
    /// Endpoint prefix; the id and query path are appended.
    pub base_url: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            tab: "Tabellenblatt1".to_string(),
            base_url: "https://docs.google.com/spreadsheets/d".to_string(),
        }
    }
}

/// Row cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Minutes a cached fetch stays valid. `0` disables caching entirely.
    pub ttl_minutes: u64,
    /// Prefix of the cache key; the sheet id is appended.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 5,
            key_prefix: "press_content".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes * 60)
    }
}

/// Page-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Document title of the stock page shell.
    pub title: String,
    /// Initial language; the body gets class `lang-{lang}`.
    pub lang: String,
    /// Attribution for quote tiles whose row has no medium.
    pub quote_author: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Press".to_string(),
            lang: "de".to_string(),
            quote_author: DEFAULT_QUOTE_AUTHOR.to_string(),
        }
    }
}

/// Spread exceptions, keyed by publication name or row position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Publication name (matched against medium and title) -> behavior.
    pub publications: BTreeMap<String, SpreadBehavior>,
    /// Row position -> behavior.
    pub positions: BTreeMap<String, SpreadBehavior>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            publications: BTreeMap::from([
                ("Freundin".to_string(), SpreadBehavior::Swap),
                ("Maxi".to_string(), SpreadBehavior::CoverFirst),
                ("Working Women".to_string(), SpreadBehavior::Swap),
            ]),
            positions: BTreeMap::new(),
        }
    }
}

impl GalleryConfig {
    /// Build the lookup table used by click planning.
    pub fn rules(&self) -> ExceptionRules {
        let mut rules = ExceptionRules::default();
        for (name, behavior) in &self.publications {
            rules.add_publication(name, *behavior);
        }
        for (position, behavior) in &self.positions {
            if let Ok(p) = position.trim().parse::<f64>() {
                rules.add_position(p, *behavior);
            }
        }
        rules
    }
}

/// Encoding settings for the `optimize` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Full images wider than this are downscaled to it.
    pub full_max_width: u32,
    /// Quality of full images.
    pub full_quality: u32,
    /// Quality of full images whose source is wider than 4000px (scans of
    /// print pages, where text must stay legible).
    pub text_heavy_quality: u32,
    /// Cover crop width.
    pub cover_width: u32,
    /// Cover crop height.
    pub cover_height: u32,
    /// Quality of cover crops.
    pub cover_quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            full_max_width: 2400,
            full_quality: 88,
            text_heavy_quality: 90,
            cover_width: 1200,
            cover_height: 675,
            cover_quality: 85,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pressroom Configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Spreadsheet source
# ---------------------------------------------------------------------------
[sheet]
# Spreadsheet id, copied from the sheet URL. While empty, builds keep the
# static page untouched.
id = ""

# Tab name shown at the bottom of the spreadsheet.
tab = "Tabellenblatt1"

# Endpoint prefix. The request is {base_url}/{id}/gviz/tq?tqx=out:json&sheet={tab}
base_url = "https://docs.google.com/spreadsheets/d"

# ---------------------------------------------------------------------------
# Row cache
# ---------------------------------------------------------------------------
[cache]
# Minutes a fetched sheet is reused before fetching again. 0 = no cache.
ttl_minutes = 5

# Cache entries are stored as {key_prefix}_{sheet id}.json in the temp dir.
key_prefix = "press_content"

# ---------------------------------------------------------------------------
# Page
# ---------------------------------------------------------------------------
[site]
title = "Press"

# Initial language; both languages are always rendered, the body class
# lang-{lang} decides which one is visible.
lang = "de"

# Attribution for quotes whose row has no medium.
quote_author = "Kerstin Geffert"

# ---------------------------------------------------------------------------
# Spread exceptions
# ---------------------------------------------------------------------------
# Behaviors for tiles with two gallery images:
#   "swap"        - show the second image on the left, the first on the right
#   "cover-first" - show the first image alone, the spread after "next"
# "cover-first" also applies to three images: cover, then images 2 and 3.
[gallery.publications]
# Matched case-insensitively against the medium and the German title.
# Entries here are merged with these defaults; to disable one, give it the
# other behavior in your config.toml.
"Freundin" = "swap"
"Maxi" = "cover-first"
"Working Women" = "swap"

[gallery.positions]
# Matched against the row's position. Wins over a publication match.
# "14" = "cover-first"

# ---------------------------------------------------------------------------
# Offline image optimization (pressroom optimize)
# ---------------------------------------------------------------------------
[images]
full_max_width = 2400
full_quality = 88
# Used when the source is wider than 4000px (scanned print pages).
text_heavy_quality = 90
cover_width = 1200
cover_height = 675
cover_quality = 85

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image workers. Omit to auto-detect (= CPU cores).
# max_processes = 4
"##
}
