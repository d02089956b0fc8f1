//! # Pressroom
//!
//! Builds the press section of a portfolio site from a spreadsheet. Every
//! sheet row is one press item: a magazine scan, a quote or a video. Rows
//! become tiles in two columns, and clicking a tile opens an article, a
//! two-page spread or a lightbox gallery.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Fetch     sheet (or cache)  →  rows.json     (spreadsheet → rows)
//! 2. Generate  rows.json         →  index.html    (rows → tiles → columns → HTML)
//! ```
//!
//! `build` runs both; when the sheet cannot be read, the static page stays
//! as it is. The rows file between the stages is plain JSON you can inspect
//! or edit by hand before running `generate`.
//!
//! Next to the pipeline sit two offline image tools: `combine-spread` joins
//! two magazine pages into one image and `optimize` turns self-hosted sources
//! into full-size AVIFs and covers.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sheet`] | Query URL and response parsing for the spreadsheet endpoint |
//! | [`cache`] | File-backed row cache with a TTL |
//! | [`ingest`] | Cache-or-fetch, position filtering and sorting |
//! | [`classify`] | Row → tile (image, quote, video) with link rewriting |
//! | [`layout`] | Two columns plus the quote-separated mobile order |
//! | [`gallery`] | Click planning, spread exceptions and the modal state machine |
//! | [`page`] | The page surface tiles are inserted into |
//! | [`generate`] | Renders tiles and the page shell with Maud |
//! | [`pipeline`] | fetch / generate / build / reload / check |
//! | [`imaging`] | Pure-Rust image operations: resize, cover crop, spread canvas |
//! | [`optimize`] | Batch full images and covers for `images/src` |
//! | [`combine`] | Download two pages and join them into a spread |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`types`] | The sheet row type shared by all stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Click Decisions at Build Time
//!
//! What a click does depends only on the row (links, image count, spread
//! exceptions), so it is decided in Rust and written into `data-action`. The
//! shipped script only executes it. [`gallery::GalleryController`] models the
//! same state machine for tests.
//!
//! ## Keep the Static Page on Failure
//!
//! A press page that shows yesterday's items is better than an empty one.
//! Any ingestion failure, or a sheet without a single positioned row, is
//! logged and the current output is left in place.

pub mod cache;
pub mod classify;
pub mod combine;
pub mod config;
pub mod gallery;
pub mod generate;
pub mod imaging;
pub mod ingest;
pub mod layout;
pub mod optimize;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod sheet;
pub mod types;
