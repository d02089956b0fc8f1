//! Image processing for the offline tools, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Full image → AVIF** | Lanczos3 + optional `unsharpen` + rav1e encoder |
//! | **Cover** | fill resize + anchored crop, or box crop |
//! | **Spread → JPEG** | two pages on a white `RgbImage` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    PixelBox, SpreadLayout, calculate_full_dimensions, calculate_spread_layout,
    normalized_box_to_pixels,
};
pub use operations::{
    CoverConfig, CoverCrop, FullConfig, combine_spread, create_cover, create_full_image,
    get_dimensions,
};
pub use params::{Anchor, CropRegion, Quality, Sharpening};
pub use rust_backend::{RustBackend, supported_input_extensions};
