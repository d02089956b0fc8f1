//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Anchor;

/// Sources wider than this are treated as scans of print pages.
pub const TEXT_HEAVY_WIDTH: u32 = 4000;

/// Whether a source of this width is likely a text-heavy scan.
pub fn is_text_heavy(width: u32) -> bool {
    width > TEXT_HEAVY_WIDTH
}

/// Output dimensions of a full image: scaled down to `max_width`, never up.
///
/// # Examples
/// ```
/// # use pressroom::imaging::calculate_full_dimensions;
/// assert_eq!(calculate_full_dimensions((4800, 3200), 2400), (2400, 1600));
/// assert_eq!(calculate_full_dimensions((1200, 900), 2400), (1200, 900));
/// ```
pub fn calculate_full_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width || src_w == 0 {
        return source;
    }
    let h = (src_h as f64 * max_width as f64 / src_w as f64).round() as u32;
    (max_width, h.max(1))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

/// Top-left corner of the crop window inside a fill-resized image.
pub fn calculate_crop_offset(filled: (u32, u32), target: (u32, u32), anchor: Anchor) -> (u32, u32) {
    let x = filled.0.saturating_sub(target.0) / 2;
    let y = match anchor {
        Anchor::Center => filled.1.saturating_sub(target.1) / 2,
        Anchor::Top => 0,
    };
    (x, y)
}

/// A pixel rectangle inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Convert a normalized box (fractions of the source size) to pixels.
///
/// The box is clamped to the image and is at least 1x1.
///
/// # Examples
/// ```
/// # use pressroom::imaging::{PixelBox, normalized_box_to_pixels};
/// let b = normalized_box_to_pixels((1000, 800), 0.25, 0.5, 0.5, 0.5);
/// assert_eq!(b, PixelBox { x: 250, y: 400, width: 500, height: 400 });
/// ```
pub fn normalized_box_to_pixels(
    source: (u32, u32),
    left: f64,
    top: f64,
    width: f64,
    height: f64,
) -> PixelBox {
    let (src_w, src_h) = source;
    let to_px = |fraction: f64, size: u32| {
        (fraction.clamp(0.0, 1.0) * size as f64).round() as u32
    };

    let x = to_px(left, src_w).min(src_w.saturating_sub(1));
    let y = to_px(top, src_h).min(src_h.saturating_sub(1));
    let w = to_px(width, src_w).clamp(1, (src_w - x).max(1));
    let h = to_px(height, src_h).clamp(1, (src_h - y).max(1));
    PixelBox {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Dimensions of a two-page spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadLayout {
    pub height: u32,
    pub left_width: u32,
    pub right_width: u32,
}

impl SpreadLayout {
    pub fn total_width(&self) -> u32 {
        self.left_width + self.right_width
    }
}

/// Scale both pages to the taller page's height.
///
/// # Examples
/// ```
/// # use pressroom::imaging::calculate_spread_layout;
/// let layout = calculate_spread_layout((800, 1000), (1000, 1250));
/// assert_eq!((layout.left_width, layout.right_width, layout.height), (1000, 1000, 1250));
/// ```
pub fn calculate_spread_layout(left: (u32, u32), right: (u32, u32)) -> SpreadLayout {
    let height = left.1.max(right.1).max(1);
    let scale = |(w, h): (u32, u32)| -> u32 {
        if h == 0 {
            return w.max(1);
        }
        ((w as f64 * height as f64 / h as f64).round() as u32).max(1)
    };
    SpreadLayout {
        height,
        left_width: scale(left),
        right_width: scale(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // full image tests
    // =========================================================================

    #[test]
    fn full_downscales_wide_sources() {
        assert_eq!(calculate_full_dimensions((6000, 4000), 2400), (2400, 1600));
    }

    #[test]
    fn full_never_upscales() {
        assert_eq!(calculate_full_dimensions((800, 600), 2400), (800, 600));
        assert_eq!(calculate_full_dimensions((2400, 100), 2400), (2400, 100));
    }

    #[test]
    fn text_heavy_threshold() {
        assert!(!is_text_heavy(4000));
        assert!(is_text_heavy(4001));
    }

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn fill_wider_source_to_portrait_target() {
        // 800x600 (4:3) → 400x500 target
        // Source is wider, so height matches: 500, width = 500 * (4/3) = 667
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 500)), (667, 500));
    }

    #[test]
    fn fill_portrait_page_to_cover() {
        // 2000x2800 magazine page → 1200x675 cover
        // Source is taller, so width matches: 1200, height = 1200 * 1.4 = 1680
        assert_eq!(calculate_fill_dimensions((2000, 2800), (1200, 675)), (1200, 1680));
    }

    #[test]
    fn fill_same_aspect_ratio() {
        assert_eq!(calculate_fill_dimensions((1920, 1080), (1200, 675)), (1200, 675));
    }

    // =========================================================================
    // crop offset tests
    // =========================================================================

    #[test]
    fn crop_offset_center() {
        assert_eq!(
            calculate_crop_offset((1200, 1680), (1200, 675), Anchor::Center),
            (0, 502)
        );
    }

    #[test]
    fn crop_offset_top_keeps_upper_edge() {
        assert_eq!(
            calculate_crop_offset((1200, 1680), (1200, 675), Anchor::Top),
            (0, 0)
        );
        // Horizontal overflow is still centered
        assert_eq!(
            calculate_crop_offset((1400, 675), (1200, 675), Anchor::Top),
            (100, 0)
        );
    }

    // =========================================================================
    // normalized box tests
    // =========================================================================

    #[test]
    fn box_converts_fractions() {
        assert_eq!(
            normalized_box_to_pixels((2000, 3000), 0.1, 0.2, 0.5, 0.25),
            PixelBox {
                x: 200,
                y: 600,
                width: 1000,
                height: 750
            }
        );
    }

    #[test]
    fn box_is_clamped_to_image() {
        let b = normalized_box_to_pixels((1000, 1000), 0.8, 0.9, 0.5, 0.5);
        assert_eq!(b.x, 800);
        assert_eq!(b.y, 900);
        assert_eq!(b.width, 200);
        assert_eq!(b.height, 100);
    }

    #[test]
    fn box_is_never_empty() {
        let b = normalized_box_to_pixels((1000, 1000), 1.0, 1.0, 0.0, 0.0);
        assert_eq!(b, PixelBox { x: 999, y: 999, width: 1, height: 1 });
    }

    #[test]
    fn box_out_of_range_fractions_are_clamped() {
        let b = normalized_box_to_pixels((100, 100), -0.5, 0.0, 2.0, 1.0);
        assert_eq!(b, PixelBox { x: 0, y: 0, width: 100, height: 100 });
    }

    // =========================================================================
    // spread layout tests
    // =========================================================================

    #[test]
    fn spread_scales_to_taller_page() {
        let layout = calculate_spread_layout((1000, 1400), (1200, 1500));
        assert_eq!(layout.height, 1500);
        assert_eq!(layout.left_width, 1071);
        assert_eq!(layout.right_width, 1200);
        assert_eq!(layout.total_width(), 2271);
    }

    #[test]
    fn spread_equal_pages() {
        let layout = calculate_spread_layout((800, 1000), (800, 1000));
        assert_eq!(layout, SpreadLayout { height: 1000, left_width: 800, right_width: 800 });
    }
}
