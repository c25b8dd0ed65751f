//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::{Rect, TargetSize};

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may
/// exceed. Neither is ever smaller than the target, so the following center
/// crop always yields exactly the target size.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: TargetSize) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target.as_tuple();

    if src_w == 0 || src_h == 0 {
        return (tgt_w, tgt_h);
    }

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

/// Top-left corner of a centered crop of `target` out of `filled`.
pub fn calculate_center_crop_offset(filled: (u32, u32), target: TargetSize) -> (u32, u32) {
    let (fill_w, fill_h) = filled;
    (
        fill_w.saturating_sub(target.width()) / 2,
        fill_h.saturating_sub(target.height()) / 2,
    )
}

/// Edge of the square overlay: one third of the shorter target edge.
pub fn calculate_overlay_edge(target: TargetSize) -> u32 {
    target.min_edge() / 3
}

/// Caption font size in pixels: 5% of the shorter target edge, floored.
pub fn calculate_font_size(target: TargetSize) -> u32 {
    // Integer form of floor(min_edge * 0.05); avoids float rounding at exact multiples.
    target.min_edge() * 5 / 100
}

/// Positions of the overlay and caption in a vertically stacked layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLayout {
    pub overlay: Rect,
    pub caption: Rect,
}

/// Lay out the overlay above the caption, centered as a unit.
///
/// The stack is `overlay_edge + gap + caption height` tall and centered
/// vertically; each element is centered horizontally on its own. Division
/// floors toward negative infinity so content larger than the canvas gets a
/// negative origin instead of wrapping.
///
/// # Arguments
/// * `target` - Canvas size
/// * `overlay_edge` - Edge of the square overlay
/// * `caption` - Measured caption size (width, height)
/// * `gap` - Vertical gap between overlay bottom and caption top
pub fn calculate_stack_layout(
    target: TargetSize,
    overlay_edge: u32,
    caption: (u32, u32),
    gap: u32,
) -> StackLayout {
    let (tgt_w, tgt_h) = (i64::from(target.width()), i64::from(target.height()));
    let edge = i64::from(overlay_edge);
    let (text_w, text_h) = (i64::from(caption.0), i64::from(caption.1));
    let gap = i64::from(gap);

    let total_h = edge + text_h + gap;
    let start_y = (tgt_h - total_h).div_euclid(2);

    StackLayout {
        overlay: Rect {
            x: (tgt_w - edge).div_euclid(2),
            y: start_y,
            width: overlay_edge,
            height: overlay_edge,
        },
        caption: Rect {
            x: (tgt_w - text_w).div_euclid(2),
            y: start_y + edge + gap,
            width: caption.0,
            height: caption.1,
        },
    }
}
