//! Caption fonts and text rendering.
//!
//! Fonts are chosen from a caller-supplied candidate list. The first file
//! that parses wins; when none do, the DejaVu Sans face compiled into the
//! binary is used and a warning is logged.

use super::backend::{BackendError, FontChoice};
use super::params::ShadowStyle;
use ab_glyph::{FontArc, FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static BUILT_IN_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Caption fill color.
pub const CAPTION_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A parsed font and where it came from.
#[derive(Clone)]
pub struct SelectedFont {
    pub font: FontArc,
    pub choice: FontChoice,
}

/// Parse a font file. Collections (`.ttc`) use their first face.
fn load_font_file(path: &Path) -> Result<FontArc, BackendError> {
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec_and_index(data, 0).map_err(|e| {
        BackendError::ProcessingFailed(format!("Invalid font {}: {}", path.display(), e))
    })?;
    Ok(FontArc::new(font))
}

fn built_in_font() -> Result<FontArc, BackendError> {
    FontArc::try_from_slice(BUILT_IN_FONT)
        .map_err(|e| BackendError::ProcessingFailed(format!("Built-in font is invalid: {e}")))
}

/// Pick the first loadable candidate, falling back to the built-in font.
pub fn select_font(candidates: &[PathBuf]) -> Result<SelectedFont, BackendError> {
    for path in candidates {
        match load_font_file(path) {
            Ok(font) => {
                debug!(font = %path.display(), "using caption font");
                return Ok(SelectedFont {
                    font,
                    choice: FontChoice::File(path.clone()),
                });
            }
            Err(e) => debug!(font = %path.display(), error = %e, "skipping font candidate"),
        }
    }

    warn!(
        candidates = candidates.len(),
        "no candidate font could be loaded, using the built-in font"
    );
    Ok(SelectedFont {
        font: built_in_font()?,
        choice: FontChoice::BuiltIn,
    })
}

/// Bounding box of `text` at `font_size`. Empty text and zero size measure `(0, 0)`.
pub fn measure_caption(font: &FontArc, font_size: u32, text: &str) -> (u32, u32) {
    if text.is_empty() || font_size == 0 {
        return (0, 0);
    }
    text_size(PxScale::from(font_size as f32), font, text)
}

fn saturating_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Draw `text` at `(x, y)` in `color`, alpha-blended onto `canvas`.
///
/// Glyphs are rasterized onto a transparent layer of the same color so that
/// antialiased edges carry coverage in alpha only, then the layer is
/// composited over the canvas.
pub fn draw_blended_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    font_size: u32,
    position: (i64, i64),
    text: &str,
    color: Rgba<u8>,
) {
    if text.is_empty() || font_size == 0 {
        return;
    }
    let [r, g, b, _] = color.0;
    let mut layer = RgbaImage::from_pixel(canvas.width(), canvas.height(), Rgba([r, g, b, 0]));
    draw_text_mut(
        &mut layer,
        color,
        saturating_i32(position.0),
        saturating_i32(position.1),
        PxScale::from(font_size as f32),
        font,
        text,
    );
    image::imageops::overlay(canvas, &layer, 0, 0);
}

/// Draw the caption with a drop shadow: shadow first at the offset, then
/// the caption itself at `position`.
pub fn draw_caption_with_shadow(
    canvas: &mut RgbaImage,
    font: &FontArc,
    font_size: u32,
    position: (i64, i64),
    text: &str,
    shadow: ShadowStyle,
) {
    let offset = i64::from(shadow.offset);
    draw_blended_text(
        canvas,
        font,
        font_size,
        (position.0 + offset, position.1 + offset),
        text,
        Rgba([0, 0, 0, shadow.alpha]),
    );
    draw_blended_text(canvas, font, font_size, position, text, CAPTION_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidate_list_uses_built_in() {
        let selected = select_font(&[]).unwrap();
        assert_eq!(selected.choice, FontChoice::BuiltIn);
    }

    #[test]
    fn missing_and_invalid_candidates_are_skipped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let garbage = tmp.path().join("not-a-font.ttf");
        std::fs::write(&garbage, b"definitely not a font").unwrap();

        let selected = select_font(&[tmp.path().join("missing.ttc"), garbage]).unwrap();
        assert_eq!(selected.choice, FontChoice::BuiltIn);
    }

    #[test]
    fn first_valid_candidate_wins() {
        let tmp = tempfile::TempDir::new().unwrap();
        let font_path = tmp.path().join("caption.ttf");
        std::fs::write(&font_path, BUILT_IN_FONT).unwrap();

        let selected =
            select_font(&[tmp.path().join("missing.ttf"), font_path.clone()]).unwrap();
        assert_eq!(selected.choice, FontChoice::File(font_path));
    }

    #[test]
    fn measure_empty_caption_is_zero() {
        let font = built_in_font().unwrap();
        assert_eq!(measure_caption(&font, 36, ""), (0, 0));
        assert_eq!(measure_caption(&font, 0, "Hello"), (0, 0));
    }

    #[test]
    fn measure_grows_with_text_length() {
        let font = built_in_font().unwrap();
        let (short_w, short_h) = measure_caption(&font, 36, "Hi");
        let (long_w, _) = measure_caption(&font, 36, "Hi there, neighbour");
        assert!(short_w > 0 && short_h > 0);
        assert!(long_w > short_w);
    }

    #[test]
    fn caption_draws_white_pixels_and_dark_shadow() {
        let font = built_in_font().unwrap();
        let mut canvas = RgbaImage::from_pixel(200, 80, Rgba([128, 128, 128, 255]));
        draw_caption_with_shadow(
            &mut canvas,
            &font,
            40,
            (10, 10),
            "HH",
            ShadowStyle::default(),
        );

        let has_white = canvas.pixels().any(|p| p[0] > 240 && p[1] > 240 && p[2] > 240);
        let has_shadow = canvas.pixels().any(|p| p[0] < 60 && p[3] == 255);
        assert!(has_white, "caption should leave white pixels");
        assert!(has_shadow, "shadow should darken pixels next to the caption");
        assert!(canvas.pixels().all(|p| p[3] == 255), "canvas stays opaque");
    }

    #[test]
    fn offscreen_caption_does_not_panic() {
        let font = built_in_font().unwrap();
        let mut canvas = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        draw_caption_with_shadow(
            &mut canvas,
            &font,
            30,
            (-500, -40),
            "wide caption",
            ShadowStyle::default(),
        );
    }
}
