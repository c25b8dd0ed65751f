//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate, format guessed from content |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Darken / paste | `image::imageops::overlay` (alpha compositing) |
//! | Caption | `ab_glyph` outlines + `imageproc::drawing::draw_text_mut` |
//! | QR payload | `qrcode` crate, modules painted onto a `GrayImage` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → PNG, TIFF, WebP | `image::DynamicImage::save_with_format` |

use super::backend::{BackendError, ComposeOutcome, Dimensions, ImageBackend};
use super::calculations::{
    calculate_center_crop_offset, calculate_fill_dimensions, calculate_stack_layout,
};
use super::params::{ComposeParams, ConvertParams, EcLevel, QrParams};
use super::text::{draw_caption_with_shadow, measure_caption, select_font};
use crate::types::TargetSize;
use image::imageops::FilterType;
use image::{
    DynamicImage, GrayImage, ImageFormat, ImageReader, Luma, RgbImage, Rgba, RgbaImage,
};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether an output path with this extension can be encoded.
pub fn is_writable_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    ext == "avif"
        || ImageFormat::from_extension(&ext).is_some_and(|fmt| fmt.writing_enabled())
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk. The format comes from the file's
/// content, not its extension.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let reader = ImageReader::open(path).map_err(|e| open_error(path, e))?;
    reader
        .with_guessed_format()
        .map_err(|e| open_error(path, e))?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Missing and unreadable inputs are both reported as not found.
fn open_error(path: &Path, e: std::io::Error) -> BackendError {
    match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            BackendError::FileNotFound(path.to_path_buf())
        }
        _ => BackendError::Io(e),
    }
}

fn output_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Reduce an image to a pixel layout the target encoder accepts.
///
/// JPEG has no alpha and no 16-bit mode: alpha and palette images become RGB,
/// grayscale stays grayscale. PNG, TIFF and WebP keep their layout apart
/// from dropping to 8 bits where the encoder requires it.
fn normalize_for_extension(img: DynamicImage, ext: &str) -> DynamicImage {
    match ext {
        "jpg" | "jpeg" => match img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
            DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(img.to_luma8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        },
        "webp" | "avif" => {
            if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            }
        }
        _ => match img {
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            other => other,
        },
    }
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = output_extension(path);

    match ext.as_str() {
        "jpg" | "jpeg" => save_jpeg(img, path, quality),
        "avif" => save_avif(img, path, quality),
        other => {
            let format = ImageFormat::from_extension(other)
                .filter(|fmt| fmt.writing_enabled())
                .ok_or_else(|| BackendError::UnsupportedFormat(other.to_string()))?;
            img.save_with_format(path, format).map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to save {}: {}", path.display(), e))
            })
        }
    }
}

fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

/// Encode and save as AVIF using ravif/rav1e (speed=6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))
}

/// Scale to cover `target`, then center-crop to exactly `target`.
fn fill_and_crop(img: &RgbaImage, target: TargetSize) -> RgbaImage {
    let (fill_w, fill_h) = calculate_fill_dimensions(img.dimensions(), target);
    let filled = image::imageops::resize(img, fill_w, fill_h, FilterType::Lanczos3);
    let (x, y) = calculate_center_crop_offset((fill_w, fill_h), target);
    image::imageops::crop_imm(&filled, x, y, target.width(), target.height()).to_image()
}

/// Composite a uniform black layer of `alpha` over the whole image.
fn darken(img: &mut RgbaImage, alpha: u8) {
    if alpha == 0 {
        return;
    }
    let shade = RgbaImage::from_pixel(img.width(), img.height(), Rgba([0, 0, 0, alpha]));
    image::imageops::overlay(img, &shade, 0, 0);
}

/// Composite onto opaque black and drop the alpha channel.
fn flatten(img: &RgbaImage) -> RgbImage {
    let mut base = RgbaImage::from_pixel(img.width(), img.height(), Rgba([0, 0, 0, 255]));
    image::imageops::overlay(&mut base, img, 0, 0);
    DynamicImage::ImageRgba8(base).to_rgb8()
}

/// Largest QR image edge, in pixels.
const MAX_QR_EDGE: u32 = 16_384;

fn qr_ec_level(level: EcLevel) -> qrcode::EcLevel {
    match level {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    }
}

/// Paint a QR code: dark modules black on white, with a quiet zone of
/// `border` modules on every side.
fn render_qr_image(params: &QrParams) -> Result<GrayImage, BackendError> {
    let code =
        qrcode::QrCode::with_error_correction_level(params.data.as_bytes(), qr_ec_level(params.ec_level))
            .map_err(|e| BackendError::ProcessingFailed(format!("QR encode error: {e}")))?;
    let modules = code.to_colors();
    let module_count = code.width() as u32;
    let scale = params.module_size.max(1);
    let img_size = params
        .border
        .checked_mul(2)
        .and_then(|quiet| quiet.checked_add(module_count))
        .and_then(|modules| modules.checked_mul(scale))
        .filter(|edge| *edge <= MAX_QR_EDGE)
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "QR image too large: {module_count} modules, border {}, module size {scale} \
                 (max edge {MAX_QR_EDGE}px)",
                params.border
            ))
        })?;

    let mut img = GrayImage::from_pixel(img_size, img_size, Luma([255u8]));

    for (i, color) in modules.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let x = (i as u32) % module_count + params.border;
        let y = (i as u32) / module_count + params.border;
        for dx in 0..scale {
            for dy in 0..scale {
                img.put_pixel(x * scale + dx, y * scale + dy, Luma([0u8]));
            }
        }
    }

    Ok(img)
}

impl ImageBackend for RustBackend {
    fn compose(&self, params: &ComposeParams) -> Result<ComposeOutcome, BackendError> {
        // Both inputs are resolved before anything is written.
        let background = load_image(&params.background)?.to_rgba8();
        let overlay = load_image(&params.overlay)?.to_rgba8();

        let mut canvas = fill_and_crop(&background, params.target);
        darken(&mut canvas, params.dim_alpha);

        let selected = select_font(&params.fonts)?;
        let caption_size = measure_caption(&selected.font, params.font_size, &params.caption);
        let layout = calculate_stack_layout(
            params.target,
            params.overlay_edge,
            caption_size,
            params.gap,
        );
        debug!(target_size = %params.target, ?layout, "thumbnail layout");

        if params.overlay_edge > 0 {
            let overlay = image::imageops::resize(
                &overlay,
                params.overlay_edge,
                params.overlay_edge,
                FilterType::Lanczos3,
            );
            image::imageops::overlay(&mut canvas, &overlay, layout.overlay.x, layout.overlay.y);
        }

        draw_caption_with_shadow(
            &mut canvas,
            &selected.font,
            params.font_size,
            (layout.caption.x, layout.caption.y),
            &params.caption,
            params.shadow,
        );

        let flattened = DynamicImage::ImageRgb8(flatten(&canvas));
        save_image(&flattened, &params.output, params.quality.value())?;

        Ok(ComposeOutcome {
            output: params.output.clone(),
            size: Dimensions {
                width: flattened.width(),
                height: flattened.height(),
            },
            overlay: layout.overlay,
            caption: layout.caption,
            font_size: params.font_size,
            font: selected.choice,
        })
    }

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let ext = output_extension(&params.output);
        let normalized = normalize_for_extension(img, &ext);
        save_image(&normalized, &params.output, params.quality.value())
    }

    fn render_qr(&self, params: &QrParams) -> Result<Dimensions, BackendError> {
        let img = render_qr_image(params)?;
        let dims = Dimensions {
            width: img.width(),
            height: img.height(),
        };
        save_image(&DynamicImage::ImageLuma8(img), &params.output, 100)?;
        Ok(dims)
    }
}
