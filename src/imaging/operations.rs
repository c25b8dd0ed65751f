//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ComposeOutcome, ImageBackend};
use super::calculations::{calculate_font_size, calculate_overlay_edge};
use super::params::{ComposeParams, ConvertParams, EcLevel, QrParams, Quality, ShadowStyle};
use crate::types::TargetSize;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail composition.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    pub fonts: Vec<PathBuf>,
    pub dim_alpha: u8,
    pub gap: u32,
    pub shadow: ShadowStyle,
    pub quality: Quality,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            fonts: Vec::new(),
            dim_alpha: 100,
            gap: 40,
            shadow: ShadowStyle::default(),
            quality: Quality::default(),
        }
    }
}

/// Inputs of one thumbnail.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub background: &'a Path,
    pub overlay: &'a Path,
    pub caption: &'a str,
    pub output: &'a Path,
    pub target: TargetSize,
}

/// Plan a composition without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_compose(request: &ComposeRequest<'_>, config: &ComposeConfig) -> ComposeParams {
    ComposeParams {
        background: request.background.to_path_buf(),
        overlay: request.overlay.to_path_buf(),
        caption: request.caption.to_string(),
        output: request.output.to_path_buf(),
        target: request.target,
        overlay_edge: calculate_overlay_edge(request.target),
        font_size: calculate_font_size(request.target),
        fonts: config.fonts.clone(),
        dim_alpha: config.dim_alpha,
        gap: config.gap,
        shadow: config.shadow,
        quality: config.quality,
    }
}

/// Compose a thumbnail.
///
/// Fails with [`BackendError::FileNotFound`] before the backend is invoked
/// if either input is missing, so the output path is never touched.
pub fn compose_thumbnail(
    backend: &impl ImageBackend,
    request: &ComposeRequest<'_>,
    config: &ComposeConfig,
) -> Result<ComposeOutcome> {
    for input in [request.background, request.overlay] {
        if !input.is_file() {
            return Err(BackendError::FileNotFound(input.to_path_buf()));
        }
    }
    backend.compose(&plan_compose(request, config))
}

/// Configuration for QR rendering.
#[derive(Debug, Clone)]
pub struct QrConfig {
    pub module_size: u32,
    pub border: u32,
    pub ec_level: EcLevel,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            module_size: 10,
            border: 4,
            ec_level: EcLevel::L,
        }
    }
}

/// Render `data` as a QR code image at `output`.
pub fn generate_qr(
    backend: &impl ImageBackend,
    data: &str,
    output: &Path,
    config: &QrConfig,
) -> Result<(u32, u32)> {
    let dims = backend.render_qr(&QrParams {
        data: data.to_string(),
        output: output.to_path_buf(),
        module_size: config.module_size,
        border: config.border,
        ec_level: config.ec_level,
    })?;
    Ok((dims.width, dims.height))
}

/// Plan converting `source` to a sibling file with extension `to_ext`.
pub fn plan_conversion(source: &Path, to_ext: &str, quality: Quality) -> ConvertParams {
    ConvertParams {
        source: source.to_path_buf(),
        output: source.with_extension(to_ext),
        quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    /// Request whose background and overlay are the same file.
    fn request<'a>(input: &'a Path, output: &'a Path, target: TargetSize) -> ComposeRequest<'a> {
        ComposeRequest {
            background: input,
            overlay: input,
            caption: "都心近郊の家事ラク ヘーベルメゾン",
            output,
            target,
        }
    }

    #[test]
    fn plan_compose_landscape_reference() {
        let target = TargetSize::new(1280, 720).unwrap();
        let params = plan_compose(
            &request(Path::new("/bg.jpg"), Path::new("/out.png"), target),
            &ComposeConfig::default(),
        );

        assert_eq!(params.overlay_edge, 240);
        assert_eq!(params.font_size, 36);
        assert_eq!(params.gap, 40);
        assert_eq!(params.dim_alpha, 100);
    }

    #[test]
    fn plan_compose_portrait_keeps_overlay_edge() {
        let target = TargetSize::new(720, 1280).unwrap();
        let params = plan_compose(
            &request(Path::new("/bg.jpg"), Path::new("/out.png"), target),
            &ComposeConfig::default(),
        );

        assert_eq!(params.overlay_edge, 240);
        assert_eq!(params.font_size, 36);
    }

    #[test]
    fn compose_thumbnail_uses_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("input.png");
        std::fs::write(&input, b"placeholder").unwrap();
        let output = tmp.path().join("out.png");
        let backend = MockBackend::new();

        let outcome = compose_thumbnail(
            &backend,
            &request(&input, &output, TargetSize::new(1280, 720).unwrap()),
            &ComposeConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.output, output);
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Compose {
                width: 1280,
                height: 720,
                overlay_edge: 240,
                font_size: 36,
                gap: 40,
                ..
            }
        ));
    }

    #[test]
    fn compose_thumbnail_missing_overlay_never_reaches_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let background = tmp.path().join("bg.jpg");
        std::fs::write(&background, b"placeholder").unwrap();
        let overlay = tmp.path().join("qr.png");
        let output = tmp.path().join("out.png");
        let backend = MockBackend::new();

        let result = compose_thumbnail(
            &backend,
            &ComposeRequest {
                background: &background,
                overlay: &overlay,
                caption: "",
                output: &output,
                target: TargetSize::new(100, 100).unwrap(),
            },
            &ComposeConfig::default(),
        );

        assert!(matches!(result, Err(BackendError::FileNotFound(p)) if p == overlay));
        assert!(backend.get_operations().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn compose_thumbnail_missing_background_is_not_found() {
        let backend = MockBackend::new();
        let result = compose_thumbnail(
            &backend,
            &request(
                Path::new("/nonexistent/bg.jpg"),
                Path::new("/tmp/out.png"),
                TargetSize::new(10, 10).unwrap(),
            ),
            &ComposeConfig::default(),
        );
        assert!(matches!(result, Err(BackendError::FileNotFound(_))));
    }

    #[test]
    fn generate_qr_passes_module_geometry() {
        let backend = MockBackend::new();
        let dims = generate_qr(
            &backend,
            "https://example.com/",
            Path::new("/out/qr.png"),
            &QrConfig::default(),
        )
        .unwrap();

        assert_eq!(dims, (290, 290));
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::RenderQr { module_size: 10, border: 4, data, .. } if data == "https://example.com/"
        ));
    }

    #[test]
    fn plan_conversion_swaps_extension() {
        let params = plan_conversion(Path::new("/photos/IMG_0001.PNG"), "jpg", Quality::new(85));
        assert_eq!(params.output, PathBuf::from("/photos/IMG_0001.jpg"));
        assert_eq!(params.quality.value(), 85);
    }
}
