//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: compose, convert, and render_qr.
//!
//! The production implementation,
//! [`RustBackend`](super::rust_backend::RustBackend), is pure Rust with the
//! built-in fallback font compiled into the binary.

use super::params::{ComposeParams, ConvertParams, QrParams};
use crate::types::Rect;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of a produced image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Which font a composition ended up using.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontChoice {
    /// A caller-supplied candidate file.
    File(PathBuf),
    /// The font compiled into the binary.
    BuiltIn,
}

/// What a compose operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOutcome {
    pub output: PathBuf,
    pub size: Dimensions,
    /// Where the overlay was pasted.
    pub overlay: Rect,
    /// Where the caption was drawn (unshadowed position).
    pub caption: Rect,
    pub font_size: u32,
    pub font: FontChoice,
}

/// Trait for image processing backends.
///
/// Every backend must implement all three operations so the rest of the
/// codebase is backend-agnostic.
pub trait ImageBackend: Sync {
    /// Composite overlay and caption onto the background and save.
    fn compose(&self, params: &ComposeParams) -> Result<ComposeOutcome, BackendError>;

    /// Re-encode one image in the format implied by the output path.
    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError>;

    /// Render a QR code and save it. Returns the output dimensions.
    fn render_qr(&self, params: &QrParams) -> Result<Dimensions, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::calculations::calculate_stack_layout;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        /// Sources whose conversion should fail.
        pub failing_sources: Mutex<Vec<PathBuf>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Compose {
            background: String,
            overlay: String,
            output: String,
            width: u32,
            height: u32,
            overlay_edge: u32,
            font_size: u32,
            gap: u32,
        },
        Convert {
            source: String,
            output: String,
            quality: u32,
        },
        RenderQr {
            data: String,
            output: String,
            module_size: u32,
            border: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(sources: Vec<PathBuf>) -> Self {
            Self {
                failing_sources: Mutex::new(sources),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn compose(&self, params: &ComposeParams) -> Result<ComposeOutcome, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Compose {
                background: params.background.to_string_lossy().to_string(),
                overlay: params.overlay.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.target.width(),
                height: params.target.height(),
                overlay_edge: params.overlay_edge,
                font_size: params.font_size,
                gap: params.gap,
            });

            // Pretend every glyph is a square em.
            let caption_w = params.caption.chars().count() as u32 * params.font_size;
            let caption_h = if params.caption.is_empty() {
                0
            } else {
                params.font_size
            };
            let layout = calculate_stack_layout(
                params.target,
                params.overlay_edge,
                (caption_w, caption_h),
                params.gap,
            );
            Ok(ComposeOutcome {
                output: params.output.clone(),
                size: Dimensions {
                    width: params.target.width(),
                    height: params.target.height(),
                },
                overlay: layout.overlay,
                caption: layout.caption,
                font_size: params.font_size,
                font: FontChoice::BuiltIn,
            })
        }

        fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Convert {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                quality: params.quality.value(),
            });
            if self.failing_sources.lock().unwrap().contains(&params.source) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure for {}",
                    params.source.display()
                )));
            }
            Ok(())
        }

        fn render_qr(&self, params: &QrParams) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::RenderQr {
                data: params.data.clone(),
                output: params.output.to_string_lossy().to_string(),
                module_size: params.module_size,
                border: params.border,
            });
            // Version 1 QR: 21 modules.
            let edge = (21 + 2 * params.border) * params.module_size;
            Ok(Dimensions {
                width: edge,
                height: edge,
            })
        }
    }

    #[test]
    fn mock_records_convert() {
        let backend = MockBackend::new();

        backend
            .convert(&ConvertParams {
                source: "/photos/a.png".into(),
                output: "/photos/a.jpg".into(),
                quality: super::super::params::Quality::new(85),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Convert { quality: 85, output, .. } if output == "/photos/a.jpg"
        ));
    }

    #[test]
    fn mock_fails_configured_sources() {
        let backend = MockBackend::failing_on(vec!["/photos/bad.png".into()]);
        let result = backend.convert(&ConvertParams {
            source: "/photos/bad.png".into(),
            output: "/photos/bad.jpg".into(),
            quality: super::super::params::Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn file_not_found_names_the_path() {
        let err = BackendError::FileNotFound("/missing/qr.png".into());
        assert_eq!(err.to_string(), "File not found: /missing/qr.png");
    }
}
