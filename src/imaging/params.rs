//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what images to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ShadowStyle`]: Offset and alpha of the caption drop shadow.
//! - [`ComposeParams`]: Full specification for a thumbnail: inputs, caption, output, geometry.
//! - [`ConvertParams`]: One file conversion: source, output, quality.
//! - [`QrParams`]: QR payload, output path and module geometry.

use crate::types::TargetSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Drop shadow drawn beneath the caption.
///
/// - `offset`: shift right and down, in pixels
/// - `alpha`: opacity of the black shadow (0 = invisible, 255 = opaque)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowStyle {
    pub offset: i32,
    pub alpha: u8,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            offset: 2,
            alpha: 200,
        }
    }
}

/// Parameters for a thumbnail composition.
///
/// Geometry that depends only on the target size (overlay edge, font size)
/// is resolved by the planner; layout that depends on the rendered caption is
/// left to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeParams {
    pub background: PathBuf,
    pub overlay: PathBuf,
    pub caption: String,
    pub output: PathBuf,
    pub target: TargetSize,
    /// Edge of the square the overlay is scaled to.
    pub overlay_edge: u32,
    /// Caption font size in pixels.
    pub font_size: u32,
    /// Candidate font files, tried in order before the built-in font.
    pub fonts: Vec<PathBuf>,
    /// Alpha of the black layer laid over the background.
    pub dim_alpha: u8,
    /// Vertical gap between overlay and caption.
    pub gap: u32,
    pub shadow: ShadowStyle,
    pub quality: Quality,
}

/// Parameters for converting one file to another format.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: Quality,
}

/// QR error correction level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum EcLevel {
    /// ~7% recovery.
    #[default]
    L,
    /// ~15% recovery.
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

/// Parameters for rendering a QR code.
#[derive(Debug, Clone, PartialEq)]
pub struct QrParams {
    pub data: String,
    pub output: PathBuf,
    /// Pixels per module.
    pub module_size: u32,
    /// Quiet zone width, in modules.
    pub border: u32,
    pub ec_level: EcLevel,
}
