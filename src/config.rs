//! Tool configuration module.
//!
//! Handles loading, validating, and merging `qrthumb.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged over them key
//! by key, so a config file only needs the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnail]
//! background = "images/background.jpeg"
//! overlay = "qr.png"
//! caption = ""
//! dim_alpha = 100           # Black layer over the background (0-255)
//! gap = 40                  # Pixels between overlay and caption
//! shadow_offset = 2         # Caption drop-shadow offset
//! shadow_alpha = 200        # Caption drop-shadow opacity (0-255)
//! quality = 90              # Lossy output quality (1-100)
//! fonts = ["C:\\Windows\\Fonts\\meiryo.ttc", ...]
//!
//! [[thumbnail.outputs]]
//! path = "thumbnail_horizontal.png"
//! width = 1280
//! height = 720
//!
//! [[thumbnail.outputs]]
//! path = "thumbnail_vertical.png"
//! width = 720
//! height = 1280
//!
//! [qr]                      # Absent by default: `build` renders no QR
//! data = "https://example.com/"
//! output = "qr.png"
//! module_size = 10
//! border = 4
//! error_correction = "L"    # L, M, Q or H
//!
//! [convert]
//! from = ["png"]
//! to = "jpg"
//! quality = 85
//! recursive = false
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early. Relative paths are
//! resolved against the directory holding the config file.

use crate::imaging::{
    ComposeConfig, EcLevel, QrConfig, Quality, ShadowStyle, is_writable_extension,
    supported_input_extensions,
};
use crate::types::TargetSize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bounds for QR geometry accepted from config and CLI.
pub const MAX_QR_MODULE_SIZE: u32 = 100;
pub const MAX_QR_BORDER: u32 = 64;

/// Config file name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "qrthumb.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `qrthumb.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Thumbnail inputs, styling and output sizes.
    pub thumbnail: ThumbnailConfig,
    /// QR code rendered by `build` before the thumbnails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<QrCodeConfig>,
    /// Batch conversion defaults.
    pub convert: ConvertConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.thumbnail.quality) {
            return Err(ConfigError::Validation(
                "thumbnail.quality must be 1-100".into(),
            ));
        }
        for output in &self.thumbnail.outputs {
            output.target_size()?;
        }
        if let Some(qr) = &self.qr {
            if qr.data.is_empty() {
                return Err(ConfigError::Validation("qr.data must not be empty".into()));
            }
            if !(1..=MAX_QR_MODULE_SIZE).contains(&qr.module_size) {
                return Err(ConfigError::Validation(format!(
                    "qr.module_size must be 1-{MAX_QR_MODULE_SIZE}"
                )));
            }
            if qr.border > MAX_QR_BORDER {
                return Err(ConfigError::Validation(format!(
                    "qr.border must be at most {MAX_QR_BORDER}"
                )));
            }
        }
        if !(1..=100).contains(&self.convert.quality) {
            return Err(ConfigError::Validation(
                "convert.quality must be 1-100".into(),
            ));
        }
        if self.convert.from.is_empty() {
            return Err(ConfigError::Validation(
                "convert.from must not be empty".into(),
            ));
        }
        let supported = supported_input_extensions();
        for ext in &self.convert.from {
            if !supported.contains(&ext.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::Validation(format!(
                    "convert.from: no decoder for '{ext}' (supported: {})",
                    supported.join(", ")
                )));
            }
        }
        if !is_writable_extension(&self.convert.to) {
            return Err(ConfigError::Validation(format!(
                "convert.to: cannot encode '{}'",
                self.convert.to
            )));
        }
        Ok(())
    }
}

/// Thumbnail composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    /// Background photo.
    pub background: PathBuf,
    /// Overlay image, usually the QR code.
    pub overlay: PathBuf,
    /// Caption drawn below the overlay.
    pub caption: String,
    /// Alpha of the black layer darkening the background.
    pub dim_alpha: u8,
    /// Gap between the overlay bottom and the caption top, in pixels.
    pub gap: u32,
    pub shadow_offset: i32,
    pub shadow_alpha: u8,
    /// Quality for lossy output formats (1-100).
    pub quality: u32,
    /// Font files tried in order for the caption.
    pub fonts: Vec<PathBuf>,
    /// One thumbnail is produced per entry.
    pub outputs: Vec<OutputConfig>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            background: PathBuf::from("images/background.jpeg"),
            overlay: PathBuf::from("qr.png"),
            caption: String::new(),
            dim_alpha: 100,
            gap: 40,
            shadow_offset: 2,
            shadow_alpha: 200,
            quality: 90,
            fonts: default_font_candidates(),
            outputs: vec![
                OutputConfig {
                    path: PathBuf::from("thumbnail_horizontal.png"),
                    width: 1280,
                    height: 720,
                },
                OutputConfig {
                    path: PathBuf::from("thumbnail_vertical.png"),
                    width: 720,
                    height: 1280,
                },
            ],
        }
    }
}

impl ThumbnailConfig {
    /// Planner settings for the imaging layer.
    pub fn compose_config(&self) -> ComposeConfig {
        ComposeConfig {
            fonts: self.fonts.clone(),
            dim_alpha: self.dim_alpha,
            gap: self.gap,
            shadow: ShadowStyle {
                offset: self.shadow_offset,
                alpha: self.shadow_alpha,
            },
            quality: Quality::new(self.quality),
        }
    }
}

/// Fonts with Japanese coverage at their usual install locations.
fn default_font_candidates() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
        "C:\\Windows\\Fonts\\meiryo.ttc",
        "C:\\Windows\\Fonts\\msgothic.ttc",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// One thumbnail output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl OutputConfig {
    pub fn target_size(&self) -> Result<TargetSize, ConfigError> {
        TargetSize::new(self.width, self.height).map_err(|e| {
            ConfigError::Validation(format!("thumbnail.outputs '{}': {e}", self.path.display()))
        })
    }
}

/// QR code job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrCodeConfig {
    /// Payload, typically a URL.
    pub data: String,
    pub output: PathBuf,
    /// Pixels per module.
    pub module_size: u32,
    /// Quiet zone, in modules.
    pub border: u32,
    pub error_correction: EcLevel,
}

impl Default for QrCodeConfig {
    fn default() -> Self {
        let qr = QrConfig::default();
        Self {
            data: String::new(),
            output: PathBuf::from("qr.png"),
            module_size: qr.module_size,
            border: qr.border,
            error_correction: qr.ec_level,
        }
    }
}

impl QrCodeConfig {
    pub fn qr_config(&self) -> QrConfig {
        QrConfig {
            module_size: self.module_size,
            border: self.border,
            ec_level: self.error_correction,
        }
    }
}

/// Batch conversion defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Source extensions, matched case-insensitively.
    pub from: Vec<String>,
    /// Target extension.
    pub to: String,
    /// Quality for lossy targets (1-100).
    pub quality: u32,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            from: vec!["png".to_string()],
            to: "jpg".to_string(),
            quality: 85,
            recursive: false,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversion workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely; arrays of
///   tables such as `[[thumbnail.outputs]]` are replaced, not appended.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `qrthumb.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# qrthumb Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnail]
# Background photo, scaled to cover each output and center-cropped.
background = "images/background.jpeg"

# Overlay pasted in the middle (usually the QR code), scaled to a square
# one third of the shorter output edge.
overlay = "qr.png"

# Caption drawn below the overlay. Font size is 5% of the shorter edge.
caption = ""

# Opacity (0-255) of the black layer that darkens the background.
dim_alpha = 100

# Pixels between the bottom of the overlay and the top of the caption.
gap = 40

# Caption drop shadow: offset in pixels and opacity (0-255).
shadow_offset = 2
shadow_alpha = 200

# Quality for lossy output formats such as JPEG (1-100).
quality = 90

# Caption fonts, tried in order. The first one that loads is used; when
# none do, a built-in font is used and a warning is printed.
fonts = [
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    'C:\Windows\Fonts\meiryo.ttc',
    'C:\Windows\Fonts\msgothic.ttc',
]

# One thumbnail per entry. The output format follows the file extension.
[[thumbnail.outputs]]
path = "thumbnail_horizontal.png"
width = 1280
height = 720

[[thumbnail.outputs]]
path = "thumbnail_vertical.png"
width = 720
height = 1280

# ---------------------------------------------------------------------------
# QR code (rendered by `build` before the thumbnails)
# ---------------------------------------------------------------------------
# [qr]
# data = "https://example.com/"
# output = "qr.png"
# module_size = 10        # Pixels per module (1-100)
# border = 4              # Quiet zone, in modules (0-64)
# error_correction = "L"  # L, M, Q or H

# ---------------------------------------------------------------------------
# Batch conversion
# ---------------------------------------------------------------------------
[convert]
# Source extensions (case-insensitive).
from = ["png"]

# Target extension. Alpha is dropped for formats without it (JPEG).
to = "jpg"

# Quality for lossy targets (1-100).
quality = 85

# Descend into subdirectories.
recursive = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversion workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
