//! Shared types used by the composer, the config layer and the CLI.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("target size must be positive, got {width}x{height}")]
pub struct InvalidSize {
    pub width: u32,
    pub height: u32,
}

/// Requested output size in pixels.
///
/// Both components are guaranteed non-zero: the only way to build one is
/// [`TargetSize::new`], which rejects zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    width: u32,
    height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Result<Self, InvalidSize> {
        if width == 0 || height == 0 {
            return Err(InvalidSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    /// The shorter of the two edges. Overlay and font sizes scale from this.
    pub fn min_edge(self) -> u32 {
        self.width.min(self.height)
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in canvas coordinates.
///
/// The origin may be negative when content is wider or taller than the
/// canvas; drawing clips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}
