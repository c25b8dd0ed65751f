//! # qrthumb
//!
//! Builds share thumbnails: a background photo scaled to cover the output,
//! darkened, with a QR code pasted in the middle and a caption below it.
//!
//! ```text
//! ┌──────────────────────────┐
//! │   background (dimmed)    │
//! │         ┌──────┐         │
//! │         │  QR  │ ← min/3 │
//! │         └──────┘         │
//! │            gap           │
//! │      caption + shadow    │
//! └──────────────────────────┘
//! ```
//!
//! The same binary renders the QR code itself and batch-converts image
//! directories (typically PNG screenshots to JPEG).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pure-Rust image operations: layout math, composition, QR rendering, conversion |
//! | [`convert`] | Parallel batch conversion of a directory |
//! | [`job`] | Runs everything `qrthumb.toml` describes (`build` command) |
//! | [`config`] | `qrthumb.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared value types (`TargetSize`, `Rect`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate, text goes through
//! `ab_glyph` + `imageproc`, and QR matrices come from `qrcode`. No system
//! libraries are needed. A font is embedded in the binary as the last caption
//! fallback, so composition never fails for lack of fonts.
//!
//! ## Calculations Separate From Pixels
//!
//! Every size and position (fill scale, crop offset, overlay edge, font size,
//! stack layout) is a pure function in `imaging::calculations`. The backend
//! only executes; the [`imaging::ImageBackend`] trait lets the operations layer
//! be tested with a recording mock.

pub mod config;
pub mod convert;
pub mod imaging;
pub mod job;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
