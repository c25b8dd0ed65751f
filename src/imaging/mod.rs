//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Compose** | Lanczos3 fill + center crop, alpha overlay, `imageproc` caption |
//! | **Convert** | decode, color-mode normalization, re-encode by extension |
//! | **QR** | `qrcode` modules painted onto a grayscale buffer |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Text**: Font selection with built-in fallback, caption drawing
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
mod text;

pub use backend::{BackendError, ComposeOutcome, Dimensions, FontChoice, ImageBackend};
pub use calculations::{
    StackLayout, calculate_fill_dimensions, calculate_font_size, calculate_overlay_edge,
    calculate_stack_layout,
};
pub use operations::{
    ComposeConfig, ComposeRequest, QrConfig, compose_thumbnail, generate_qr, plan_compose,
    plan_conversion,
};
pub use params::{ComposeParams, ConvertParams, EcLevel, QrParams, Quality, ShadowStyle};
pub use rust_backend::{RustBackend, is_writable_extension, supported_input_extensions};
