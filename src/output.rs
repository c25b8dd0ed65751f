//! CLI output formatting.
//!
//! Every command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Compose
//!
//! ```text
//! Saved thumbnail_horizontal.png
//!     Size: 1280x720
//!     Overlay: 240x240 at (520, 202)
//!     Caption: 36px, built-in font
//! ```
//!
//! ## QR
//!
//! ```text
//! Saved qr.png
//!     Size: 290x290
//! ```
//!
//! ## Convert
//!
//! ```text
//! Converting maison.png to maison.jpg...
//!     Saved: maison.jpg
//! Converting broken.png to broken.jpg...
//!     Failed: broken.png: Processing failed: ...
//!
//! Converted 1 image, 1 failed
//! ```

use crate::convert::{ConvertEvent, ConvertReport};
use crate::imaging::{ComposeOutcome, FontChoice};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Compose
// ============================================================================

pub fn format_compose_outcome(outcome: &ComposeOutcome) -> Vec<String> {
    let font = match &outcome.font {
        FontChoice::File(path) => file_name(path),
        FontChoice::BuiltIn => "built-in font".to_string(),
    };
    vec![
        format!("Saved {}", outcome.output.display()),
        format!(
            "{}Size: {}x{}",
            indent(1),
            outcome.size.width,
            outcome.size.height
        ),
        format!(
            "{}Overlay: {}x{} at ({}, {})",
            indent(1),
            outcome.overlay.width,
            outcome.overlay.height,
            outcome.overlay.x,
            outcome.overlay.y
        ),
        format!("{}Caption: {}px, {}", indent(1), outcome.font_size, font),
    ]
}

pub fn print_compose_outcome(outcome: &ComposeOutcome) {
    for line in format_compose_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// QR
// ============================================================================

pub fn format_qr_output(output: &Path, dims: (u32, u32)) -> Vec<String> {
    vec![
        format!("Saved {}", output.display()),
        format!("{}Size: {}x{}", indent(1), dims.0, dims.1),
    ]
}

pub fn print_qr_output(output: &Path, dims: (u32, u32)) {
    for line in format_qr_output(output, dims) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert
// ============================================================================

/// Format one progress event.
pub fn format_convert_event(event: &ConvertEvent) -> Vec<String> {
    match event {
        ConvertEvent::Converting { source, output } => vec![format!(
            "Converting {} to {}...",
            file_name(source),
            file_name(output)
        )],
        ConvertEvent::Saved { output } => {
            vec![format!("{}Saved: {}", indent(1), file_name(output))]
        }
        ConvertEvent::Failed { source, message } => vec![format!(
            "{}Failed: {}: {}",
            indent(1),
            file_name(source),
            message
        )],
    }
}

/// Format the closing summary of a batch run.
pub fn format_convert_summary(report: &ConvertReport) -> Vec<String> {
    let mut summary = format!("Converted {}", plural(report.converted.len(), "image"));
    if !report.failed.is_empty() {
        summary.push_str(&format!(", {} failed", report.failed.len()));
    }
    vec![String::new(), summary]
}

pub fn print_convert_summary(report: &ConvertReport) {
    for line in format_convert_summary(report) {
        println!("{}", line);
    }
}
