//! Shared test utilities for the qrthumb test suite.
//!
//! Synthetic inputs are written with explicit encoders, so a helper produces
//! the format it names regardless of the file extension it is given. Tests
//! rely on that to check that formats are guessed from content.

use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

/// Create a small valid JPEG file with a gradient of the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create an RGBA PNG: a black square on white with a transparent border,
/// roughly the shape of a QR overlay with a cut-out margin.
pub fn create_test_png_rgba(path: &Path, width: u32, height: u32) {
    let margin_x = width / 10;
    let margin_y = height / 10;
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= margin_x
            && y >= margin_y
            && x < width - margin_x
            && y < height - margin_y;
        if !inside {
            Rgba([0, 0, 0, 0])
        } else if (x / 4 + y / 4) % 2 == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
}
