//! Shared test utilities.
//!
//! Deterministic fixtures for the transform, codec and pool tests: a gradient
//! [`PixelBuffer`] whose samples differ by position and channel, and a small
//! real PNG on disk for codec tests.

use crate::imaging::PixelBuffer;
use std::path::Path;

/// Buffer whose sample at `(x, y, ch)` is `(x*7 + y*13 + ch*31) % 256`.
pub fn gradient_buffer(width: u32, height: u32, channels: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, channels, |x, y| {
        (0..channels)
            .map(|ch| ((x * 7 + y * 13 + ch * 31) % 256) as u8)
            .collect()
    })
}

/// Write a `width`×`height` RGB gradient PNG to `path`.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 10 % 256) as u8, (y * 10 % 256) as u8, 128])
    });
    img.save(path).unwrap();
}
