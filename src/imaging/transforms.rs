//! Pixel transforms.
//!
//! Each transform reads a borrowed source and returns a newly allocated
//! destination; none mutate the source. They hold no shared state, so workers
//! may run them concurrently on their own buffers.
//!
//! | Transform | Output size | Sampling |
//! |---|---|---|
//! | [`resize`] | `width × height` | nearest neighbor, truncating |
//! | [`rotate_90`] | `src.height × src.width` | exact permutation (clockwise) |
//! | [`digital_zoom`] | `out_width × out_height` | nearest neighbor over a crop window, clamped |
//!
//! An empty source always produces an empty destination.

use super::buffer::PixelBuffer;
use super::calculations::{ZoomWindow, nearest_index, rotated_position};
use super::params::ZoomParams;

/// Nearest-neighbor resize to `width × height`.
///
/// Destination pixel `(x, y)` copies source pixel
/// `(x * src.width / width, y * src.height / height)`. A zero target
/// dimension yields an empty buffer.
pub fn resize(src: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    if src.is_empty() || width == 0 || height == 0 {
        return PixelBuffer::new(0, 0, src.channels());
    }
    let (src_w, src_h) = src.dimensions();
    let mut dst = PixelBuffer::new(width, height, src.channels());
    for y in 0..height {
        let sy = nearest_index(y, height, src_h);
        for x in 0..width {
            let sx = nearest_index(x, width, src_w);
            dst.pixel_mut(x, y).copy_from_slice(src.pixel(sx, sy));
        }
    }
    dst
}

/// Clockwise quarter turn: source `(x, y)` lands on `(src.height - 1 - y, x)`.
pub fn rotate_90(src: &PixelBuffer) -> PixelBuffer {
    if src.is_empty() {
        return PixelBuffer::new(0, 0, src.channels());
    }
    let (src_w, src_h) = src.dimensions();
    let mut dst = PixelBuffer::new(src_h, src_w, src.channels());
    for y in 0..src_h {
        for x in 0..src_w {
            let (dx, dy) = rotated_position(x, y, src_h);
            dst.pixel_mut(dx, dy).copy_from_slice(src.pixel(x, y));
        }
    }
    dst
}

/// Crop a `src / level` window around the focus point and scale it to the
/// output size.
///
/// Every sampled coordinate is clamped into the source, so windows hanging
/// off an edge (focus near a border, or `level < 1`) repeat edge pixels
/// instead of reading out of bounds.
pub fn digital_zoom(src: &PixelBuffer, params: &ZoomParams) -> PixelBuffer {
    let out = (params.out_width(), params.out_height());
    if src.is_empty() {
        return PixelBuffer::new(0, 0, src.channels());
    }
    let window = ZoomWindow::new(src.dimensions(), params.center(), params.level());
    let mut dst = PixelBuffer::new(out.0, out.1, src.channels());
    for y in 0..out.1 {
        for x in 0..out.0 {
            let (sx, sy) = window.sample(x, y, out, src.dimensions());
            dst.pixel_mut(x, y).copy_from_slice(src.pixel(sx, sy));
        }
    }
    dst
}
