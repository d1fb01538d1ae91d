//! Pure coordinate math for the transforms.
//!
//! All functions here are pure and testable without any pixel data.

/// Nearest-neighbor source index for destination index `dst` when a span of
/// `src_len` samples is stretched to `dst_len`.
///
/// Truncating integer division, so `dst = 0` always maps to `0` and the result
/// is always `< src_len` for `dst < dst_len`.
///
/// ```
/// # use imgpool::imaging::calculations::nearest_index;
/// assert_eq!(nearest_index(0, 50, 100), 0);
/// assert_eq!(nearest_index(49, 50, 100), 98);
/// assert_eq!(nearest_index(3, 10, 10), 3);
/// ```
pub fn nearest_index(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    (dst as u64 * src_len as u64 / dst_len as u64) as u32
}

/// Destination of source pixel `(x, y)` after a clockwise quarter turn of an
/// image `src_height` pixels tall.
///
/// # Panics
///
/// Panics if `y >= src_height`.
pub fn rotated_position(x: u32, y: u32, src_height: u32) -> (u32, u32) {
    (src_height - 1 - y, x)
}

/// Crop rectangle of a digital zoom, in source pixel space.
///
/// The start corner may be negative and the far edge may lie past the source;
/// [`ZoomWindow::sample`] clamps every coordinate it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomWindow {
    pub start_x: i64,
    pub start_y: i64,
    pub width: f64,
    pub height: f64,
}

impl ZoomWindow {
    /// Window of `src / level` centered on `center` (as fractions of the source).
    ///
    /// ```
    /// # use imgpool::imaging::calculations::ZoomWindow;
    /// let w = ZoomWindow::new((100, 50), (0.5, 0.5), 2.0);
    /// assert_eq!((w.start_x, w.start_y), (25, 12));
    /// assert_eq!((w.width, w.height), (50.0, 25.0));
    /// ```
    pub fn new(src: (u32, u32), center: (f32, f32), level: f32) -> Self {
        let (src_w, src_h) = (src.0 as f64, src.1 as f64);
        let level = level as f64;
        let width = src_w / level;
        let height = src_h / level;
        Self {
            start_x: (src_w * center.0 as f64 - width / 2.0) as i64,
            start_y: (src_h * center.1 as f64 - height / 2.0) as i64,
            width,
            height,
        }
    }

    /// Source pixel sampled for output pixel `(x, y)` of an `out` frame,
    /// clamped into a `src` sized image.
    ///
    /// A start corner pinned at the `i64` limits (centers far outside the
    /// image) saturates instead of overflowing, so it still clamps to an edge.
    pub fn sample(&self, x: u32, y: u32, out: (u32, u32), src: (u32, u32)) -> (u32, u32) {
        let sx = self
            .start_x
            .saturating_add((x as f64 * self.width / out.0 as f64) as i64);
        let sy = self
            .start_y
            .saturating_add((y as f64 * self.height / out.1 as f64) as i64);
        (clamp_axis(sx, src.0), clamp_axis(sy, src.1))
    }
}

fn clamp_axis(v: i64, len: u32) -> u32 {
    v.clamp(0, len as i64 - 1) as u32
}
