//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. Construction is
//! where caller mistakes are caught: a [`ZoomParams`] or [`ResizeParams`] that
//! exists is valid, so the transforms and the worker pool never see a zero
//! output size or a non-positive zoom level.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1 to 100, default 90). Clamped on construction.
//! - [`ResizeParams`]: target dimensions for a nearest-neighbor resize.
//! - [`ZoomParams`]: output size, focus point and magnification for a digital zoom.

use serde::Serialize;
use thiserror::Error;

/// Caller contract violations, reported synchronously at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("output dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("zoom level must be a finite value greater than 0, got {0}")]
    InvalidZoomLevel(f32),
    #[error("zoom center ratios must be finite, got ({0}, {1})")]
    InvalidCenter(f32, f32),
}

/// Quality setting for lossy image encoding (1-100).
///
/// Only [`Quality::new`] builds one, so the value is always in range:
///
/// ```
/// # use imgpool::imaging::Quality;
/// assert_eq!(Quality::new(300).value(), 100);
/// ```
///
/// ```compile_fail
/// # use imgpool::imaging::Quality;
/// let unchecked = Quality(300);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(u32);

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

/// Target size for [`resize`](super::transforms::resize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizeParams {
    width: u32,
    height: u32,
}

impl ResizeParams {
    pub fn new(width: u32, height: u32) -> Result<Self, ParamError> {
        check_dimensions(width, height)?;
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Digital zoom settings.
///
/// - `center_x`, `center_y`: focus point as a fraction of the source size
///   (`0.5, 0.5` is the middle). Values outside `0..=1` are accepted; sampling
///   is clamped to the source.
/// - `level`: magnification. `2.0` crops half the width and half the height;
///   values below `1.0` crop a window larger than the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomParams {
    out_width: u32,
    out_height: u32,
    center_x: f32,
    center_y: f32,
    level: f32,
}

impl ZoomParams {
    pub fn new(
        out_width: u32,
        out_height: u32,
        center_x: f32,
        center_y: f32,
        level: f32,
    ) -> Result<Self, ParamError> {
        check_dimensions(out_width, out_height)?;
        if !level.is_finite() || level <= 0.0 {
            return Err(ParamError::InvalidZoomLevel(level));
        }
        if !center_x.is_finite() || !center_y.is_finite() {
            return Err(ParamError::InvalidCenter(center_x, center_y));
        }
        Ok(Self {
            out_width,
            out_height,
            center_x,
            center_y,
            level,
        })
    }

    /// Centered 2x zoom into a 500x500 frame.
    pub fn centered() -> Self {
        Self {
            out_width: 500,
            out_height: 500,
            center_x: 0.5,
            center_y: 0.5,
            level: 2.0,
        }
    }

    pub fn out_width(&self) -> u32 {
        self.out_width
    }

    pub fn out_height(&self) -> u32 {
        self.out_height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x, self.center_y)
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), ParamError> {
    if width == 0 || height == 0 {
        return Err(ParamError::ZeroDimension { width, height });
    }
    Ok(())
}
