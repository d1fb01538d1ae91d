//! Image processing: pixel buffers, transforms and the codec seam.
//!
//! | Operation | Implementation |
//! |---|---|
//! | **Resize** | nearest neighbor, [`transforms::resize`] |
//! | **Rotate 90°** | clockwise permutation, [`transforms::rotate_90`] |
//! | **Digital zoom** | clamped crop + nearest neighbor, [`transforms::digital_zoom`] |
//! | **Decode / encode** | [`ImageCodec`] trait, [`RustCodec`] on the `image` crate |
//!
//! The module is split into:
//! - **Buffer**: [`PixelBuffer`], the owned raster every stage passes along
//! - **Calculations**: Pure coordinate math (unit testable)
//! - **Parameters**: Validated operation parameters
//! - **Transforms**: Pure buffer-to-buffer functions
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]

pub mod backend;
pub mod buffer;
pub mod calculations;
mod params;
pub mod rust_backend;
pub mod transforms;

pub use backend::{CodecError, ImageCodec};
pub use buffer::{BufferError, PixelBuffer};
pub use params::{ParamError, Quality, ResizeParams, ZoomParams};
pub use rust_backend::RustCodec;
pub use transforms::{digital_zoom, resize, rotate_90};
