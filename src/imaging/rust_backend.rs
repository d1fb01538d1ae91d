//! Pure Rust codec on top of the `image` crate.
//!
//! ## Format mapping
//!
//! | Extension | Decode | Encode |
//! |---|---|---|
//! | `jpg`, `jpeg` | yes | baseline JPEG at the configured [`Quality`], alpha dropped |
//! | `png` | yes | lossless, all channel layouts |
//! | `bmp` | yes | uncompressed |
//! | `tif`, `tiff` | yes | uncompressed |
//! | `webp` | yes | lossless, RGB or RGBA |
//!
//! Decoded images keep their 8-bit channel layout (gray, gray+alpha, RGB,
//! RGBA). Deeper or float images are narrowed to 8-bit RGB/RGBA.

use super::backend::{CodecError, ImageCodec};
use super::buffer::PixelBuffer;
use super::params::Quality;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Extensions accepted as batch input.
pub const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Extensions [`RustCodec::save`] can write.
pub const OUTPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Codec backed by the `image` crate's pure Rust decoders and encoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCodec {
    quality: Quality,
}

impl RustCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec writing lossy formats at `quality`.
    pub fn with_quality(quality: Quality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn output_format(path: &Path) -> Result<ImageFormat, CodecError> {
    match extension_of(path).as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "bmp" => Ok(ImageFormat::Bmp),
        "tif" | "tiff" => Ok(ImageFormat::Tiff),
        "webp" => Ok(ImageFormat::WebP),
        "" => Err(CodecError::UnsupportedFormat(format!(
            "{} has no extension",
            path.display()
        ))),
        other => Err(CodecError::UnsupportedFormat(other.to_string())),
    }
}

/// Move a decoded image into a [`PixelBuffer`], keeping 8-bit layouts as-is.
fn into_pixel_buffer(img: DynamicImage) -> Result<PixelBuffer, CodecError> {
    let (width, height) = (img.width(), img.height());
    let (channels, samples) = match img.color() {
        ColorType::L8 => (1, img.into_luma8().into_raw()),
        ColorType::La8 => (2, img.into_luma_alpha8().into_raw()),
        ColorType::Rgb8 => (3, img.into_rgb8().into_raw()),
        ColorType::Rgba8 => (4, img.into_rgba8().into_raw()),
        other if other.has_alpha() => (4, img.into_rgba8().into_raw()),
        _ => (3, img.into_rgb8().into_raw()),
    };
    PixelBuffer::from_raw(width, height, channels, samples)
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// Wrap a [`PixelBuffer`] as a `DynamicImage` without copying samples.
fn into_dynamic(buffer: PixelBuffer) -> Result<DynamicImage, CodecError> {
    let (width, height) = buffer.dimensions();
    let channels = buffer.channels();
    let raw = buffer.into_raw();
    let img = match channels {
        1 => image::GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
        2 => image::GrayAlphaImage::from_raw(width, height, raw).map(DynamicImage::ImageLumaA8),
        3 => image::RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
        4 => image::RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8),
        n => {
            return Err(CodecError::Encode(format!(
                "unsupported channel count: {n}"
            )));
        }
    };
    img.ok_or_else(|| CodecError::Encode("sample buffer does not match dimensions".into()))
}

/// Convert to a channel layout the target encoder accepts.
fn fit_layout(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match (format, img.color()) {
        (ImageFormat::Jpeg, ColorType::La8) => DynamicImage::ImageLuma8(img.into_luma8()),
        (ImageFormat::Jpeg, ColorType::Rgba8) => DynamicImage::ImageRgb8(img.into_rgb8()),
        (ImageFormat::WebP, ColorType::L8) => DynamicImage::ImageRgb8(img.into_rgb8()),
        (ImageFormat::WebP | ImageFormat::Tiff, ColorType::La8) => {
            DynamicImage::ImageRgba8(img.into_rgba8())
        }
        _ => img,
    }
}

impl ImageCodec for RustCodec {
    fn load(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| CodecError::Decode(format!("{}: {}", path.display(), e)))?;
        into_pixel_buffer(img)
    }

    fn save(&self, path: &Path, buffer: PixelBuffer) -> Result<(), CodecError> {
        let format = output_format(path)?;
        if buffer.is_empty() {
            return Err(CodecError::Encode(format!(
                "refusing to write empty image to {}",
                path.display()
            )));
        }
        let img = fit_layout(into_dynamic(buffer)?, format);

        if format == ImageFormat::Jpeg {
            let file = std::fs::File::create(path)?;
            let writer = std::io::BufWriter::new(file);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                writer,
                self.quality.value() as u8,
            );
            return img
                .write_with_encoder(encoder)
                .map_err(|e| CodecError::Encode(format!("JPEG encode failed: {}", e)));
        }

        img.save_with_format(path, format)
            .map_err(|e| CodecError::Encode(format!("{}: {}", path.display(), e)))
    }
}
