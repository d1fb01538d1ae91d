//! Owned raster storage.
//!
//! A [`PixelBuffer`] is a tightly packed, row-major array of 8-bit samples with
//! `channels` interleaved samples per pixel. There is no stride or padding:
//! pixel `(x, y)` starts at `(y * width + x) * channels`.
//!
//! Buffers are moved, never shared. The codec hands a freshly decoded buffer to
//! a worker, a transform returns a new buffer, and `save` consumes it. Memory is
//! released exactly once when the owning value is dropped.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("sample length {actual} does not match {width}x{height}x{channels} (expected {expected})")]
    LengthMismatch {
        width: u32,
        height: u32,
        channels: u32,
        expected: usize,
        actual: usize,
    },
}

/// In-memory image: `width × height` pixels of `channels` byte samples each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u32,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer.
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
            samples: vec![0; sample_len(width, height, channels)],
        }
    }

    /// Wrap existing samples, checking the length against the dimensions.
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u32,
        samples: Vec<u8>,
    ) -> Result<Self, BufferError> {
        let expected = sample_len(width, height, channels);
        if samples.len() != expected {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                channels,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Build a buffer by evaluating `f` for every pixel.
    ///
    /// `f` must return exactly `channels` samples; extra samples are ignored
    /// and missing ones stay zero.
    pub fn from_fn<F>(width: u32, height: u32, channels: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Vec<u8>,
    {
        let mut buffer = Self::new(width, height, channels);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                let dst = buffer.pixel_mut(x, y);
                let n = dst.len().min(px.len());
                dst[..n].copy_from_slice(&px[..n]);
            }
        }
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when the buffer holds no samples (any dimension is zero).
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.samples
    }

    /// Give up the buffer, returning its samples.
    pub fn into_raw(self) -> Vec<u8> {
        self.samples
    }

    /// Samples of pixel `(x, y)`.
    ///
    /// # Panics
    /// When `(x, y)` lies outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let start = self.offset(x, y);
        &self.samples[start..start + self.channels as usize]
    }

    /// Mutable samples of pixel `(x, y)`.
    ///
    /// # Panics
    /// When `(x, y)` lies outside the buffer.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let start = self.offset(x, y);
        let channels = self.channels as usize;
        &mut self.samples[start..start + channels]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }
}

fn sample_len(width: u32, height: u32, channels: u32) -> usize {
    width as usize * height as usize * channels as usize
}
