//! Image codec trait and shared error type.
//!
//! The [`ImageCodec`] trait is the boundary between the worker pool and
//! whatever turns files into pixels and back. The pool only ever calls
//! [`load`](ImageCodec::load) and [`save`](ImageCodec::save); it never sees a
//! file format.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` crate.

use super::buffer::PixelBuffer;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Decode/encode capability consumed by the worker pool.
///
/// Implementations are shared by every worker, hence `Send + Sync`.
pub trait ImageCodec: Send + Sync {
    /// Read and decode the image at `path` into an owned buffer.
    fn load(&self, path: &Path) -> Result<PixelBuffer, CodecError>;

    /// Encode `buffer` to `path`. The format is chosen from the extension.
    /// Takes ownership; the buffer is released once encoding finishes.
    fn save(&self, path: &Path, buffer: PixelBuffer) -> Result<(), CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory codec that records operations instead of touching the disk.
    /// Uses Mutex (not RefCell) so it is Sync and can be shared by workers.
    #[derive(Default)]
    pub struct MockCodec {
        pub sources: Mutex<HashMap<PathBuf, PixelBuffer>>,
        pub failing_outputs: Mutex<HashSet<PathBuf>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load(String),
        Save {
            path: String,
            width: u32,
            height: u32,
            channels: u32,
        },
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register `buffer` as the decoded content of `path`.
        pub fn with_source(self, path: impl Into<PathBuf>, buffer: PixelBuffer) -> Self {
            self.sources.lock().unwrap().insert(path.into(), buffer);
            self
        }

        /// Make every save to `path` fail.
        pub fn failing_save(self, path: impl Into<PathBuf>) -> Self {
            self.failing_outputs.lock().unwrap().insert(path.into());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn saved_paths(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Save { path, .. } => Some(path),
                    RecordedOp::Load(_) => None,
                })
                .collect()
        }
    }

    impl ImageCodec for MockCodec {
        fn load(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Load(path.to_string_lossy().to_string()));

            self.sources
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| {
                    CodecError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no mock source for {}", path.display()),
                    ))
                })
        }

        fn save(&self, path: &Path, buffer: PixelBuffer) -> Result<(), CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Save {
                path: path.to_string_lossy().to_string(),
                width: buffer.width(),
                height: buffer.height(),
                channels: buffer.channels(),
            });
            if self.failing_outputs.lock().unwrap().contains(path) {
                return Err(CodecError::Encode(format!(
                    "mock refused to write {}",
                    path.display()
                )));
            }
            Ok(())
        }
    }

    #[test]
    fn mock_loads_registered_source() {
        let codec = MockCodec::new().with_source("/in/a.png", PixelBuffer::new(4, 2, 3));

        let buffer = codec.load(Path::new("/in/a.png")).unwrap();
        assert_eq!(buffer.dimensions(), (4, 2));

        let ops = codec.get_operations();
        assert_eq!(ops, vec![RecordedOp::Load("/in/a.png".to_string())]);
    }

    #[test]
    fn mock_load_missing_is_io_error() {
        let codec = MockCodec::new();
        let result = codec.load(Path::new("/in/missing.png"));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    #[test]
    fn mock_records_save_dimensions() {
        let codec = MockCodec::new();
        codec
            .save(Path::new("/out/b.jpg"), PixelBuffer::new(5, 6, 1))
            .unwrap();

        assert!(matches!(
            &codec.get_operations()[0],
            RecordedOp::Save {
                width: 5,
                height: 6,
                channels: 1,
                ..
            }
        ));
    }

    #[test]
    fn mock_failing_save() {
        let codec = MockCodec::new().failing_save("/out/bad.jpg");
        let result = codec.save(Path::new("/out/bad.jpg"), PixelBuffer::new(1, 1, 3));
        assert!(matches!(result, Err(CodecError::Encode(_))));
        assert_eq!(codec.saved_paths(), vec!["/out/bad.jpg".to_string()]);
    }
}
