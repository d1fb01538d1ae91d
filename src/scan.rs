//! Source image discovery.
//!
//! Lists the candidate images in an input directory (non-recursive) and lets
//! the caller pick a subset by 1-based index, the way the numbered listing of
//! the `scan` command presents them.
//!
//! ```text
//! train1/
//! ├── cat.jpg        → [1] cat.jpg
//! ├── dog.PNG        → [2] dog.PNG
//! ├── notes.txt      (ignored)
//! └── nested/        (ignored, not descended into)
//! ```

use crate::imaging::rust_backend::INPUT_EXTENSIONS;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl From<walkdir::Error> for ScanError {
    fn from(e: walkdir::Error) -> Self {
        ScanError::Io(e.into())
    }
}

/// One listed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    /// 1-based position in the sorted listing.
    pub index: usize,
    pub path: PathBuf,
    /// File name, for display.
    pub name: String,
}

/// List supported images directly inside `dir`, sorted by file name.
pub fn scan(dir: &Path) -> Result<Vec<SourceImage>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            paths.push(entry.into_path());
        }
    }

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| SourceImage {
            index: i + 1,
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
        })
        .collect())
}

/// Whether the extension names a readable input format (case-insensitive).
pub fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    INPUT_EXTENSIONS.contains(&ext.as_str())
}

/// Outcome of picking images by index.
#[derive(Debug, Default, PartialEq)]
pub struct Selection {
    /// Chosen images in the order requested, each at most once.
    pub images: Vec<SourceImage>,
    /// Requested indices that name no image.
    pub out_of_range: Vec<usize>,
}

/// Pick images by 1-based index. Duplicates are ignored; invalid indices are
/// collected rather than failing the whole selection.
pub fn select_by_index(images: &[SourceImage], indices: &[usize]) -> Selection {
    let mut seen = HashSet::new();
    let mut selection = Selection::default();
    for &index in indices {
        match index.checked_sub(1).and_then(|i| images.get(i)) {
            Some(image) => {
                if seen.insert(index) {
                    selection.images.push(image.clone());
                }
            }
            None => selection.out_of_range.push(index),
        }
    }
    selection
}
