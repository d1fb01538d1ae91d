//! Output file naming.
//!
//! Every output lands directly in the output directory. The name is derived
//! from the source file name and the operation:
//!
//! | Operation | Source `cat.jpg` becomes |
//! |---|---|
//! | zoom | `processed_cat.jpg_zoom.jpg` |
//! | rotate | `processed_cat.jpg_rotate.jpg` |
//! | resize | `processed_cat.jpg_resize.jpg` |
//! | convert | `cat.png` |
//!
//! The full source name (extension included) is kept for the transform outputs
//! so `cat.jpg` and `cat.png` never collide. Conversion replaces the extension,
//! which is what selects the PNG encoder.

use crate::scan::SourceImage;
use crate::task::{Operation, OperationKind, Task};
use std::path::{Path, PathBuf};

/// Used when the source path has no file name component.
const FALLBACK_NAME: &str = "image";

/// File name of the output for `source` under `kind`.
pub fn output_file_name(source: &Path, kind: OperationKind) -> String {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_NAME.to_string());

    match kind {
        OperationKind::Zoom => format!("processed_{file_name}_zoom.jpg"),
        OperationKind::Rotate90 => format!("processed_{file_name}_rotate.jpg"),
        OperationKind::Resize => format!("processed_{file_name}_resize.jpg"),
        OperationKind::FormatConvert => {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| FALLBACK_NAME.to_string());
            format!("{stem}.png")
        }
    }
}

pub fn output_path(output_dir: &Path, source: &Path, kind: OperationKind) -> PathBuf {
    output_dir.join(output_file_name(source, kind))
}

/// One task per image, all running `operation`, outputs under `output_dir`.
pub fn plan_tasks(images: &[SourceImage], operation: Operation, output_dir: &Path) -> Vec<Task> {
    images
        .iter()
        .map(|image| {
            let output = output_path(output_dir, &image.path, operation.kind());
            Task::new(image.path.clone(), operation, output)
        })
        .collect()
}
