//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Images in train1 (2)
//! 001 cat.jpg
//! 002 dog.png
//! ```
//!
//! ## Run
//!
//! One block per result, printed as results arrive (order across workers is
//! not deterministic), then a summary:
//!
//! ```text
//! #0 rotate cat.jpg → processed_images/processed_cat.jpg_rotate.jpg (worker 1)
//! #1 rotate FAILED dog.png (worker 0)
//!     load failed: IO error: No such file or directory (os error 2)
//! #2 rotate CANCELLED owl.bmp
//!
//! 3 tasks: 1 succeeded, 1 failed, 1 cancelled in 0.42s
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::report::RunCounts;
use crate::scan::SourceImage;
use crate::task::{Outcome, TaskResult};
use std::path::Path;
use std::time::Duration;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(images: &[SourceImage], input_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Images in {} ({})",
        input_dir.display(),
        images.len()
    )];
    if images.is_empty() {
        lines.push("    (none)".to_string());
    }
    for image in images {
        lines.push(format!("{} {}", format_index(image.index), image.name));
    }
    lines
}

pub fn print_scan_output(images: &[SourceImage], input_dir: &Path) {
    for line in format_scan_output(images, input_dir) {
        println!("{}", line);
    }
}

/// Warnings for `--select` indices that name no image.
pub fn format_selection_warnings(out_of_range: &[usize], available: usize) -> Vec<String> {
    out_of_range
        .iter()
        .map(|index| {
            format!(
                "Skipping index {}: no such image ({} available)",
                index, available
            )
        })
        .collect()
}

// ============================================================================
// Run
// ============================================================================

/// Format one task result.
///
/// Success is a single line; failures add an indented reason line.
pub fn format_result(result: &TaskResult) -> Vec<String> {
    let source = file_name(&result.source);
    let worker = result
        .worker
        .map(|w| format!(" (worker {})", w))
        .unwrap_or_default();

    match &result.outcome {
        Outcome::Success => vec![format!(
            "{} {} {} → {}{}",
            result.id,
            result.operation,
            source,
            result.output.display(),
            worker
        )],
        Outcome::LoadFailed(_) | Outcome::SaveFailed(_) | Outcome::Panicked(_) => vec![
            format!("{} {} FAILED {}{}", result.id, result.operation, source, worker),
            format!("    {}", result.message()),
        ],
        Outcome::Cancelled => vec![format!(
            "{} {} CANCELLED {}",
            result.id, result.operation, source
        )],
    }
}

pub fn print_result(result: &TaskResult) {
    for line in format_result(result) {
        println!("{}", line);
    }
}

pub fn format_summary(results: &[TaskResult], elapsed: Duration) -> Vec<String> {
    let counts = RunCounts::from_results(results);
    let mut summary = format!(
        "{} task{}: {} succeeded, {} failed",
        counts.total(),
        if counts.total() == 1 { "" } else { "s" },
        counts.succeeded,
        counts.failed
    );
    if counts.cancelled > 0 {
        summary.push_str(&format!(", {} cancelled", counts.cancelled));
    }
    summary.push_str(&format!(" in {:.2}s", elapsed.as_secs_f64()));
    vec![String::new(), summary]
}

pub fn print_summary(results: &[TaskResult], elapsed: Duration) {
    for line in format_summary(results, elapsed) {
        println!("{}", line);
    }
}
