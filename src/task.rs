//! Units of work and their outcomes.
//!
//! A [`Task`] binds a source image, an [`Operation`] and an output path. It is
//! immutable once built and consumed by exactly one worker. The worker turns
//! it into a [`TaskResult`], which is never mutated after creation.

use crate::imaging::{PixelBuffer, ResizeParams, ZoomParams, digital_zoom, resize, rotate_90};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Transform to apply. Parameters are validated when they are built, so every
/// `Operation` value is runnable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Zoom(ZoomParams),
    Rotate90,
    Resize(ResizeParams),
    /// Pixels pass through untouched; the output extension picks the new format.
    FormatConvert,
}

/// Parameter-free label of an [`Operation`], used in results and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Zoom,
    Rotate90,
    Resize,
    FormatConvert,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationKind::Zoom => "zoom",
            OperationKind::Rotate90 => "rotate",
            OperationKind::Resize => "resize",
            OperationKind::FormatConvert => "convert",
        };
        f.write_str(label)
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Zoom(_) => OperationKind::Zoom,
            Operation::Rotate90 => OperationKind::Rotate90,
            Operation::Resize(_) => OperationKind::Resize,
            Operation::FormatConvert => OperationKind::FormatConvert,
        }
    }

    /// Run the transform. Consumes the source; it is dropped once the
    /// destination exists (or returned as-is for [`Operation::FormatConvert`]).
    pub fn apply(&self, source: PixelBuffer) -> PixelBuffer {
        match self {
            Operation::Zoom(params) => digital_zoom(&source, params),
            Operation::Rotate90 => rotate_90(&source),
            Operation::Resize(params) => resize(&source, params.width(), params.height()),
            Operation::FormatConvert => source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    source: PathBuf,
    operation: Operation,
    output: PathBuf,
}

impl Task {
    pub fn new(
        source: impl Into<PathBuf>,
        operation: Operation,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            operation,
            output: output.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Pool-assigned, unique per pool, increasing in enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    LoadFailed(String),
    SaveFailed(String),
    /// Processing panicked; carries the panic message.
    Panicked(String),
    /// Still queued when the pool stopped.
    Cancelled,
}

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub id: TaskId,
    pub source: PathBuf,
    pub output: PathBuf,
    pub operation: OperationKind,
    /// Index of the worker that ran the task; `None` if it never ran.
    pub worker: Option<usize>,
    pub outcome: Outcome,
}

impl TaskResult {
    pub fn new(id: TaskId, task: &Task, worker: Option<usize>, outcome: Outcome) -> Self {
        Self {
            id,
            source: task.source.clone(),
            output: task.output.clone(),
            operation: task.operation.kind(),
            worker,
            outcome,
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn message(&self) -> String {
        match &self.outcome {
            Outcome::Success => format!("{} done", self.operation),
            Outcome::LoadFailed(reason) => format!("load failed: {reason}"),
            Outcome::SaveFailed(reason) => format!("save failed: {reason}"),
            Outcome::Panicked(reason) => format!("panicked: {reason}"),
            Outcome::Cancelled => "cancelled before processing".to_string(),
        }
    }
}
