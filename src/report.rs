//! Result sink shared by all workers.
//!
//! Every [`Reporter::report`] call runs under one lock: the log line, the
//! subscriber message and the stored copy of a result are emitted together, so
//! output from different workers never interleaves mid-line. Results from
//! different workers arrive in no particular order.

use crate::task::{OperationKind, Outcome, TaskResult};
use serde::Serialize;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Default)]
struct ReporterState {
    results: Vec<TaskResult>,
    subscriber: Option<Sender<TaskResult>>,
}

#[derive(Default)]
pub struct Reporter {
    state: Mutex<ReporterState>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that also forwards every result to the returned receiver.
    ///
    /// The receiver's iterator ends when the reporter is dropped.
    pub fn with_channel() -> (Self, Receiver<TaskResult>) {
        let (tx, rx) = channel();
        let reporter = Self {
            state: Mutex::new(ReporterState {
                results: Vec::new(),
                subscriber: Some(tx),
            }),
        };
        (reporter, rx)
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record one result. Safe to call from any number of threads.
    pub fn report(&self, result: TaskResult) {
        let mut state = self.lock();

        let worker = result.worker.map(|w| w as i64).unwrap_or(-1);
        if result.success() {
            info!(
                task = %result.id,
                worker,
                operation = %result.operation,
                source = %result.source.display(),
                "{}",
                result.message()
            );
        } else {
            warn!(
                task = %result.id,
                worker,
                operation = %result.operation,
                source = %result.source.display(),
                "{}",
                result.message()
            );
        }

        // A dropped receiver only means nobody is listening anymore.
        let disconnected = state
            .subscriber
            .as_ref()
            .is_some_and(|tx| tx.send(result.clone()).is_err());
        if disconnected {
            state.subscriber = None;
        }
        state.results.push(result);
    }

    /// Copy of every result reported so far, in arrival order.
    pub fn results(&self) -> Vec<TaskResult> {
        self.lock().results.clone()
    }

    /// Move out every result reported so far.
    pub fn take_results(&self) -> Vec<TaskResult> {
        std::mem::take(&mut self.lock().results)
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.lock().results.iter().filter(|r| !r.success()).count()
    }
}

/// Tally of outcomes in a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunCounts {
    pub fn from_results(results: &[TaskResult]) -> Self {
        results.iter().fold(RunCounts::default(), |mut counts, r| {
            match r.outcome {
                Outcome::Success => counts.succeeded += 1,
                Outcome::Cancelled => counts.cancelled += 1,
                Outcome::LoadFailed(_) | Outcome::SaveFailed(_) | Outcome::Panicked(_) => {
                    counts.failed += 1
                }
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }
}

/// Machine-readable record of one batch run, written as `report.json`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub operation: OperationKind,
    pub workers: usize,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub counts: RunCounts,
    /// Sorted by task id.
    pub results: Vec<TaskResult>,
}

impl RunReport {
    pub fn new(
        operation: OperationKind,
        workers: usize,
        elapsed: Duration,
        mut results: Vec<TaskResult>,
    ) -> Self {
        results.sort_by_key(|r| r.id);
        Self {
            operation,
            workers,
            elapsed_ms: elapsed.as_millis() as u64,
            counts: RunCounts::from_results(&results),
            results,
        }
    }
}
