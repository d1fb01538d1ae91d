//! Fixed-size worker pool.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start(n)──▶ Running ──stop()──▶ Stopped
//!   │                                      ▲
//!   └──────────────stop()──────────────────┘
//! ```
//!
//! Tasks may be enqueued while Idle or Running. Each worker loops
//! `Idle → Processing → Idle`: it blocks on the queue, loads the source through
//! the [`ImageCodec`], applies the operation, saves, and reports a
//! [`TaskResult`]. Load and save failures become failed results; they never
//! stop the worker or the pool. A panic while processing a task is caught and
//! reported as [`Outcome::Panicked`]; the worker keeps going.
//!
//! ## Completion
//!
//! An outstanding-task counter goes up on enqueue and down after the task's
//! result has been reported. [`WorkerPool::wait_all`] sleeps on a condition
//! variable until it reaches zero, so a momentarily empty queue with tasks
//! still in flight does not count as done.
//!
//! ## Shutdown
//!
//! [`WorkerPool::stop`] raises the stop flag, closes the queue and joins every
//! worker. A task already picked up runs to completion; tasks still queued are
//! reported as [`Outcome::Cancelled`].
//!
//! ## Locks
//!
//! The queue, the reporter and the counter each have their own lock. None is
//! held while another is taken.

use crate::imaging::ImageCodec;
use crate::queue::TaskQueue;
use crate::report::Reporter;
use crate::task::{Outcome, Task, TaskId, TaskResult};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("worker pool is already running")]
    AlreadyRunning,
    #[error("worker pool has been stopped")]
    Stopped,
    #[error("{pending} task(s) pending but no workers are running")]
    NotRunning { pending: usize },
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Idle,
    Running,
    Stopped,
}

struct QueuedTask {
    id: TaskId,
    task: Task,
}

/// State shared between the pool handle and its workers.
struct Shared {
    queue: TaskQueue<QueuedTask>,
    codec: Arc<dyn ImageCodec>,
    reporter: Reporter,
    stop: AtomicBool,
    outstanding: Mutex<usize>,
    settled: Condvar,
}

impl Shared {
    fn lock_outstanding(&self) -> MutexGuard<'_, usize> {
        self.outstanding.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn task_added(&self) {
        *self.lock_outstanding() += 1;
    }

    fn task_settled(&self) {
        let mut outstanding = self.lock_outstanding();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.settled.notify_all();
        }
    }
}

/// Marks one task as settled when dropped, even if processing unwinds.
struct SettleGuard<'a>(&'a Shared);

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.0.task_settled();
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    state: PoolState,
    next_id: AtomicU64,
}

impl WorkerPool {
    /// Idle pool whose results are only kept in its own [`Reporter`].
    pub fn new(codec: Arc<dyn ImageCodec>) -> Self {
        Self::with_reporter(codec, Reporter::new())
    }

    /// Idle pool reporting into `reporter` (e.g. one made with
    /// [`Reporter::with_channel`]).
    pub fn with_reporter(codec: Arc<dyn ImageCodec>, reporter: Reporter) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: TaskQueue::new(),
                codec,
                reporter,
                stop: AtomicBool::new(false),
                outstanding: Mutex::new(0),
                settled: Condvar::new(),
            }),
            workers: Vec::new(),
            state: PoolState::Idle,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks enqueued but not yet reported.
    pub fn pending(&self) -> usize {
        *self.shared.lock_outstanding()
    }

    /// Tasks waiting in the queue (not yet picked up). A snapshot.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.shared.reporter
    }

    /// Submit a task. Never blocks.
    pub fn enqueue(&self, task: Task) -> Result<TaskId, PoolError> {
        if self.state == PoolState::Stopped {
            return Err(PoolError::Stopped);
        }
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(task = %id, source = %task.source().display(), "enqueued");
        self.shared.task_added();
        self.shared.queue.push(QueuedTask { id, task });
        Ok(id)
    }

    /// Spawn exactly `workers` threads and move to Running.
    ///
    /// If a thread fails to spawn, the workers already started are stopped and
    /// joined, and the pool ends up Stopped (queued tasks are reported as
    /// cancelled). A pool never runs with fewer workers than requested.
    pub fn start(&mut self, workers: usize) -> Result<(), PoolError> {
        self.start_with(workers, |index, shared| {
            thread::Builder::new()
                .name(format!("imgpool-worker-{index}"))
                .spawn(move || run_worker(index, &shared))
        })
    }

    fn start_with<F>(&mut self, workers: usize, mut spawn: F) -> Result<(), PoolError>
    where
        F: FnMut(usize, Arc<Shared>) -> std::io::Result<JoinHandle<()>>,
    {
        match self.state {
            PoolState::Running => return Err(PoolError::AlreadyRunning),
            PoolState::Stopped => return Err(PoolError::Stopped),
            PoolState::Idle => {}
        }
        if workers == 0 {
            return Err(PoolError::ZeroWorkers);
        }

        for index in 0..workers {
            match spawn(index, Arc::clone(&self.shared)) {
                Ok(handle) => self.workers.push(handle),
                Err(e) => {
                    error!(worker = index, error = %e, "failed to spawn worker");
                    self.stop();
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        self.state = PoolState::Running;
        info!(workers, "worker pool started");
        Ok(())
    }

    /// Block until every enqueued task has been reported.
    ///
    /// Fails instead of blocking forever when tasks are pending and no worker
    /// is running.
    pub fn wait_all(&self) -> Result<(), PoolError> {
        let mut outstanding = self.shared.lock_outstanding();
        while *outstanding > 0 {
            if self.state != PoolState::Running {
                return Err(PoolError::NotRunning {
                    pending: *outstanding,
                });
            }
            outstanding = self
                .shared
                .settled
                .wait(outstanding)
                .unwrap_or_else(|e| e.into_inner());
        }
        Ok(())
    }

    /// Signal every worker to exit and join them.
    ///
    /// Returns only after all workers have finished their current task and
    /// exited. Tasks still queued are reported as cancelled. Idempotent.
    pub fn stop(&mut self) {
        if self.state == PoolState::Stopped {
            return;
        }
        self.shared.stop.store(true, Ordering::Release);
        self.shared.queue.close();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }

        for QueuedTask { id, task } in self.shared.queue.drain() {
            warn!(task = %id, source = %task.source().display(), "cancelled by stop");
            let _settle = SettleGuard(&self.shared);
            self.shared
                .reporter
                .report(TaskResult::new(id, &task, None, Outcome::Cancelled));
        }

        self.state = PoolState::Stopped;
        info!("worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(index: usize, shared: &Shared) {
    debug!(worker = index, "worker started");
    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        let Some(QueuedTask { id, task }) = shared.queue.pop() else {
            break;
        };
        let _settle = SettleGuard(shared);
        debug!(worker = index, task = %id, "processing");
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_task(index, shared.codec.as_ref(), id, &task)
        }))
        .unwrap_or_else(|payload| {
            let reason = panic_message(payload.as_ref());
            error!(worker = index, task = %id, reason = %reason, "task panicked");
            TaskResult::new(id, &task, Some(index), Outcome::Panicked(reason))
        });
        shared.reporter.report(result);
    }
    debug!(worker = index, "worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Load, transform, save. Each failure is captured in the result.
fn run_task(worker: usize, codec: &dyn ImageCodec, id: TaskId, task: &Task) -> TaskResult {
    let outcome = match codec.load(task.source()) {
        Err(e) => Outcome::LoadFailed(e.to_string()),
        Ok(source) => {
            let output = task.operation().apply(source);
            match codec.save(task.output(), output) {
                Ok(()) => Outcome::Success,
                Err(e) => Outcome::SaveFailed(e.to_string()),
            }
        }
    };
    TaskResult::new(id, task, Some(worker), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockCodec, RecordedOp};
    use crate::imaging::{CodecError, PixelBuffer, ResizeParams, ZoomParams};
    use crate::task::Operation;
    use crate::test_helpers::gradient_buffer;
    use std::collections::HashSet;
    use std::path::Path;
    use std::time::Duration;

    fn codec_with_sources(n: usize) -> MockCodec {
        (0..n).fold(MockCodec::new(), |codec, i| {
            codec.with_source(format!("/in/{i}.png"), gradient_buffer(4, 2, 3))
        })
    }

    fn rotate_task(i: usize) -> Task {
        Task::new(
            format!("/in/{i}.png"),
            Operation::Rotate90,
            format!("/out/{i}.jpg"),
        )
    }

    /// Codec that takes a while to load, to keep a task in flight.
    struct SlowCodec {
        inner: MockCodec,
        delay: Duration,
    }

    impl ImageCodec for SlowCodec {
        fn load(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
            thread::sleep(self.delay);
            self.inner.load(path)
        }

        fn save(&self, path: &Path, buffer: PixelBuffer) -> Result<(), CodecError> {
            self.inner.save(path, buffer)
        }
    }

    /// Codec whose `load` panics for one path.
    struct PanickingCodec {
        inner: MockCodec,
        panic_on: &'static str,
    }

    impl ImageCodec for PanickingCodec {
        fn load(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
            if path == Path::new(self.panic_on) {
                panic!("decoder blew up on {}", path.display());
            }
            self.inner.load(path)
        }

        fn save(&self, path: &Path, buffer: PixelBuffer) -> Result<(), CodecError> {
            self.inner.save(path, buffer)
        }
    }

    #[test]
    fn eight_tasks_four_workers_one_missing_source() {
        // Sources 0..7 exist, 7 does not.
        let codec = Arc::new(codec_with_sources(7));
        let mut pool = WorkerPool::new(codec.clone());
        pool.start(4).unwrap();
        for i in 0..8 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();

        let results = pool.reporter().results();
        assert_eq!(results.len(), 8);

        let failed: Vec<_> = results.iter().filter(|r| !r.success()).collect();
        assert_eq!(failed.len(), 1);
        assert!(matches!(failed[0].outcome, Outcome::LoadFailed(_)));
        assert_eq!(failed[0].source, Path::new("/in/7.png"));

        let ids: HashSet<TaskId> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(codec.saved_paths().len(), 7);

        pool.stop();
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn many_tasks_each_reported_once() {
        let codec = Arc::new(codec_with_sources(200));
        let mut pool = WorkerPool::new(codec);
        pool.start(3).unwrap();
        for i in 0..200 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();
        assert_eq!(pool.pending(), 0);

        let results = pool.reporter().results();
        assert_eq!(results.len(), 200);
        let sources: HashSet<_> = results.iter().map(|r| r.source.clone()).collect();
        assert_eq!(sources.len(), 200);
        assert!(results.iter().all(TaskResult::success));
    }

    #[test]
    fn tasks_enqueued_before_start_are_processed() {
        let codec = Arc::new(codec_with_sources(3));
        let mut pool = WorkerPool::new(codec.clone());
        for i in 0..3 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        assert_eq!(pool.pending(), 3);
        pool.start(2).unwrap();
        pool.wait_all().unwrap();
        assert_eq!(pool.reporter().len(), 3);

        // 4x2 source rotated to 2x4
        let saves: Vec<_> = codec
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Save { .. }))
            .collect();
        assert_eq!(saves.len(), 3);
        assert!(saves.iter().all(|op| matches!(
            op,
            RecordedOp::Save {
                width: 2,
                height: 4,
                channels: 3,
                ..
            }
        )));
    }

    #[test]
    fn operation_parameters_reach_the_transform() {
        let codec = Arc::new(
            MockCodec::new().with_source("/in/a.png", gradient_buffer(40, 30, 3)),
        );
        let mut pool = WorkerPool::new(codec.clone());
        pool.start(1).unwrap();
        pool.enqueue(Task::new(
            "/in/a.png",
            Operation::Zoom(ZoomParams::new(16, 9, 0.5, 0.5, 2.0).unwrap()),
            "/out/zoom.jpg",
        ))
        .unwrap();
        pool.enqueue(Task::new(
            "/in/a.png",
            Operation::Resize(ResizeParams::new(10, 5).unwrap()),
            "/out/resize.jpg",
        ))
        .unwrap();
        pool.wait_all().unwrap();

        let mut saves: Vec<(String, u32, u32)> = codec
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Save {
                    path,
                    width,
                    height,
                    ..
                } => Some((path, width, height)),
                RecordedOp::Load(_) => None,
            })
            .collect();
        saves.sort();
        assert_eq!(
            saves,
            vec![
                ("/out/resize.jpg".to_string(), 10, 5),
                ("/out/zoom.jpg".to_string(), 16, 9),
            ]
        );
    }

    #[test]
    fn save_failure_is_reported_and_pool_continues() {
        let codec = Arc::new(codec_with_sources(3).failing_save("/out/1.jpg"));
        let mut pool = WorkerPool::new(codec);
        pool.start(2).unwrap();
        for i in 0..3 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();

        let results = pool.reporter().results();
        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.success()).collect();
        assert_eq!(failed.len(), 1);
        assert!(matches!(failed[0].outcome, Outcome::SaveFailed(_)));
        assert_eq!(failed[0].output, Path::new("/out/1.jpg"));
    }

    #[test]
    fn panicking_task_is_reported_and_single_worker_continues() {
        let codec = Arc::new(PanickingCodec {
            inner: codec_with_sources(3),
            panic_on: "/in/0.png",
        });
        let mut pool = WorkerPool::new(codec);
        pool.start(1).unwrap();
        for i in 0..3 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();

        let results = pool.reporter().results();
        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, Path::new("/in/0.png"));
        assert_eq!(failed[0].worker, Some(0));
        match &failed[0].outcome {
            Outcome::Panicked(reason) => assert!(reason.contains("decoder blew up")),
            other => panic!("expected Panicked, got {other:?}"),
        }
        pool.stop();
    }

    #[test]
    fn far_off_zoom_center_does_not_take_down_the_pool() {
        let codec = Arc::new(codec_with_sources(2));
        let mut pool = WorkerPool::new(codec);
        pool.start(1).unwrap();
        pool.enqueue(Task::new(
            "/in/0.png",
            Operation::Zoom(ZoomParams::new(4, 4, 1e30, 0.5, 1.0).unwrap()),
            "/out/0.jpg",
        ))
        .unwrap();
        pool.enqueue(rotate_task(1)).unwrap();
        pool.wait_all().unwrap();

        let results = pool.reporter().results();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(TaskResult::success));
    }

    #[test]
    fn wait_all_across_batches() {
        let codec = Arc::new(codec_with_sources(5));
        let mut pool = WorkerPool::new(codec);
        pool.start(2).unwrap();
        for i in 0..3 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();
        assert_eq!(pool.reporter().len(), 3);

        for i in 3..5 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();
        assert_eq!(pool.reporter().len(), 5);
    }

    #[test]
    fn wait_all_with_nothing_pending_returns_immediately() {
        let pool = WorkerPool::new(Arc::new(MockCodec::new()));
        assert!(pool.wait_all().is_ok());
    }

    #[test]
    fn wait_all_without_workers_is_an_error() {
        let pool = WorkerPool::new(Arc::new(codec_with_sources(2)));
        pool.enqueue(rotate_task(0)).unwrap();
        pool.enqueue(rotate_task(1)).unwrap();
        assert!(matches!(
            pool.wait_all(),
            Err(PoolError::NotRunning { pending: 2 })
        ));
    }

    #[test]
    fn start_rejects_zero_workers() {
        let mut pool = WorkerPool::new(Arc::new(MockCodec::new()));
        assert!(matches!(pool.start(0), Err(PoolError::ZeroWorkers)));
        assert_eq!(pool.state(), PoolState::Idle);
    }

    #[test]
    fn start_twice_is_an_error() {
        let mut pool = WorkerPool::new(Arc::new(MockCodec::new()));
        pool.start(2).unwrap();
        assert_eq!(pool.worker_count(), 2);
        assert!(matches!(pool.start(1), Err(PoolError::AlreadyRunning)));
        assert_eq!(pool.worker_count(), 2);
    }

    #[test]
    fn spawn_failure_joins_started_workers_and_stops() {
        let mut pool = WorkerPool::new(Arc::new(codec_with_sources(2)));
        pool.enqueue(rotate_task(0)).unwrap();
        pool.enqueue(rotate_task(1)).unwrap();

        let result = pool.start_with(4, |index, shared| {
            if index == 2 {
                return Err(std::io::Error::other("out of threads"));
            }
            thread::Builder::new().spawn(move || run_worker(index, &shared))
        });

        assert!(matches!(result, Err(PoolError::Spawn(_))));
        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(pool.pending(), 0);
        // Each task was either run by a started worker or cancelled.
        assert_eq!(pool.reporter().len(), 2);
        assert!(matches!(pool.start(2), Err(PoolError::Stopped)));
    }

    #[test]
    fn stopped_pool_rejects_start_and_enqueue() {
        let mut pool = WorkerPool::new(Arc::new(codec_with_sources(1)));
        pool.start(1).unwrap();
        pool.stop();
        assert_eq!(pool.worker_count(), 0);
        assert!(matches!(pool.start(1), Err(PoolError::Stopped)));
        assert!(matches!(
            pool.enqueue(rotate_task(0)),
            Err(PoolError::Stopped)
        ));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut pool = WorkerPool::new(Arc::new(MockCodec::new()));
        pool.start(2).unwrap();
        pool.stop();
        pool.stop();
        assert_eq!(pool.state(), PoolState::Stopped);
    }

    #[test]
    fn stop_on_idle_pool_cancels_queued_tasks() {
        let mut pool = WorkerPool::new(Arc::new(codec_with_sources(3)));
        for i in 0..3 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.stop();

        let results = pool.reporter().results();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.outcome == Outcome::Cancelled));
        assert!(results.iter().all(|r| r.worker.is_none()));
        assert_eq!(pool.pending(), 0);
        assert!(pool.wait_all().is_ok());
    }

    #[test]
    fn stop_accounts_for_every_task() {
        let codec = Arc::new(codec_with_sources(50));
        let mut pool = WorkerPool::new(codec);
        pool.start(2).unwrap();
        for i in 0..50 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.stop();

        // Whatever was not processed before stop is reported as cancelled.
        let results = pool.reporter().results();
        assert_eq!(results.len(), 50);
        assert!(results
            .iter()
            .all(|r| r.success() || r.outcome == Outcome::Cancelled));
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn stop_waits_for_in_flight_task() {
        let codec = Arc::new(SlowCodec {
            inner: codec_with_sources(1),
            delay: Duration::from_millis(100),
        });
        let mut pool = WorkerPool::new(codec);
        pool.start(1).unwrap();
        pool.enqueue(rotate_task(0)).unwrap();

        // Wait for the worker to pick the task up.
        while pool.queued() > 0 {
            thread::sleep(Duration::from_millis(1));
        }
        pool.stop();

        let results = pool.reporter().results();
        assert_eq!(results.len(), 1);
        assert!(results[0].success());
        assert_eq!(results[0].worker, Some(0));
    }

    #[test]
    fn results_stream_through_channel() {
        let (reporter, rx) = Reporter::with_channel();
        let mut pool = WorkerPool::with_reporter(Arc::new(codec_with_sources(4)), reporter);
        pool.start(2).unwrap();
        for i in 0..4 {
            pool.enqueue(rotate_task(i)).unwrap();
        }
        pool.wait_all().unwrap();
        drop(pool);

        let mut ids: Vec<u64> = rx.iter().map(|r| r.id.0).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn dropping_running_pool_joins_workers() {
        let codec = Arc::new(codec_with_sources(10));
        {
            let mut pool = WorkerPool::new(codec.clone());
            pool.start(4).unwrap();
            for i in 0..10 {
                pool.enqueue(rotate_task(i)).unwrap();
            }
        }
        // Every load that happened also finished its save before drop returned.
        let ops = codec.get_operations();
        let loads = ops.iter().filter(|op| matches!(op, RecordedOp::Load(_))).count();
        let saves = ops
            .iter()
            .filter(|op| matches!(op, RecordedOp::Save { .. }))
            .count();
        assert_eq!(loads, saves);
    }

    #[test]
    fn task_ids_increase_in_enqueue_order() {
        let pool = WorkerPool::new(Arc::new(MockCodec::new()));
        let a = pool.enqueue(rotate_task(0)).unwrap();
        let b = pool.enqueue(rotate_task(1)).unwrap();
        assert!(a < b);
    }
}
