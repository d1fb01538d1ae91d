//! # imgpool
//!
//! Batch image transforms on a fixed pool of worker threads. Each source image
//! becomes one task; workers pull tasks from a shared queue, decode, transform,
//! encode, and report a result. A failing image never stops the batch.
//!
//! # Architecture
//!
//! ```text
//!  caller ──enqueue──▶ TaskQueue ──pop──▶ worker 0..n ──report──▶ Reporter
//!                                           │                       │
//!                                   ImageCodec::load          log line, channel,
//!                                   Operation::apply          stored TaskResult
//!                                   ImageCodec::save
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel buffers, pure transforms (resize, rotate 90°, digital zoom), the codec seam |
//! | [`task`] | `Task`, `Operation`, `TaskResult`: what to do and what happened |
//! | [`queue`] | Blocking multi-producer, multi-consumer FIFO |
//! | [`report`] | Locked result sink with optional channel subscriber; JSON run report |
//! | [`pool`] | Worker pool: start, enqueue, wait for completion, stop |
//! | [`config`] | `imgpool.toml` loading, merging, and validation |
//! | [`scan`] | Lists source images and selects them by index |
//! | [`naming`] | Output file names per operation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Plain Threads Over a Task Runtime
//!
//! The work is CPU-bound and the pool size is fixed, so each worker is an OS
//! thread blocked on a condition variable while idle. Completion tracking is a
//! counter of outstanding tasks, not the queue length: a task that has been
//! popped but not yet reported still counts, so [`pool::WorkerPool::wait_all`]
//! cannot return early.
//!
//! ## Transforms Are Pure
//!
//! [`imaging::transforms`] functions take a borrowed source and return a new
//! buffer. They never touch the filesystem, which keeps them testable without
//! fixtures and lets the codec be swapped for an in-memory mock.
//!
//! ## Validated Parameters
//!
//! Zero output sizes and non-positive zoom levels are rejected when
//! [`imaging::ZoomParams`] / [`imaging::ResizeParams`] are built. A queued task
//! therefore never fails for a reason the caller could have caught up front;
//! the only runtime failures are loading and saving.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pool;
pub mod queue;
pub mod report;
pub mod scan;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;
