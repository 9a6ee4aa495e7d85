//! Manta - Bounded in-process job queue for offloading request-path work.
//!
//! A crate for moving CPU/IO-bound work (image transcoding and the like) off
//! request-handling tasks into a bounded, observable background queue with
//! priority scheduling, per-attempt timeouts, bounded retries, point-in-time
//! status lookups and timed retention of finished work.
//!
//! # Core Concepts
//!
//! - **Work function**: The unit of work. Callers supply any async
//!   `Fn(payload, JobId)` (or a [`WorkFn`] implementation); the queue
//!   schedules it but never interprets it.
//!
//! - **Admission**: [`JobQueue::submit`] either admits a job and returns its
//!   [`JobId`] immediately, or rejects with [`SubmitError`] when the waiting
//!   set is full or the queue is shutting down. Rejection is pure
//!   backpressure with no side effects.
//!
//! - **Dispatch**: A single serialized decision point moves waiting jobs
//!   into free concurrency slots, highest priority first and oldest first
//!   within a priority.
//!
//! - **Supervision**: Every attempt runs under a deadline. Timeouts and
//!   errors consume retry attempts; a job that exhausts its budget settles
//!   as `Failed` with the last error.
//!
//! - **Observation**: [`JobQueue::status`] and [`JobQueue::stats`] give
//!   synchronous snapshots; the [`EventBus`] broadcasts typed
//!   `Started`/`Completed`/`Failed` events to any number of subscribers.
//!
//! # Feature Flags
//!
//! - `metrics` - Prometheus metrics support
//!
//! # Example
//!
//! ```ignore
//! use manta::{JobOptions, JobQueue, QueueConfig};
//!
//! let queue: JobQueue<Vec<u8>, Vec<u8>> = JobQueue::new(QueueConfig::default());
//! queue.start();
//!
//! let id = queue.submit(
//!     |payload: Vec<u8>, _id| async move { Ok(transcode(&payload)) },
//!     raw_image,
//!     JobOptions::new().with_priority(5).with_max_retries(2),
//! )?;
//!
//! // Fire-and-poll:
//! let snapshot = queue.status(id);
//! // ...or synchronous wait:
//! let done = queue.wait(id, std::time::Duration::from_secs(30)).await?;
//! ```

/// Queue configuration.
///
/// The `config` module defines [`QueueConfig`]: concurrency and queue caps,
/// the per-attempt deadline, sweep cadence and retention window.
pub mod config;

/// Error taxonomy.
///
/// The `error` module distinguishes admission rejections ([`SubmitError`]),
/// failures recorded against a job ([`JobError`]) and wait-shim errors
/// ([`WaitError`]).
pub mod error;

/// Event publishing and subscription.
///
/// The `events` module provides [`JobEvent`] / [`JobEventPayload`] lifecycle
/// events and the broadcast-backed [`EventBus`].
pub mod events;

/// Core job definitions.
///
/// The `job` module defines:
/// - [`JobId`] - unique job identifier
/// - [`JobState`] - job lifecycle states
/// - [`JobOptions`] - priority, retry budget, metadata
/// - [`JobSnapshot`] - point-in-time job view
/// - [`QueueStats`] - set sizes for observability
/// - [`WorkFn`] - the work function trait
pub mod job;

/// The queue itself.
///
/// The `queue` module provides [`JobQueue`] - admission, dispatch, timeout
/// supervision, retry routing, retention sweeping and shutdown - plus the
/// [`ShutdownToken`] used by its background tasks.
pub mod queue;

/// Tracing spans and metric recording helpers.
pub mod telemetry;

#[cfg(feature = "metrics")]
/// Prometheus metrics, enabled with the `metrics` feature.
pub mod metrics;

pub use config::*;
pub use error::*;
pub use events::*;
pub use job::*;
pub use queue::*;
