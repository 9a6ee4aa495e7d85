use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections raised at admission time, before a job record exists.
///
/// These are returned synchronously to the submitter and have no effect on
/// queue state; nothing is enqueued and nothing is retried.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SubmitError {
    /// The waiting set is at capacity. Backpressure: resubmit later.
    #[error("queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
    /// `shutdown()` has begun; the queue no longer admits work.
    #[error("queue is shutting down")]
    ShutdownInProgress,
}

/// Failure recorded against a job.
///
/// Contained inside the queue: surfaced only through snapshots and `Failed`
/// events, never propagated to dispatch. `Execution`, `Timeout` and `Panic`
/// all consume one retry attempt; `Shutdown` is terminal by construction.
#[derive(Clone, Debug, Error, Eq, PartialEq, Serialize, Deserialize)]
pub enum JobError {
    /// The work function returned an error.
    #[error("{0}")]
    Execution(String),
    /// The attempt outlived the per-attempt deadline. The work function may
    /// still be running; only its scheduling slot was reclaimed.
    #[error("job timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// The work function panicked.
    #[error("work function panicked: {0}")]
    Panic(String),
    /// The queue shut down before the job was dispatched.
    #[error("queue shut down before the job ran")]
    Shutdown,
}

/// Errors from the polling wait shim, [`crate::JobQueue::wait`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitError {
    /// Unknown id, or the record was already swept.
    #[error("job not found")]
    NotFound,
    /// The job did not settle within the caller's deadline. The job itself
    /// is unaffected and keeps running.
    #[error("job not terminal after {waited_ms}ms")]
    Timeout { waited_ms: u64 },
}
