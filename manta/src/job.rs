use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JobError;

/// Unique identifier for a submitted job. Assigned at admission, never reused.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a job.
///
/// `Queued → Running → {Completed | Queued (retry) | Failed}`. Only the
/// dispatcher, the timeout supervisor and the retry policy move a job
/// between states.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Whether the job has settled for good (no further attempts).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Per-job submission options.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobOptions {
    /// Scheduling priority. Higher values dispatch first; equal priorities
    /// dispatch in submission order.
    pub priority: i32,
    /// Number of automatic re-runs after a failed or timed-out attempt.
    /// Zero means a single attempt.
    pub max_retries: u32,
    /// Caller-supplied annotations, carried on snapshots unchanged.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl JobOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Point-in-time view of a job, as returned by [`crate::JobQueue::status`]
/// and carried on lifecycle events.
///
/// Snapshots of a terminal job are identical on every read until the record
/// is swept.
#[derive(Clone, Debug, Serialize)]
pub struct JobSnapshot<R> {
    pub id: JobId,
    pub state: JobState,
    /// Execution attempts so far. Incremented at each dispatch.
    pub attempts: u32,
    pub priority: i32,
    pub metadata: HashMap<String, serde_json::Value>,
    pub enqueued_at: DateTime<Utc>,
    /// Start of the most recent attempt, if any.
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Work function output, set once the job completes.
    pub result: Option<R>,
    /// Terminal failure, set once the job fails for good.
    pub error: Option<JobError>,
}

/// Counts of jobs per logical set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs admitted but not yet dispatched.
    pub waiting: usize,
    /// Jobs currently executing.
    pub running: usize,
    /// Terminal jobs kept for status lookups until swept.
    pub retained: usize,
}

/// The unit of work the queue schedules but does not interpret.
///
/// Invoked once per attempt with a clone of the submitted payload. An `Err`
/// consumes one retry attempt; once the budget is exhausted the error string
/// becomes the job's terminal [`JobError::Execution`]. A work function that
/// outlives its per-attempt deadline is *not* cancelled — the queue reclaims
/// the scheduling slot and ignores whatever the function eventually produces.
///
/// Implemented for any `Fn(P, JobId) -> impl Future<Output = anyhow::Result<R>>`,
/// so plain async closures work at call sites.
#[async_trait]
pub trait WorkFn<P, R>: Send + Sync {
    async fn run(&self, payload: P, id: JobId) -> anyhow::Result<R>;
}

#[async_trait]
impl<P, R, F, Fut> WorkFn<P, R> for F
where
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(P, JobId) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<R>> + Send,
{
    async fn run(&self, payload: P, id: JobId) -> anyhow::Result<R> {
        (self)(payload, id).await
    }
}
