use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info, warn, Instrument};

use crate::config::QueueConfig;
use crate::error::{JobError, SubmitError, WaitError};
use crate::events::{EventBus, EventMeta, JobEvent, JobEventPayload};
use crate::job::{
    JobId, JobOptions, JobSnapshot, JobState, QueueStats, WorkFn,
};
use crate::telemetry;

/// How often `wait` re-reads job status.
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How often `shutdown` re-checks the running set during the grace period.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Token for signaling shutdown to the queue's background tasks.
#[derive(Clone, Debug)]
pub struct ShutdownToken {
    inner: Arc<ShutdownTokenInner>,
}

#[derive(Debug)]
struct ShutdownTokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl ShutdownToken {
    /// Create a new shutdown token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownTokenInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Heap key for the waiting set: highest priority first, then earliest
/// submission. The submission sequence breaks `enqueued_at` ties so ordering
/// is total.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct WaitingKey {
    priority: i32,
    enqueued_at: DateTime<Utc>,
    seq: u64,
    id: JobId,
}

impl PartialOrd for WaitingKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WaitingKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.priority.cmp(&other.priority) {
            // Same priority: older submissions come first.
            std::cmp::Ordering::Equal => other
                .enqueued_at
                .cmp(&self.enqueued_at)
                .then_with(|| other.seq.cmp(&self.seq)),
            ord => ord,
        }
    }
}

struct JobRecord<P, R> {
    id: JobId,
    work: Arc<dyn WorkFn<P, R>>,
    payload: P,
    options: JobOptions,
    state: JobState,
    attempts: u32,
    seq: u64,
    enqueued_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<R>,
    error: Option<JobError>,
}

impl<P, R: Clone> JobRecord<P, R> {
    fn snapshot(&self) -> JobSnapshot<R> {
        JobSnapshot {
            id: self.id,
            state: self.state,
            attempts: self.attempts,
            priority: self.options.priority,
            metadata: self.options.metadata.clone(),
            enqueued_at: self.enqueued_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }

    /// Key for re-entering the waiting set. Keeps the original submission
    /// position so retries never jump ahead of older peers.
    fn waiting_key(&self) -> WaitingKey {
        WaitingKey {
            priority: self.options.priority,
            enqueued_at: self.enqueued_at,
            seq: self.seq,
            id: self.id,
        }
    }
}

struct QueueState<P, R> {
    jobs: HashMap<JobId, JobRecord<P, R>>,
    waiting: BinaryHeap<WaitingKey>,
    running: HashSet<JobId>,
    next_seq: u64,
}

struct QueueInner<P, R> {
    config: QueueConfig,
    state: Mutex<QueueState<P, R>>,
    events: EventBus<R>,
    shutdown: ShutdownToken,
    sweeper: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

enum AttemptOutcome<R> {
    Success(R),
    Failure(JobError),
}

/// Bounded in-process job queue.
///
/// Accepts work submissions, orders them by `(priority, submission time)`,
/// runs at most `max_concurrent_jobs` at once, enforces a per-attempt
/// deadline, retries failed attempts up to each job's budget, answers
/// point-in-time status queries, and sweeps terminal records on a timer.
///
/// All state lives behind a single lock; the dispatch decision is serialized
/// there, so concurrent submissions and settlements never double-dispatch a
/// waiting job. Work functions execute on their own tasks and never run
/// under the lock.
///
/// `P` is the payload handed to work functions (cloned per attempt), `R` the
/// result kept on completed jobs.
///
/// Cloning the queue is cheap and shares the same underlying state.
pub struct JobQueue<P, R> {
    inner: Arc<QueueInner<P, R>>,
}

impl<P, R> Clone for JobQueue<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R> std::fmt::Debug for JobQueue<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.inner.state.try_lock().map(|state| QueueStats {
            waiting: state.waiting.len(),
            running: state.running.len(),
            retained: state.jobs.len()
                - state.waiting.len()
                - state.running.len(),
        });

        f.debug_struct("JobQueue")
            .field("config", &self.inner.config)
            .field("stats", &stats)
            .field("shutdown", &self.inner.shutdown.is_cancelled())
            .finish()
    }
}

impl<P, R> JobQueue<P, R>
where
    P: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Create a queue with the given configuration. Call [`start`] to spawn
    /// the retention sweeper.
    ///
    /// [`start`]: JobQueue::start
    pub fn new(config: QueueConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(QueueInner {
                config,
                state: Mutex::new(QueueState {
                    jobs: HashMap::new(),
                    waiting: BinaryHeap::new(),
                    running: HashSet::new(),
                    next_seq: 0,
                }),
                events,
                shutdown: ShutdownToken::new(),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Create a queue with default configuration.
    pub fn with_default_config() -> Self {
        Self::new(QueueConfig::default())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Whether `shutdown()` has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Spawn the retention sweeper. Idempotent. Must be called from within a
    /// tokio runtime.
    ///
    /// Submission, dispatch and status lookups work without the sweeper, but
    /// terminal records are only reclaimed while it runs.
    pub fn start(&self) {
        let mut guard = self.inner.sweeper.lock();
        if guard.is_some() || self.inner.shutdown.is_cancelled() {
            return;
        }

        let queue = self.clone();
        let interval = self.inner.config.cleanup_interval();
        let shutdown = self.inner.shutdown.clone();

        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("retention sweeper shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        let swept = queue.sweep_now();
                        if swept > 0 {
                            debug!(swept, "swept terminal job records");
                        }
                    }
                }
            }
        }));
    }

    /// Submit a unit of work.
    ///
    /// Returns the job id immediately; the work function runs later, once a
    /// concurrency slot is free and no higher-priority (or equally urgent
    /// but older) job is waiting. Rejects with [`SubmitError::QueueFull`]
    /// when the waiting set is at capacity and with
    /// [`SubmitError::ShutdownInProgress`] once shutdown has begun; a
    /// rejected submission leaves no trace in the queue.
    ///
    /// The work function is re-invoked (with a fresh clone of `payload`) up
    /// to `options.max_retries` times after failed or timed-out attempts. A
    /// timed-out invocation is never cancelled — only its slot is reclaimed.
    pub fn submit<W>(
        &self,
        work: W,
        payload: P,
        options: JobOptions,
    ) -> Result<JobId, SubmitError>
    where
        W: WorkFn<P, R> + 'static,
    {
        if self.inner.shutdown.is_cancelled() {
            return Err(SubmitError::ShutdownInProgress);
        }

        let id = JobId::new();
        let priority = options.priority;
        {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;

            // Re-checked under the lock so no submission can slip past the
            // shutdown drain of the waiting set.
            if self.inner.shutdown.is_cancelled() {
                return Err(SubmitError::ShutdownInProgress);
            }
            if state.waiting.len() >= self.inner.config.max_queue_size {
                return Err(SubmitError::QueueFull {
                    capacity: self.inner.config.max_queue_size,
                });
            }

            let seq = state.next_seq;
            state.next_seq += 1;

            let record = JobRecord {
                id,
                work: Arc::new(work),
                payload,
                options,
                state: JobState::Queued,
                attempts: 0,
                seq,
                enqueued_at: Utc::now(),
                started_at: None,
                completed_at: None,
                result: None,
                error: None,
            };
            let key = record.waiting_key();
            state.jobs.insert(id, record);
            state.waiting.push(key);
        }

        telemetry::record_job_submitted(id.to_string(), priority);
        self.pump();
        Ok(id)
    }

    /// Point-in-time snapshot of a job. `None` for unknown ids and for
    /// terminal jobs already swept. Read-only and non-blocking.
    pub fn status(&self, id: JobId) -> Option<JobSnapshot<R>> {
        self.inner.state.lock().jobs.get(&id).map(JobRecord::snapshot)
    }

    /// Current set sizes.
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock();
        QueueStats {
            waiting: state.waiting.len(),
            running: state.running.len(),
            retained: state.jobs.len()
                - state.waiting.len()
                - state.running.len(),
        }
    }

    /// Subscribe to lifecycle events (`Started`, `Completed`, `Failed`).
    /// Slow subscribers skip events; they never block the queue or each
    /// other.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent<R>> {
        self.inner.events.subscribe()
    }

    /// The underlying event bus.
    pub fn events(&self) -> &EventBus<R> {
        &self.inner.events
    }

    /// Block (asynchronously) until the job settles, polling the public
    /// status surface.
    ///
    /// This is the synchronous-wait shim for request/response call sites —
    /// a plain polling loop over [`status`], not a separate path through the
    /// queue. On timeout the job itself is unaffected.
    ///
    /// [`status`]: JobQueue::status
    pub async fn wait(
        &self,
        id: JobId,
        wait_timeout: Duration,
    ) -> Result<JobSnapshot<R>, WaitError> {
        let started = tokio::time::Instant::now();
        loop {
            match self.status(id) {
                None => return Err(WaitError::NotFound),
                Some(snapshot) if snapshot.state.is_terminal() => {
                    return Ok(snapshot)
                }
                Some(_) => {}
            }
            if started.elapsed() >= wait_timeout {
                return Err(WaitError::Timeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }
    }

    /// Remove terminal records older than the retention window. Returns the
    /// number of records removed. Called by the sweeper each tick; exposed
    /// for callers that want to force a sweep.
    pub fn sweep_now(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::milliseconds(
                self.inner.config.retention_ttl().as_millis() as i64,
            );

        let mut guard = self.inner.state.lock();
        let before = guard.jobs.len();
        guard.jobs.retain(|_, record| {
            if !record.state.is_terminal() {
                return true;
            }
            match record.completed_at {
                Some(done) => done > cutoff,
                None => true,
            }
        });
        let stats = QueueStats {
            waiting: guard.waiting.len(),
            running: guard.running.len(),
            retained: guard.jobs.len()
                - guard.waiting.len()
                - guard.running.len(),
        };
        let swept = before - guard.jobs.len();
        drop(guard);

        telemetry::set_queue_depth(stats);
        swept
    }

    /// Stop admitting work and wind the queue down.
    ///
    /// Subsequent `submit` calls fail fast. Running jobs get up to the
    /// configured grace period to settle naturally (their work functions are
    /// not cancelled); jobs still waiting afterwards are failed with
    /// [`JobError::Shutdown`] without being run, and the retention sweeper
    /// stops. Safe to call more than once.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        if self.inner.shutdown.is_cancelled() {
            return Ok(());
        }
        info!("initiating graceful queue shutdown");
        self.inner.shutdown.cancel();

        let deadline =
            tokio::time::Instant::now() + self.inner.config.shutdown_grace();
        loop {
            let running = self.stats().running;
            if running == 0 {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    running,
                    "shutdown grace period elapsed with jobs still running"
                );
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }

        let mut failed = Vec::new();
        {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            while let Some(key) = state.waiting.pop() {
                let Some(record) = state.jobs.get_mut(&key.id) else {
                    continue;
                };
                if record.state != JobState::Queued {
                    continue;
                }
                record.state = JobState::Failed;
                record.error = Some(JobError::Shutdown);
                record.completed_at = Some(Utc::now());
                failed.push(record.snapshot());
            }
        }
        if !failed.is_empty() {
            info!(count = failed.len(), "failed undispatched jobs on shutdown");
        }
        for snapshot in failed {
            let id = snapshot.id;
            self.inner.events.publish(JobEvent {
                meta: EventMeta::new(id),
                payload: JobEventPayload::Failed { snapshot },
            });
        }

        let handle = self.inner.sweeper.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!("retention sweeper task failed: {err:?}")
                }
                Err(_) => warn!("retention sweeper did not stop in time"),
            }
        }

        info!("queue shutdown complete");
        Ok(())
    }

    /// Move waiting jobs into free concurrency slots, best first.
    ///
    /// The selection runs under the state lock — the single serialized
    /// decision point — so concurrent triggers cannot dispatch the same job
    /// twice. Spawning and event emission happen after the lock is released.
    ///
    /// No-op once shutdown has begun: jobs still waiting then are failed by
    /// `shutdown`, not run.
    fn pump(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        let mut dispatched = Vec::new();
        {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            while state.running.len() < self.inner.config.max_concurrent_jobs
            {
                let Some(key) = state.waiting.pop() else { break };
                let Some(record) = state.jobs.get_mut(&key.id) else {
                    continue;
                };
                record.state = JobState::Running;
                record.started_at = Some(Utc::now());
                record.attempts += 1;
                state.running.insert(key.id);
                dispatched.push((
                    key.id,
                    record.attempts,
                    Arc::clone(&record.work),
                    record.payload.clone(),
                    record.snapshot(),
                ));
            }
        }

        for (id, attempt, work, payload, snapshot) in dispatched {
            debug!(job_id = %id, attempt, "dispatching job");
            self.inner.events.publish(JobEvent {
                meta: EventMeta::new(id),
                payload: JobEventPayload::Started { snapshot, attempt },
            });
            self.spawn_runner(id, attempt, work, payload);
        }
    }

    /// Run one attempt on its own task, supervised by the per-attempt
    /// deadline.
    ///
    /// The work future is spawned separately so a deadline only reclaims the
    /// scheduling slot: the work function keeps running detached and its
    /// eventual output is discarded.
    fn spawn_runner(
        &self,
        id: JobId,
        attempt: u32,
        work: Arc<dyn WorkFn<P, R>>,
        payload: P,
    ) {
        let queue = self.clone();
        let timeout = self.inner.config.job_timeout();
        let timeout_ms = self.inner.config.job_timeout_ms;

        let supervised = async move {
            let mut work_task =
                tokio::spawn(async move { work.run(payload, id).await });

            let outcome = tokio::select! {
                res = &mut work_task => match res {
                    Ok(Ok(value)) => AttemptOutcome::Success(value),
                    Ok(Err(err)) => AttemptOutcome::Failure(
                        JobError::Execution(format!("{err:#}")),
                    ),
                    Err(err) if err.is_panic() => AttemptOutcome::Failure(
                        JobError::Panic(err.to_string()),
                    ),
                    Err(err) => AttemptOutcome::Failure(
                        JobError::Execution(err.to_string()),
                    ),
                },
                _ = tokio::time::sleep(timeout) => {
                    warn!(
                        job_id = %id,
                        attempt,
                        timeout_ms,
                        "job attempt timed out; reclaiming slot"
                    );
                    AttemptOutcome::Failure(JobError::Timeout { timeout_ms })
                }
            };

            queue.settle(id, attempt, outcome);
        };

        tokio::spawn(supervised.instrument(telemetry::job_dispatch_span(
            id.to_string(),
            attempt,
        )));
    }

    /// Route one attempt's outcome: complete, re-queue, or fail terminally.
    /// Frees the concurrency slot and pumps the dispatcher either way.
    fn settle(&self, id: JobId, attempt: u32, outcome: AttemptOutcome<R>) {
        let mut terminal_event = None;
        let mut settled = None;
        {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let Some(record) = state.jobs.get_mut(&id) else {
                debug!(job_id = %id, "settlement for unknown job ignored");
                return;
            };
            if record.state != JobState::Running || record.attempts != attempt
            {
                debug!(job_id = %id, attempt, "stale settlement ignored");
                return;
            }

            state.running.remove(&id);
            let now = Utc::now();
            let duration_secs = record
                .started_at
                .map(|s| (now - s).num_milliseconds() as f64 / 1000.0)
                .unwrap_or_default();

            match outcome {
                AttemptOutcome::Success(value) => {
                    record.state = JobState::Completed;
                    record.result = Some(value);
                    record.completed_at = Some(now);
                    terminal_event = Some(JobEventPayload::Completed {
                        snapshot: record.snapshot(),
                    });
                    settled = Some(("completed", duration_secs));
                }
                AttemptOutcome::Failure(error) => {
                    // No re-queue once shutdown has begun: the attempt would
                    // never be dispatched.
                    let retry = record.attempts <= record.options.max_retries
                        && !self.inner.shutdown.is_cancelled();
                    if retry {
                        debug!(
                            job_id = %id,
                            attempt = record.attempts,
                            max_retries = record.options.max_retries,
                            error = %error,
                            "attempt failed; re-queuing"
                        );
                        record.state = JobState::Queued;
                        let key = record.waiting_key();
                        state.waiting.push(key);
                        settled = Some(("retry", duration_secs));
                    } else {
                        warn!(
                            job_id = %id,
                            attempts = record.attempts,
                            error = %error,
                            "job failed after exhausting retries"
                        );
                        record.state = JobState::Failed;
                        record.error = Some(error);
                        record.completed_at = Some(now);
                        terminal_event = Some(JobEventPayload::Failed {
                            snapshot: record.snapshot(),
                        });
                        settled = Some(("failed", duration_secs));
                    }
                }
            }
        }

        if let Some((status, duration_secs)) = settled {
            telemetry::record_job_settled(id.to_string(), status, duration_secs);
        }
        if let Some(payload) = terminal_event {
            self.inner.events.publish(JobEvent {
                meta: EventMeta::new(id),
                payload,
            });
        }

        self.pump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn small_config(
        max_concurrent_jobs: usize,
        max_queue_size: usize,
    ) -> QueueConfig {
        QueueConfig {
            max_concurrent_jobs,
            max_queue_size,
            job_timeout_ms: 5_000,
            cleanup_interval_ms: 60_000,
            ..Default::default()
        }
    }

    async fn double(payload: u32, _id: JobId) -> anyhow::Result<u32> {
        Ok(payload * 2)
    }

    async fn slow(payload: u32, _id: JobId) -> anyhow::Result<u32> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(payload)
    }

    async fn boom(_payload: u32, _id: JobId) -> anyhow::Result<u32> {
        bail!("boom")
    }

    async fn wait_for_running(queue: &JobQueue<u32, u32>, id: JobId) {
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(500);
        loop {
            if let Some(snapshot) = queue.status(id) {
                if snapshot.state == JobState::Running {
                    return;
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {id} never started running"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn submit_and_complete() {
        let queue = JobQueue::new(small_config(2, 16));
        let id = queue.submit(double, 21, JobOptions::new()).unwrap();

        let snapshot =
            queue.wait(id, Duration::from_secs(1)).await.unwrap();
        assert_eq!(snapshot.state, JobState::Completed);
        assert_eq!(snapshot.result, Some(42));
        assert_eq!(snapshot.attempts, 1);
        assert!(snapshot.error.is_none());
        assert!(snapshot.started_at.is_some());
        assert!(snapshot.completed_at.is_some());
    }

    #[tokio::test]
    async fn queue_full_is_rejected_synchronously() {
        let queue = JobQueue::new(small_config(1, 1));

        let running = queue.submit(slow, 1, JobOptions::new()).unwrap();
        wait_for_running(&queue, running).await;

        let _waiting = queue.submit(slow, 2, JobOptions::new()).unwrap();
        assert_eq!(queue.stats().waiting, 1);

        let rejected = queue.submit(slow, 3, JobOptions::new());
        assert_eq!(
            rejected,
            Err(SubmitError::QueueFull { capacity: 1 })
        );
        assert_eq!(queue.stats().waiting, 1);
    }

    #[tokio::test]
    async fn submit_after_shutdown_fails_fast() {
        let queue: JobQueue<u32, u32> = JobQueue::new(small_config(1, 8));
        queue.shutdown().await.unwrap();

        let rejected = queue.submit(double, 1, JobOptions::new());
        assert_eq!(rejected, Err(SubmitError::ShutdownInProgress));
    }

    #[tokio::test]
    async fn status_of_unknown_job_is_none() {
        let queue: JobQueue<u32, u32> = JobQueue::new(small_config(1, 8));
        assert!(queue.status(JobId::new()).is_none());
    }

    #[tokio::test]
    async fn terminal_snapshot_is_idempotent() {
        let queue = JobQueue::new(small_config(1, 8));
        let id = queue.submit(double, 5, JobOptions::new()).unwrap();
        queue.wait(id, Duration::from_secs(1)).await.unwrap();

        let first = queue.status(id).unwrap();
        let second = queue.status(id).unwrap();
        assert_eq!(first.state, second.state);
        assert_eq!(first.attempts, second.attempts);
        assert_eq!(first.result, second.result);
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn failed_job_keeps_error_until_swept() {
        let queue = JobQueue::new(small_config(1, 8));
        let id = queue.submit(boom, 1, JobOptions::new()).unwrap();

        let snapshot =
            queue.wait(id, Duration::from_secs(1)).await.unwrap();
        assert_eq!(snapshot.state, JobState::Failed);
        assert_eq!(snapshot.attempts, 1);
        assert!(matches!(snapshot.error, Some(JobError::Execution(_))));

        // Below the retention window: the record must survive a sweep.
        assert_eq!(queue.sweep_now(), 0);
        assert!(queue.status(id).is_some());
    }

    #[tokio::test]
    async fn wait_for_unknown_job_is_not_found() {
        let queue: JobQueue<u32, u32> = JobQueue::new(small_config(1, 8));
        let err = queue
            .wait(JobId::new(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, WaitError::NotFound);
    }

    #[tokio::test]
    async fn wait_times_out_on_running_job() {
        let queue = JobQueue::new(small_config(1, 8));
        let id = queue.submit(slow, 1, JobOptions::new()).unwrap();

        let err = queue
            .wait(id, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Timeout { .. }));

        // The job itself is unaffected by the caller's timeout.
        let snapshot =
            queue.wait(id, Duration::from_secs(1)).await.unwrap();
        assert_eq!(snapshot.state, JobState::Completed);
    }
}
