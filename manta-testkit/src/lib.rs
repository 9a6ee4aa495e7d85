//! Shared test fixtures for the manta job queue.
//!
//! Provides canned work functions with shared attempt counters, an event
//! recorder that drains the queue's broadcast channel into a vector, and
//! config shorthands for fast-running tests.

pub mod recorder;
pub mod work;

pub use recorder::{EventKind, EventRecorder};
pub use work::{FailingWork, FlakyWork, OkWork, SlowWork};

use manta::{JobQueue, QueueConfig};

/// Queue type the fixtures are written against: `u32` payloads in, `u32`
/// results out.
pub type TestQueue = JobQueue<u32, u32>;

/// A configuration with short timeouts and sweep periods, sized for tests.
pub fn quick_config() -> QueueConfig {
    QueueConfig {
        max_concurrent_jobs: 2,
        max_queue_size: 64,
        job_timeout_ms: 1_000,
        cleanup_interval_ms: 50,
        retention_ttl_ms: Some(50),
        shutdown_grace_ms: 1_000,
        event_capacity: 1024,
    }
}
