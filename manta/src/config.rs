use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for queue admission, execution and retention.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of jobs executing at once.
    pub max_concurrent_jobs: usize,
    /// Maximum number of admitted jobs waiting for a slot. Submissions past
    /// this cap are rejected with `QueueFull`.
    pub max_queue_size: usize,
    /// Per-attempt deadline in milliseconds. A timed-out attempt counts as a
    /// failure; the work function itself is not preempted.
    pub job_timeout_ms: u64,
    /// Interval between retention sweeps in milliseconds.
    pub cleanup_interval_ms: u64,
    /// How long terminal jobs stay queryable, in milliseconds. When unset,
    /// one sweep period.
    pub retention_ttl_ms: Option<u64>,
    /// How long `shutdown()` waits for running jobs to settle naturally,
    /// in milliseconds.
    pub shutdown_grace_ms: u64,
    /// Buffer capacity of the lifecycle event channel. Subscribers that lag
    /// past it skip events; they never block the queue.
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            max_queue_size: 256,
            job_timeout_ms: 30_000,
            cleanup_interval_ms: 60_000,
            retention_ttl_ms: None,
            shutdown_grace_ms: 30_000,
            event_capacity: 256,
        }
    }
}

impl QueueConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    /// Effective retention window for terminal records.
    pub fn retention_ttl(&self) -> Duration {
        Duration::from_millis(
            self.retention_ttl_ms.unwrap_or(self.cleanup_interval_ms),
        )
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_defaults_to_one_sweep_period() {
        let config = QueueConfig {
            cleanup_interval_ms: 1234,
            retention_ttl_ms: None,
            ..Default::default()
        };
        assert_eq!(config.retention_ttl(), Duration::from_millis(1234));

        let config = QueueConfig {
            cleanup_interval_ms: 1234,
            retention_ttl_ms: Some(50),
            ..Default::default()
        };
        assert_eq!(config.retention_ttl(), Duration::from_millis(50));
    }
}
