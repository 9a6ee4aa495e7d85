use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::job::{JobId, JobSnapshot};

/// Metadata envelope attached to every job event.
#[derive(Clone, Debug)]
pub struct EventMeta {
    pub version: u16,
    pub job_id: JobId,
    pub timestamp: DateTime<Utc>,
}

impl EventMeta {
    pub fn new(job_id: JobId) -> Self {
        Self {
            version: 1,
            job_id,
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle event with metadata and payload.
#[derive(Clone, Debug)]
pub struct JobEvent<R> {
    pub meta: EventMeta,
    pub payload: JobEventPayload<R>,
}

/// Payload emitted for job lifecycle transitions. Each variant carries a
/// snapshot taken at the moment of the transition.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum JobEventPayload<R> {
    /// A dispatch began. Emitted for every attempt, including retries.
    Started {
        snapshot: JobSnapshot<R>,
        /// Attempt number this dispatch is, starting at 1.
        attempt: u32,
    },
    /// The job settled successfully; `snapshot.result` is set.
    Completed { snapshot: JobSnapshot<R> },
    /// The job settled in failure after exhausting its retry budget, or was
    /// failed by shutdown; `snapshot.error` is set.
    Failed { snapshot: JobSnapshot<R> },
}

impl<R> JobEventPayload<R> {
    /// The snapshot carried by this event.
    pub fn snapshot(&self) -> &JobSnapshot<R> {
        match self {
            JobEventPayload::Started { snapshot, .. } => snapshot,
            JobEventPayload::Completed { snapshot } => snapshot,
            JobEventPayload::Failed { snapshot } => snapshot,
        }
    }
}

/// In-process fan-out bus for lifecycle events, backed by a tokio broadcast
/// channel.
///
/// Publishing never blocks: with no subscribers the event is dropped, and a
/// subscriber that falls more than `capacity` events behind observes
/// `RecvError::Lagged` without affecting the publisher or its peers. Events
/// stay inside the process.
pub struct EventBus<R> {
    sender: broadcast::Sender<JobEvent<R>>,
    capacity: usize,
}

impl<R> std::fmt::Debug for EventBus<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl<R: Clone> EventBus<R> {
    /// Create a new bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers. Non-blocking; silently dropped
    /// when nobody is listening.
    pub fn publish(&self, event: JobEvent<R>) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to lifecycle events published after this call. Every
    /// subscriber receives its own clone of each event.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent<R>> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::time::timeout;

    fn snapshot(id: JobId, state: JobState) -> JobSnapshot<String> {
        JobSnapshot {
            id,
            state,
            attempts: 1,
            priority: 0,
            metadata: HashMap::new(),
            enqueued_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
            result: None,
            error: None,
        }
    }

    fn started(id: JobId) -> JobEvent<String> {
        JobEvent {
            meta: EventMeta::new(id),
            payload: JobEventPayload::Started {
                snapshot: snapshot(id, JobState::Running),
                attempt: 1,
            },
        }
    }

    #[tokio::test]
    async fn broadcast_to_multiple_subscribers() {
        let bus = EventBus::<String>::new(100);

        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let mut rx3 = bus.subscribe();

        for _ in 0..5 {
            bus.publish(started(JobId::new()));
        }

        for _ in 0..5 {
            assert!(timeout(Duration::from_millis(100), rx1.recv())
                .await
                .is_ok());
            assert!(timeout(Duration::from_millis(100), rx2.recv())
                .await
                .is_ok());
            assert!(timeout(Duration::from_millis(100), rx3.recv())
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn lagged_subscriber_does_not_block_publisher() {
        let bus = EventBus::<String>::new(2);

        let mut rx = bus.subscribe();

        // Publish more than the buffer holds without reading.
        for _ in 0..5 {
            bus.publish(started(JobId::new()));
        }

        let result = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(result.is_ok());

        match result.unwrap() {
            Err(broadcast::error::RecvError::Lagged(_)) | Ok(_) => {}
            Err(broadcast::error::RecvError::Closed) => {
                panic!("channel should not be closed");
            }
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::<String>::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(started(JobId::new()));
    }

    #[test]
    fn event_meta_carries_job_id() {
        let id = JobId::new();
        let meta = EventMeta::new(id);

        assert_eq!(meta.version, 1);
        assert_eq!(meta.job_id, id);
        assert!(meta.timestamp <= Utc::now());
    }

    #[test]
    fn payload_snapshot_accessor() {
        let id = JobId::new();
        let payloads = vec![
            JobEventPayload::Started {
                snapshot: snapshot(id, JobState::Running),
                attempt: 2,
            },
            JobEventPayload::Completed {
                snapshot: snapshot(id, JobState::Completed),
            },
            JobEventPayload::Failed {
                snapshot: snapshot(id, JobState::Failed),
            },
        ];

        for payload in payloads {
            assert_eq!(payload.snapshot().id, id);
            let _cloned = payload.clone();
            let _debug = format!("{payload:?}");
        }
    }
}
