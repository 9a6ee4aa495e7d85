use std::sync::Arc;

use manta::{JobEvent, JobEventPayload, JobId};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::TestQueue;

/// Which lifecycle transition an event recorded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    Started,
    Completed,
    Failed,
}

/// Drains a queue's event channel into a vector for later assertions.
///
/// The recorder runs on its own task, so slow tests cannot make the
/// subscriber lag; dropping the recorder stops the task.
pub struct EventRecorder {
    events: Arc<Mutex<Vec<JobEvent<u32>>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl EventRecorder {
    /// Subscribe to `queue` and start recording.
    pub fn attach(queue: &TestQueue) -> Self {
        let mut rx = queue.subscribe();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => sink.lock().push(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped,
                            "event recorder lagged; events lost"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self { events, handle }
    }

    /// All events recorded so far, in publish order.
    pub fn events(&self) -> Vec<JobEvent<u32>> {
        self.events.lock().clone()
    }

    /// Event kinds recorded for one job, in publish order.
    pub fn kinds_for(&self, id: JobId) -> Vec<EventKind> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.meta.job_id == id)
            .filter_map(|event| match &event.payload {
                JobEventPayload::Started { .. } => Some(EventKind::Started),
                JobEventPayload::Completed { .. } => {
                    Some(EventKind::Completed)
                }
                JobEventPayload::Failed { .. } => Some(EventKind::Failed),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded events of one kind, across all jobs.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| {
                matches!(
                    (&event.payload, kind),
                    (JobEventPayload::Started { .. }, EventKind::Started)
                        | (
                            JobEventPayload::Completed { .. },
                            EventKind::Completed
                        )
                        | (JobEventPayload::Failed { .. }, EventKind::Failed)
                )
            })
            .count()
    }
}

impl Drop for EventRecorder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
