//! Stress tests for the manta job queue.
//!
//! Pushes hundreds of jobs through a small concurrency cap and checks that
//! the caps hold, every job settles exactly once, and mixed failure modes
//! don't wedge the dispatcher.

use std::collections::HashMap;
use std::time::Duration;

use manta::{JobOptions, JobQueue, JobState, QueueConfig};
use manta_testkit::{EventKind, EventRecorder, FlakyWork, OkWork, SlowWork};
use tokio::time::timeout;

#[tokio::test]
async fn hundreds_of_jobs_settle_under_a_small_cap() {
    let queue = JobQueue::new(QueueConfig {
        max_concurrent_jobs: 4,
        max_queue_size: 1024,
        job_timeout_ms: 5_000,
        cleanup_interval_ms: 60_000,
        event_capacity: 4096,
        ..Default::default()
    });
    let recorder = EventRecorder::attach(&queue);

    let sampler = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let mut max_running = 0;
            loop {
                let stats = queue.stats();
                max_running = max_running.max(stats.running);
                if stats.running == 0 && stats.waiting == 0 && max_running > 0
                {
                    return max_running;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
    };

    let mut expected = HashMap::new();
    for n in 0..300u32 {
        let priority = (n % 3) as i32;
        let id = match n % 5 {
            // A slice of jobs needs one retry before succeeding.
            0 => queue
                .submit(
                    FlakyWork::new(1),
                    n,
                    JobOptions::new()
                        .with_priority(priority)
                        .with_max_retries(1),
                )
                .unwrap(),
            1 => queue
                .submit(
                    SlowWork::new(Duration::from_millis(2)),
                    n,
                    JobOptions::new().with_priority(priority),
                )
                .unwrap(),
            _ => queue
                .submit(
                    OkWork::new(),
                    n,
                    JobOptions::new().with_priority(priority),
                )
                .unwrap(),
        };
        expected.insert(id, n);
    }
    assert_eq!(expected.len(), 300);

    let waits = expected.iter().map(|(id, payload)| {
        let queue = queue.clone();
        async move {
            let snapshot =
                queue.wait(*id, Duration::from_secs(30)).await.unwrap();
            assert_eq!(snapshot.state, JobState::Completed);
            assert_eq!(snapshot.result, Some(*payload));
        }
    });
    let wait_all =
        timeout(Duration::from_secs(30), futures::future::join_all(waits))
            .await;
    assert!(wait_all.is_ok(), "timed out waiting for completions");

    let max_running = timeout(Duration::from_secs(5), sampler)
        .await
        .expect("sampler timed out")
        .expect("sampler panicked");
    assert!(
        max_running <= 4,
        "concurrency cap exceeded: observed {max_running}"
    );

    // Every job settled terminally exactly once.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recorder.count(EventKind::Completed), 300);
    assert_eq!(recorder.count(EventKind::Failed), 0);
    assert_eq!(queue.stats().retained, 300);
}
