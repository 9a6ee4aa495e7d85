//! Basic queue example simulating image transcoding offload.
//!
//! Demonstrates both consumption patterns the queue supports:
//! - fire-and-poll: submit, keep the id, poll `status()`
//! - synchronous wait: block a request handler on `wait()` until terminal

use std::time::Duration;

use manta::{
    JobEventPayload, JobOptions, JobQueue, JobState, QueueConfig,
};

#[derive(Clone, Debug)]
struct TranscodeRequest {
    source: String,
    width: u32,
    height: u32,
}

#[derive(Clone, Debug)]
struct TranscodeOutput {
    bytes: usize,
}

async fn transcode(
    request: TranscodeRequest,
    id: manta::JobId,
) -> anyhow::Result<TranscodeOutput> {
    tracing::debug!(job_id = %id, source = %request.source, "transcoding");
    // Stand-in for the real pixel pushing.
    tokio::time::sleep(Duration::from_millis(
        20 + (request.width as u64 * request.height as u64) / 100_000,
    ))
    .await;
    Ok(TranscodeOutput {
        bytes: (request.width * request.height / 4) as usize,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Manta Transcode Example ===\n");

    let queue: JobQueue<TranscodeRequest, TranscodeOutput> =
        JobQueue::new(QueueConfig {
            max_concurrent_jobs: 2,
            max_queue_size: 32,
            job_timeout_ms: 5_000,
            cleanup_interval_ms: 2_000,
            ..Default::default()
        });
    queue.start();

    // A logging subscriber, running independently of the queue.
    let mut events = queue.subscribe();
    let observer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.payload {
                JobEventPayload::Started { attempt, .. } => {
                    println!("   [events] {} started (attempt {attempt})", event.meta.job_id);
                }
                JobEventPayload::Completed { snapshot } => {
                    println!(
                        "   [events] {} completed ({} bytes)",
                        event.meta.job_id,
                        snapshot.result.map(|r| r.bytes).unwrap_or_default()
                    );
                }
                JobEventPayload::Failed { snapshot } => {
                    println!(
                        "   [events] {} failed: {:?}",
                        event.meta.job_id, snapshot.error
                    );
                }
                _ => {}
            }
        }
    });

    println!("1. Submitting thumbnails (priority 0) and a preview (priority 5)...");
    let mut polled = Vec::new();
    for n in 0..4 {
        let id = queue.submit(
            transcode,
            TranscodeRequest {
                source: format!("scene-{n}.png"),
                width: 320,
                height: 240,
            },
            JobOptions::new().with_metadata("kind", "thumbnail"),
        )?;
        polled.push(id);
    }
    let preview = queue.submit(
        transcode,
        TranscodeRequest {
            source: "scene-full.png".into(),
            width: 1920,
            height: 1080,
        },
        JobOptions::new()
            .with_priority(5)
            .with_max_retries(1)
            .with_metadata("kind", "preview"),
    )?;

    let stats = queue.stats();
    println!(
        "   stats: waiting={} running={} retained={}\n",
        stats.waiting, stats.running, stats.retained
    );

    println!("2. Synchronous wait on the preview (request/response shim)...");
    let snapshot = queue.wait(preview, Duration::from_secs(10)).await?;
    println!(
        "   preview settled: state={} attempts={} bytes={:?}\n",
        snapshot.state,
        snapshot.attempts,
        snapshot.result.map(|r| r.bytes)
    );

    println!("3. Polling the thumbnails (fire-and-poll)...");
    loop {
        let pending = polled
            .iter()
            .filter(|id| {
                queue
                    .status(**id)
                    .map(|s| !s.state.is_terminal())
                    .unwrap_or(false)
            })
            .count();
        if pending == 0 {
            break;
        }
        println!("   {pending} thumbnail(s) still in flight...");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    for id in &polled {
        let snapshot = queue.status(*id).expect("not swept yet");
        println!(
            "   {} -> {} ({:?} bytes)",
            snapshot
                .metadata
                .get("kind")
                .and_then(|v| v.as_str())
                .unwrap_or("?"),
            snapshot.state,
            snapshot.result.map(|r| r.bytes)
        );
    }
    assert!(polled
        .iter()
        .all(|id| queue.status(*id).unwrap().state == JobState::Completed));

    println!("\n4. Shutting down...");
    queue.shutdown().await?;
    observer.abort();

    println!("\n=== Example Complete ===");
    Ok(())
}
