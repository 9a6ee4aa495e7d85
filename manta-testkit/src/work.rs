use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use manta::{JobId, WorkFn};

/// Work that succeeds immediately, echoing its payload.
///
/// Clones share an attempt counter, so keep a clone when submitting to
/// assert on how often the queue invoked it.
#[derive(Clone, Default)]
pub struct OkWork {
    attempts: Arc<AtomicU32>,
}

impl OkWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkFn<u32, u32> for OkWork {
    async fn run(&self, payload: u32, _id: JobId) -> anyhow::Result<u32> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(payload)
    }
}

/// Work that fails on every attempt with a fixed message.
#[derive(Clone)]
pub struct FailingWork {
    error: String,
    attempts: Arc<AtomicU32>,
}

impl FailingWork {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkFn<u32, u32> for FailingWork {
    async fn run(&self, _payload: u32, _id: JobId) -> anyhow::Result<u32> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        bail!("{}", self.error)
    }
}

/// Work that fails its first `fail_first` attempts, then succeeds.
#[derive(Clone)]
pub struct FlakyWork {
    fail_first: u32,
    attempts: Arc<AtomicU32>,
}

impl FlakyWork {
    pub fn new(fail_first: u32) -> Self {
        Self {
            fail_first,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkFn<u32, u32> for FlakyWork {
    async fn run(&self, payload: u32, _id: JobId) -> anyhow::Result<u32> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_first {
            bail!("transient failure on attempt {attempt}");
        }
        Ok(payload)
    }
}

/// Work that sleeps for a fixed duration, then succeeds.
///
/// With a duration past the queue's per-attempt deadline this doubles as a
/// timeout fixture: the sleep is real, so the attempt counter still ticks
/// even when the queue has already reclaimed the slot.
#[derive(Clone)]
pub struct SlowWork {
    delay: Duration,
    attempts: Arc<AtomicU32>,
}

impl SlowWork {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkFn<u32, u32> for SlowWork {
    async fn run(&self, payload: u32, _id: JobId) -> anyhow::Result<u32> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(payload)
    }
}
