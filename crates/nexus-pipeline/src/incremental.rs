//! Incremental ingestion of changed source files.
//!
//! Callers enqueue file ids as files change. A flush atomically takes the
//! whole queue, re-reads those files' chunks from the chunk source, and runs
//! them through the batch pipeline. Files whose chunks fail are re-queued
//! until they exhaust `max_file_retries`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use nexus_core::config::PipelineConfig;
use nexus_core::errors::{NexusResult, PipelineError};
use nexus_core::models::ChunkFilter;
use nexus_core::CancellationToken;

use crate::batch::BatchPipeline;
use crate::result::PipelineResult;

#[derive(Default)]
struct Queue {
    /// File id to failed attempts so far.
    files: BTreeMap<String, u32>,
    last_enqueue: Option<Instant>,
}

/// What one flush did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlushReport {
    /// Files taken off the queue.
    pub files: Vec<String>,
    /// `None` when the queue was empty or the chunk source was unreachable.
    pub result: Option<PipelineResult>,
    pub requeued: Vec<String>,
    /// Files that ran out of retries.
    pub dropped: Vec<String>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub struct IncrementalIngestor {
    pipeline: Arc<BatchPipeline>,
    config: PipelineConfig,
    queue: Mutex<Queue>,
    scheduler_running: AtomicBool,
}

impl IncrementalIngestor {
    pub fn new(pipeline: Arc<BatchPipeline>) -> Self {
        let config = pipeline.config().clone();
        Self {
            pipeline,
            config,
            queue: Mutex::new(Queue::default()),
            scheduler_running: AtomicBool::new(false),
        }
    }

    /// Mark a file as changed. Enqueueing a file already queued only
    /// restarts the debounce window.
    pub fn enqueue(&self, file_id: impl Into<String>) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.files.entry(file_id.into()).or_insert(0);
        queue.last_enqueue = Some(Instant::now());
    }

    /// Queued file ids in order.
    pub fn pending(&self) -> Vec<String> {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.files.keys().cloned().collect()
    }

    /// Tick period from the pipeline configuration.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.config.flush_interval_ms)
    }

    pub fn pending_len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .files
            .len()
    }

    /// Flush if the queue is non-empty and has been quiet for `debounce_ms`.
    pub fn tick(&self) -> Option<FlushReport> {
        self.tick_at(Instant::now())
    }

    pub(crate) fn tick_at(&self, now: Instant) -> Option<FlushReport> {
        let debounce = Duration::from_millis(self.config.debounce_ms);
        let due = {
            let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            !queue.files.is_empty()
                && queue
                    .last_enqueue
                    .map_or(true, |at| now.saturating_duration_since(at) >= debounce)
        };
        due.then(|| self.flush())
    }

    /// Process everything queued right now, ignoring the debounce window.
    pub fn flush(&self) -> FlushReport {
        let taken = {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            queue.last_enqueue = None;
            std::mem::take(&mut queue.files)
        };
        if taken.is_empty() {
            return FlushReport::default();
        }

        let files: Vec<String> = taken.keys().cloned().collect();
        let (result, failed) = match self
            .pipeline
            .process_existing_chunks(&ChunkFilter::for_sources(files.clone()))
        {
            Ok(result) => {
                let failed = result.failed_sources();
                (Some(result), failed)
            }
            Err(e) => {
                warn!(files = files.len(), error = %e, "incremental flush failed, re-queueing");
                (None, files.clone())
            }
        };

        let (requeued, dropped) = self.requeue(&failed, &taken);
        info!(
            files = files.len(),
            requeued = requeued.len(),
            dropped = dropped.len(),
            "incremental flush complete"
        );
        FlushReport {
            files,
            result,
            requeued,
            dropped,
        }
    }

    fn requeue(&self, failed: &[String], taken: &BTreeMap<String, u32>) -> (Vec<String>, Vec<String>) {
        let max_attempts = self.config.max_file_retries.max(1);
        let mut requeued = Vec::new();
        let mut dropped = Vec::new();
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        for file in failed {
            let attempts = taken.get(file).copied().unwrap_or(0) + 1;
            if attempts >= max_attempts {
                error!(file_id = %file, attempts, "file dropped after repeated ingest failures");
                dropped.push(file.clone());
                continue;
            }
            // A re-enqueue during the flush is newer content and starts fresh.
            queue.files.entry(file.clone()).or_insert(attempts);
            requeued.push(file.clone());
        }
        (requeued, dropped)
    }

    /// Call `tick` every `interval` until `token` is cancelled, then flush
    /// whatever is still queued. At most one scheduler runs per ingestor;
    /// a second call while one is live fails with `SchedulerRunning`.
    /// Must be called inside a tokio runtime.
    pub fn spawn_scheduler(
        self: &Arc<Self>,
        interval: Duration,
        token: CancellationToken,
    ) -> NexusResult<JoinHandle<()>> {
        if self.scheduler_running.swap(true, Ordering::AcqRel) {
            return Err(PipelineError::SchedulerRunning.into());
        }
        let ingestor = Arc::clone(self);
        let period = interval.max(Duration::from_millis(1));
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let worker = Arc::clone(&ingestor);
                        match tokio::task::spawn_blocking(move || worker.tick()).await {
                            Ok(Some(report)) => debug!(files = report.files.len(), "scheduled flush ran"),
                            Ok(None) => {}
                            Err(e) => error!(error = %e, "scheduled flush aborted"),
                        }
                    }
                }
            }
            let worker = Arc::clone(&ingestor);
            if let Err(e) = tokio::task::spawn_blocking(move || worker.flush()).await {
                error!(error = %e, "final flush aborted");
            }
            ingestor.scheduler_running.store(false, Ordering::Release);
            debug!("incremental scheduler stopped");
        }))
    }

    pub fn scheduler_running(&self) -> bool {
        self.scheduler_running.load(Ordering::Acquire)
    }
}
