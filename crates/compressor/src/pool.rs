use std::path::Path;
use std::sync::Arc;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, Mutex};
use crate::config::Quality;
use crate::encoder::Encoder;
use crate::gate::SerializedEncoder;
use crate::job::{ConversionOutcome, Job};
use crate::stats::{Aggregator, StatsSnapshot};

/// Pre-populated, closed queue of jobs shared by every worker
pub struct JobQueue {
    rx: Mutex<mpsc::Receiver<Job>>,
}

impl JobQueue {
    /// Enqueue every job into a channel sized to hold them all, then close it
    pub fn closed(jobs: Vec<Job>) -> Self {
        let (tx, rx) = mpsc::channel(jobs.len().max(1));
        for job in jobs {
            // capacity covers every job and the receiver is alive, so this cannot fail
            if let Err(e) = tx.try_send(job) {
                error!("Failed to enqueue job: {}", e);
            }
        }
        drop(tx);

        JobQueue { rx: Mutex::new(rx) }
    }

    /// Next pending job, or `None` once the queue is drained
    pub async fn claim(&self) -> Option<Job> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}

/// What the pool hands back after every worker has returned
#[derive(Debug, Clone)]
pub struct PoolReport {
    pub stats: StatsSnapshot,
    /// Sorted by source path
    pub outcomes: Vec<ConversionOutcome>,
}

/// Fixed-width pool of workers draining one [`JobQueue`]
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    width: usize,
}

impl WorkerPool {
    pub fn new(width: usize) -> Self {
        WorkerPool { width: width.max(1) }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Convert every job and wait for all workers before reading the stats.
    ///
    /// Per-job failures are counted, never returned.
    pub async fn run<E>(
        &self,
        jobs: Vec<Job>,
        encoder: Arc<SerializedEncoder<E>>,
        quality: Quality,
        in_place: bool,
    ) -> PoolReport
    where
        E: Encoder + 'static,
    {
        let job_count = jobs.len();
        let queue = Arc::new(JobQueue::closed(jobs));
        let aggregator = Arc::new(Aggregator::new());

        info!("Starting {} worker(s) for {} job(s)", self.width, job_count);

        let mut handles = Vec::with_capacity(self.width);
        for worker_id in 0..self.width {
            handles.push(tokio::spawn(worker_loop(
                worker_id,
                queue.clone(),
                encoder.clone(),
                aggregator.clone(),
                quality,
                in_place,
            )));
        }

        let mut outcomes = Vec::with_capacity(job_count);
        for handle in handles {
            match handle.await {
                Ok(mut produced) => outcomes.append(&mut produced),
                Err(e) => error!("Worker task failed: {}", e),
            }
        }

        // every worker has been joined; the counters are final
        let stats = aggregator.snapshot();
        outcomes.sort_by(|a, b| a.source.cmp(&b.source));

        if stats.total as usize != job_count {
            warn!("Processed {} of {} job(s)", stats.total, job_count);
        }

        PoolReport { stats, outcomes }
    }
}

/// Claim → convert → report until the queue is drained
async fn worker_loop<E: Encoder>(
    worker_id: usize,
    queue: Arc<JobQueue>,
    encoder: Arc<SerializedEncoder<E>>,
    aggregator: Arc<Aggregator>,
    quality: Quality,
    in_place: bool,
) -> Vec<ConversionOutcome> {
    let mut outcomes = Vec::new();

    while let Some(job) = queue.claim().await {
        debug!("Worker {}: claimed {}", worker_id, job.source.display());
        let outcome = convert_one(&encoder, job, quality, in_place).await;
        aggregator.record(&outcome);
        outcomes.push(outcome);
    }

    debug!("Worker {}: queue drained after {} job(s)", worker_id, outcomes.len());
    outcomes
}

/// stat source → encode → stat destination → remove source when replacing in place
async fn convert_one<E: Encoder>(
    encoder: &SerializedEncoder<E>,
    job: Job,
    quality: Quality,
    in_place: bool,
) -> ConversionOutcome {
    let original_size = file_size(&job.source).await;

    match encoder.encode(&job.source, &job.destination, quality).await {
        Ok(()) => {
            let converted_size = file_size(&job.destination).await;
            if in_place {
                // the output exists, so a failed removal still counts as converted
                if let Err(e) = tokio::fs::remove_file(&job.source).await {
                    warn!("Failed to remove replaced source {}: {}", job.source.display(), e);
                }
            }
            ConversionOutcome {
                source: job.source,
                destination: job.destination,
                original_size,
                converted_size,
                success: true,
                error: None,
            }
        }
        Err(e) => {
            warn!("Conversion failed for {}: {}", job.source.display(), e);
            ConversionOutcome {
                source: job.source,
                destination: job.destination,
                original_size,
                converted_size: None,
                success: false,
                error: Some(e.detail()),
            }
        }
    }
}

/// Best-effort size lookup; failures only cost the byte statistics
async fn file_size(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Some(meta.len()),
        Err(e) => {
            debug!("Failed to stat {}: {}", path.display(), e);
            None
        }
    }
}
