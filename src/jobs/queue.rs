//! Bounded in-process job queue for cache work.
//!
//! Requests hand jobs to the queue and return immediately; a fixed pool of
//! workers drains it. Every job runs under a timeout. Most jobs only mirror
//! the store, so a full queue drops them and the cache is rebuilt on the next
//! read. Jobs carrying data that exists nowhere else (a ticket's QR artifact)
//! go through [`JobQueue::submit`], are retried on failure and still run when
//! the queue shuts down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use super::cache_jobs::CacheJob;
use crate::config::{JobSettings, DURABLE_CACHE_JOB_ATTEMPTS, DURABLE_CACHE_JOB_RETRY_MS};
use crate::errors::{AppError, AppResult};
use crate::infra::Cache;

struct Envelope {
    id: Uuid,
    job: CacheJob,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    dropped: AtomicU64,
    in_flight: AtomicU64,
}

/// Point-in-time view of the queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub dropped: u64,
    /// Accepted jobs not yet finished (queued or running)
    pub in_flight: u64,
}

struct Inner {
    sender: mpsc::Sender<Envelope>,
    counters: Counters,
    idle: Notify,
    shutdown: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Inner {
    fn finish(&self) {
        if self.counters.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn drop_job(&self) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        self.finish();
    }
}

/// Handle to the cache job queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Create the queue and spawn its workers on the current runtime.
    pub fn start(cache: Cache, settings: JobSettings) -> Self {
        let (sender, receiver) = mpsc::channel(settings.capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        let inner = Arc::new(Inner {
            sender,
            counters: Counters::default(),
            idle: Notify::new(),
            shutdown,
            workers: Mutex::new(Vec::new()),
        });

        let receiver = Arc::new(Mutex::new(receiver));
        let handles: Vec<JoinHandle<()>> = (0..settings.workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    inner.clone(),
                    receiver.clone(),
                    cache.clone(),
                    settings.job_timeout,
                ))
            })
            .collect();

        // Freshly created, nobody else can hold the lock yet
        if let Ok(mut workers) = inner.workers.try_lock() {
            *workers = handles;
        }

        tracing::info!(
            workers = settings.workers.max(1),
            capacity = settings.capacity.max(1),
            "Cache job queue started"
        );

        Self { inner }
    }

    /// Hand a job to the workers without waiting. Returns false if dropped.
    pub fn enqueue(&self, job: CacheJob) -> bool {
        let name = job.name();

        if *self.inner.shutdown.borrow() {
            self.inner.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(job = name, "Cache job queue is shut down, dropping job");
            return false;
        }

        let envelope = Envelope {
            id: Uuid::new_v4(),
            job,
        };
        let job_id = envelope.id;

        self.inner.counters.in_flight.fetch_add(1, Ordering::AcqRel);
        match self.inner.sender.try_send(envelope) {
            Ok(()) => {
                self.inner.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(job = name, job_id = %job_id, "Cache job enqueued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.inner.drop_job();
                tracing::warn!(job = name, "Cache job queue full, dropping job");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.inner.drop_job();
                tracing::warn!(job = name, "Cache job queue closed, dropping job");
                false
            }
        }
    }

    /// Hand a job to the workers, waiting up to `wait` for room in the queue.
    ///
    /// Use this for jobs whose loss cannot be repaired from the store.
    ///
    /// # Arguments
    ///
    /// * `job` - The job to run
    /// * `wait` - How long to wait for a free slot
    ///
    /// # Errors
    ///
    /// Returns `AppError::Timeout` if the queue stayed full for `wait`, or
    /// `AppError::Internal` if the queue is shut down.
    pub async fn submit(&self, job: CacheJob, wait: Duration) -> AppResult<()> {
        let name = job.name();

        if *self.inner.shutdown.borrow() {
            self.inner.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::error!(job = name, "Cache job queue is shut down, rejecting job");
            return Err(AppError::internal("Cache job queue is shut down"));
        }

        let envelope = Envelope {
            id: Uuid::new_v4(),
            job,
        };
        let job_id = envelope.id;

        self.inner.counters.in_flight.fetch_add(1, Ordering::AcqRel);
        match tokio::time::timeout(wait, self.inner.sender.send(envelope)).await {
            Ok(Ok(())) => {
                self.inner.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(job = name, job_id = %job_id, "Cache job submitted");
                Ok(())
            }
            Ok(Err(_)) => {
                self.inner.drop_job();
                tracing::error!(job = name, "Cache job queue closed, rejecting job");
                Err(AppError::internal("Cache job queue is shut down"))
            }
            Err(_) => {
                self.inner.drop_job();
                tracing::error!(
                    job = name,
                    wait_ms = wait.as_millis() as u64,
                    "Cache job queue stayed full, rejecting job"
                );
                Err(AppError::Timeout)
            }
        }
    }

    pub fn stats(&self) -> JobStats {
        let c = &self.inner.counters;
        JobStats {
            enqueued: c.enqueued.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            timed_out: c.timed_out.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Acquire),
        }
    }

    /// Wait until every accepted job has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.counters.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting jobs and join the workers.
    ///
    /// Running jobs finish within their timeout. Of the queued jobs only the
    /// durable ones still run; the rest are discarded.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.send_replace(true) {
            return;
        }

        let handles = std::mem::take(&mut *self.inner.workers.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Cache worker panicked");
            }
        }

        tracing::info!(stats = ?self.stats(), "Cache job queue stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    inner: Arc<Inner>,
    receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    cache: Cache,
    job_timeout: Duration,
) {
    let mut shutdown = inner.shutdown.subscribe();

    loop {
        let envelope = {
            let mut receiver = receiver.lock().await;
            if *shutdown.borrow_and_update() {
                drain(worker_id, &inner, &mut receiver, &cache, job_timeout).await;
                break;
            }
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    drain(worker_id, &inner, &mut receiver, &cache, job_timeout).await;
                    break;
                }
                envelope = receiver.recv() => envelope,
            }
        };

        let Some(envelope) = envelope else {
            break;
        };
        execute(worker_id, &inner, &cache, job_timeout, envelope).await;
    }

    tracing::debug!(worker_id, "Cache worker stopped");
}

/// Run one job, retrying durable ones, and record the outcome.
async fn execute(
    worker_id: usize,
    inner: &Inner,
    cache: &Cache,
    job_timeout: Duration,
    Envelope { id, job }: Envelope,
) {
    let name = job.name();
    let attempts = if job.is_durable() {
        DURABLE_CACHE_JOB_ATTEMPTS
    } else {
        1
    };

    let mut pending = Some(job);
    let mut attempt = 0;
    while let Some(job) = pending.take() {
        attempt += 1;
        let retry = (attempt < attempts).then(|| job.clone());

        let result = match tokio::time::timeout(job_timeout, job.run(cache)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout),
        };

        match (result, retry) {
            (Ok(()), _) => {
                inner.counters.completed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(worker_id, job = name, job_id = %id, attempt, "Cache job completed");
            }
            (Err(e), Some(job)) => {
                tracing::warn!(worker_id, job = name, job_id = %id, attempt, error = %e, "Cache job failed, retrying");
                let delay = DURABLE_CACHE_JOB_RETRY_MS * u64::from(attempt);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                pending = Some(job);
            }
            (Err(AppError::Timeout), None) => {
                inner.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    worker_id,
                    job = name,
                    job_id = %id,
                    attempt,
                    timeout_ms = job_timeout.as_millis() as u64,
                    "Cache job timed out"
                );
                if attempts > 1 {
                    tracing::error!(worker_id, job = name, job_id = %id, "Durable cache job gave up");
                }
            }
            (Err(e), None) => {
                inner.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(worker_id, job = name, job_id = %id, attempt, error = %e, "Cache job failed");
                if attempts > 1 {
                    tracing::error!(worker_id, job = name, job_id = %id, "Durable cache job gave up");
                }
            }
        }
    }

    inner.finish();
}

/// Close the channel and settle whatever is still queued.
///
/// Durable jobs run; the rest are discarded. Closing first means a
/// concurrent `submit` fails loudly instead of landing in a dead queue.
async fn drain(
    worker_id: usize,
    inner: &Inner,
    receiver: &mut mpsc::Receiver<Envelope>,
    cache: &Cache,
    job_timeout: Duration,
) {
    receiver.close();
    while let Some(envelope) = receiver.recv().await {
        if envelope.job.is_durable() {
            tracing::info!(job = envelope.job.name(), job_id = %envelope.id, "Running durable cache job before shutdown");
            execute(worker_id, inner, cache, job_timeout, envelope).await;
        } else {
            tracing::debug!(job = envelope.job.name(), job_id = %envelope.id, "Discarding queued cache job");
            inner.drop_job();
        }
    }
}
