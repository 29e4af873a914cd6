//! Fixed-size worker pool fed by a bounded job queue.
//!
//! Workers are started once and loop forever: take the next job, run it,
//! send the outcome on the job's own reply channel. A full queue makes
//! `enqueue` wait for a free slot instead of failing.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::{RepoLensError, Result};
use crate::models::{AggregateResult, Extraction, RepositoryKey};

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, key: RepositoryKey) -> Extraction;
}

struct Job {
    key: RepositoryKey,
    reply: oneshot::Sender<Extraction>,
}

/// A queued job. Resolves once the assigned worker has finished it.
pub struct Ticket {
    key: RepositoryKey,
    reply: oneshot::Receiver<Extraction>,
}

impl Ticket {
    pub fn key(&self) -> &RepositoryKey {
        &self.key
    }

    pub async fn wait(self) -> Result<Extraction> {
        self.reply.await.map_err(|_| RepoLensError::PoolClosed)
    }
}

pub struct Dispatcher {
    jobs: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns `workers` long-lived workers on the current tokio runtime.
    pub fn start<H: JobHandler>(
        handler: Arc<H>,
        workers: usize,
        queue_capacity: usize,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(RepoLensError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if queue_capacity == 0 {
            return Err(RepoLensError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&rx), Arc::clone(&handler))))
            .collect::<Vec<_>>();

        info!(
            "Dispatcher started with {} workers (queue capacity {queue_capacity})",
            workers.len()
        );

        Ok(Self { jobs: tx, workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Waits for a queue slot, then hands back the job's ticket.
    pub async fn enqueue(&self, key: RepositoryKey) -> Result<Ticket> {
        let (reply, receiver) = oneshot::channel();
        self.jobs
            .send(Job {
                key: key.clone(),
                reply,
            })
            .await
            .map_err(|_| RepoLensError::PoolClosed)?;

        Ok(Ticket {
            key,
            reply: receiver,
        })
    }

    pub async fn submit(&self, key: RepositoryKey) -> Result<Extraction> {
        self.enqueue(key).await?.wait().await
    }

    /// Closes the queue and waits for the workers to drain it.
    pub async fn shutdown(self) {
        let Self { jobs, workers } = self;
        drop(jobs);
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Worker task failed: {e}");
            }
        }
        info!("Dispatcher stopped");
    }
}

async fn run_worker<H: JobHandler>(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    handler: Arc<H>,
) {
    loop {
        // Only the dequeue is serialized; the lock is released before the job runs.
        let job = jobs.lock().await.recv().await;
        let Some(Job { key, reply }) = job else {
            debug!("[worker {id}] queue closed, stopping");
            return;
        };

        debug!("[worker {id}] processing {key}");
        let outcome = match AssertUnwindSafe(handler.handle(key.clone()))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("[worker {id}] job for {key} panicked");
                Extraction::Completed(AggregateResult::failed(
                    key,
                    "extraction aborted: worker panicked".to_string(),
                ))
            }
        };

        if let Err(outcome) = reply.send(outcome) {
            warn!(
                "[worker {id}] caller for {} is gone, result dropped",
                outcome.key()
            );
        }
    }
}
