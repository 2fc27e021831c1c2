//! Background sync worker
//!
//! Jobs arrive on a bounded mpsc queue and each runs in its own task against
//! the shared reconciler, so every job opens its own units of work. Failures
//! are logged; nothing is reported back to whoever enqueued the job.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::{LedgerError, LedgerResult};
use crate::services::reconciler::LedgerReconciler;

/// What asked for a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Manual,
    Notification,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Notification => write!(f, "notification"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncJob {
    pub item_id: String,
    pub trigger: SyncTrigger,
}

/// Cloneable sender side of the worker queue
#[derive(Debug, Clone)]
pub struct SyncHandle {
    job_tx: mpsc::Sender<SyncJob>,
}

impl SyncHandle {
    /// Queue a sync without waiting. Fails when the queue is full or the
    /// worker has shut down.
    pub fn enqueue(&self, item_id: &str, trigger: SyncTrigger) -> LedgerResult<()> {
        self.job_tx
            .try_send(SyncJob {
                item_id: item_id.to_string(),
                trigger,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => LedgerError::Queue("Sync queue full".into()),
                mpsc::error::TrySendError::Closed(_) => {
                    LedgerError::Queue("Sync worker is not running".into())
                }
            })
    }
}

pub struct SyncWorker {
    reconciler: Arc<LedgerReconciler>,
    job_tx: mpsc::Sender<SyncJob>,
    job_rx: Option<mpsc::Receiver<SyncJob>>,
    shutdown_token: CancellationToken,
    distributor: Option<JoinHandle<()>>,
}

async fn run_job(reconciler: Arc<LedgerReconciler>, job: SyncJob) {
    tracing::info!(item_id = %job.item_id, trigger = %job.trigger, "Sync job started");

    match reconciler.sync_item(&job.item_id).await {
        Ok(summary) => tracing::info!(
            item_id = %job.item_id,
            added = summary.added,
            modified = summary.modified,
            removed = summary.removed,
            "Sync job finished"
        ),
        Err(e) => tracing::error!(
            item_id = %job.item_id,
            trigger = %job.trigger,
            retryable = e.is_retryable(),
            error = %e,
            "Sync job failed"
        ),
    }
}

impl SyncWorker {
    pub fn new(reconciler: Arc<LedgerReconciler>, queue_capacity: usize) -> Self {
        let (job_tx, job_rx) = mpsc::channel(queue_capacity.max(1));
        Self {
            reconciler,
            job_tx,
            job_rx: Some(job_rx),
            shutdown_token: CancellationToken::new(),
            distributor: None,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            job_tx: self.job_tx.clone(),
        }
    }

    /// Start dispatching queued jobs. Calling it again is a no-op.
    pub fn start(&mut self) {
        let Some(mut job_rx) = self.job_rx.take() else {
            return;
        };

        let reconciler = Arc::clone(&self.reconciler);
        let shutdown = self.shutdown_token.clone();

        tracing::info!("Starting sync worker");

        self.distributor = Some(tokio::spawn(async move {
            let mut running = JoinSet::new();

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        // Jobs already queued still run
                        while let Ok(job) = job_rx.try_recv() {
                            running.spawn(run_job(Arc::clone(&reconciler), job));
                        }
                        break;
                    }
                    Some(_) = running.join_next(), if !running.is_empty() => {}
                    job = job_rx.recv() => {
                        match job {
                            Some(job) => {
                                tracing::debug!(item_id = %job.item_id, "Dispatching sync job");
                                running.spawn(run_job(Arc::clone(&reconciler), job));
                            }
                            None => {
                                tracing::info!("Channel closed, sync worker exiting");
                                break;
                            }
                        }
                    }
                }
            }

            while running.join_next().await.is_some() {}
            tracing::info!("Sync worker stopped");
        }));
    }

    /// Stop accepting work and wait for queued and in-flight jobs
    pub async fn shutdown(mut self) {
        tracing::info!("Initiating sync worker shutdown");
        self.shutdown_token.cancel();
        if let Some(distributor) = self.distributor.take() {
            if let Err(e) = distributor.await {
                tracing::error!(error = %e, "Sync worker task panicked");
            }
        }
    }
}
