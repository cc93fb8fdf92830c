//! Settlement job controller
//!
//! Jobs are enqueued onto a bounded in-process queue and drained by a
//! single consumer task, so at most one job runs at a time per process;
//! the worker pool parallelism lives inside the running job. The queue is
//! not durable: on restart, RUNNING jobs are orphaned and a deployment
//! layer is responsible for recovery.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::{Mutex, mpsc};

use super::aggregate::SettlementMap;
use super::engine::{BATCH_SIZE, CancelProbe, spawn_workers};
use super::error::JobError;
use super::report::ReportWriter;
use crate::models::{JobStatus, JobType};
use crate::store::{JobStore, SettlementStore, TransactionRow, TransactionStore};

/// Dispatch queue bound; enqueue waits once this many jobs are pending.
pub const JOB_QUEUE_CAPACITY: usize = 32;

enum Outcome {
    Completed(PathBuf),
    Canceled,
}

/// Dispatches and runs settlement jobs.
pub struct SettlementRunner {
    jobs: JobStore,
    transactions: TransactionStore,
    settlements: SettlementStore,
    workers: usize,
    out_dir: PathBuf,
    queue: mpsc::Sender<String>,
}

impl SettlementRunner {
    /// Build the runner and spawn its single-consumer dispatch loop.
    pub fn spawn(
        jobs: JobStore,
        transactions: TransactionStore,
        settlements: SettlementStore,
        workers: usize,
        out_dir: PathBuf,
    ) -> Arc<Self> {
        let (queue_tx, mut queue_rx) = mpsc::channel::<String>(JOB_QUEUE_CAPACITY);
        let runner = Arc::new(Self {
            jobs,
            transactions,
            settlements,
            workers,
            out_dir,
            queue: queue_tx,
        });

        let dispatcher = runner.clone();
        tokio::spawn(async move {
            while let Some(job_id) = queue_rx.recv().await {
                if let Err(e) = dispatcher.process(&job_id).await {
                    tracing::error!(job_id = %job_id, error = %e, "settlement job failed");
                }
            }
        });

        runner
    }

    /// Create the job row (QUEUED, `total` fixed from the count query) and
    /// hand it to the dispatch loop.
    pub async fn start_settlement(
        &self,
        job_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(), JobError> {
        let total = self.transactions.count_in_range(from, to).await?;
        self.jobs
            .create(job_id, JobType::Settlement, total, from, to)
            .await?;
        tracing::info!(job_id = %job_id, %from, %to, total, "settlement job queued");
        self.enqueue(job_id).await
    }

    /// Place a job id on the dispatch queue, waiting while it is full.
    pub async fn enqueue(&self, job_id: &str) -> Result<(), JobError> {
        self.queue
            .send(job_id.to_string())
            .await
            .map_err(|_| JobError::QueueClosed)
    }

    /// Run one job to a terminal state.
    ///
    /// Returns the terminal status reached, or the error that was recorded
    /// on the row via `set_failed`.
    pub async fn process(&self, job_id: &str) -> Result<JobStatus, JobError> {
        let started = Instant::now();
        self.jobs.set_running(job_id).await?;

        match self.run(job_id).await {
            Ok(Outcome::Completed(path)) => {
                let path = path.to_string_lossy().into_owned();
                self.jobs.set_completed(job_id, &path).await?;
                tracing::info!(
                    job_id = %job_id,
                    result_path = %path,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "settlement job completed"
                );
                Ok(JobStatus::Completed)
            }
            Ok(Outcome::Canceled) => {
                self.jobs.set_canceled(job_id).await?;
                tracing::info!(
                    job_id = %job_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "settlement job canceled"
                );
                Ok(JobStatus::Canceled)
            }
            Err(e) => {
                if let Err(store_err) = self.jobs.set_failed(job_id, &e.to_string()).await {
                    tracing::error!(job_id = %job_id, error = %store_err, "failed to record job failure");
                }
                Err(e)
            }
        }
    }

    /// The per-job procedure: stream, fan out, fold, then either emit or
    /// discard. Partial aggregates are never written out; once the
    /// write-out loop starts, completion wins over cancellation.
    async fn run(&self, job_id: &str) -> Result<Outcome, JobError> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or(JobError::Database(sqlx::Error::RowNotFound))?;
        let (from, to) = match (job.from_date, job.to_date) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(JobError::MissingDateRange),
        };

        let mut report = ReportWriter::create(&self.out_dir, job_id)?;

        let global = Arc::new(Mutex::new(SettlementMap::default()));
        let cancel_seen = Arc::new(AtomicBool::new(false));
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<TransactionRow>>(self.workers);
        let probe: Arc<dyn CancelProbe> = Arc::new(self.jobs.clone());
        let handles = spawn_workers(
            self.workers,
            batch_rx,
            probe,
            job_id,
            global.clone(),
            cancel_seen.clone(),
        );

        // Producer: stream batches into the pool, advancing `processed`
        // (rows dispatched, not rows folded) after every send.
        let dispatched = Arc::new(AtomicI64::new(0));
        let stream_result: Result<(), JobError> = {
            let sender = batch_tx.clone();
            let jobs = self.jobs.clone();
            let owned_id = job_id.to_string();
            let cancel_seen = cancel_seen.clone();
            let dispatched = dispatched.clone();

            self.transactions
                .stream_batches(from, to, BATCH_SIZE, move |batch: Vec<TransactionRow>| {
                    let sender = sender.clone();
                    let jobs = jobs.clone();
                    let job_id = owned_id.clone();
                    let cancel_seen = cancel_seen.clone();
                    let dispatched = dispatched.clone();

                    async move {
                        let mut canceled = cancel_seen.load(Ordering::Relaxed);
                        if !canceled {
                            match jobs.is_cancel_requested(&job_id).await {
                                Ok(flag) => canceled = flag,
                                Err(e) => {
                                    // Failed flag read counts as not canceled.
                                    tracing::warn!(job_id = %job_id, error = %e, "cancel probe failed");
                                }
                            }
                        }
                        if canceled {
                            cancel_seen.store(true, Ordering::Relaxed);
                            return Err(JobError::Canceled);
                        }

                        let rows = batch.len() as i64;
                        if sender.send(batch).await.is_err() {
                            // Receiver gone: every worker bailed out after
                            // observing the cancel flag.
                            return Err(JobError::Canceled);
                        }

                        let sent = dispatched.fetch_add(rows, Ordering::Relaxed) + rows;
                        jobs.set_progress(&job_id, sent).await?;
                        Ok(())
                    }
                })
                .await
        };
        drop(batch_tx);

        // Cancellation is a clean stop for the producer; anything else is
        // surfaced once the pool has drained and exited.
        let stream_err = match stream_result {
            Ok(()) | Err(JobError::Canceled) => None,
            Err(e) => Some(e),
        };

        let joined = futures::future::join_all(handles).await;
        let worker_panicked = joined.iter().any(|r| r.is_err());
        if let Some(e) = stream_err {
            return Err(e);
        }
        if worker_panicked {
            return Err(JobError::WorkerPanicked);
        }

        // Final checkpoint. After this, upserts run to completion and the
        // job reports COMPLETED even if a cancel lands meanwhile.
        let canceled = cancel_seen.load(Ordering::Relaxed)
            || match self.jobs.is_cancel_requested(job_id).await {
                Ok(flag) => flag,
                Err(e) => {
                    // Failed flag read counts as not canceled.
                    tracing::warn!(job_id = %job_id, error = %e, "cancel probe failed");
                    false
                }
            };
        if canceled {
            return Ok(Outcome::Canceled);
        }

        let aggregates = global.lock().await;
        for (key, totals) in aggregates.iter() {
            report.write_row(key, totals)?;
            self.settlements
                .upsert(
                    &key.merchant_id,
                    key.day,
                    totals.gross_cents,
                    totals.fee_cents,
                    totals.net_cents,
                    totals.txn_count,
                    job_id,
                )
                .await?;
        }
        report.flush()?;

        tracing::info!(
            job_id = %job_id,
            merchant_days = aggregates.len(),
            rows_dispatched = dispatched.load(Ordering::Relaxed),
            "settlement aggregates written"
        );

        Ok(Outcome::Completed(report.path().to_path_buf()))
    }
}
