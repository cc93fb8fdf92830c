//! Aggregation worker pool
//!
//! One producer streams batches into a bounded channel; W workers pull
//! batches, fold each into a worker-local map, and merge that local map
//! into the shared global map in a single critical section per batch.
//!
//! ```text
//!                    ┌──────────┐
//!  Transaction   ┌──▶│ Worker 1 │──┐  local fold,
//!  Source        │   └──────────┘  │  one merge per batch
//! ┌──────────┐   │   ┌──────────┐  │   ┌────────────┐
//! │ Producer │───┼──▶│ Worker 2 │──┼──▶│ Global map │
//! └──────────┘   │   └──────────┘  │   └────────────┘
//!   bounded chan │   ┌──────────┐  │
//!                └──▶│ Worker N │──┘
//!                    └──────────┘
//! ```
//!
//! Cancellation is cooperative: the producer consults the job's cancel
//! flag before every send and each worker consults it before folding a
//! batch; nothing interrupts a batch mid-fold. The first observation is
//! fanned out through a shared `AtomicBool` so the rest of the pool stops
//! without further database reads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use super::aggregate::{SettlementMap, fold_batch, merge_into};
use crate::store::{JobStore, TransactionRow};

/// Rows per streamed batch.
pub const BATCH_SIZE: i64 = 10_000;

/// Cancellation checkpoint read.
///
/// Seam between the pool and the job store so the engine can be exercised
/// without a database.
#[async_trait]
pub trait CancelProbe: Send + Sync {
    async fn is_cancel_requested(&self, job_id: &str) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl CancelProbe for JobStore {
    async fn is_cancel_requested(&self, job_id: &str) -> Result<bool, sqlx::Error> {
        JobStore::is_cancel_requested(self, job_id).await
    }
}

/// Spawn the worker half of the pool.
///
/// Workers drain the channel until it closes or cancellation is observed,
/// then return. The caller keeps the global map and joins the handles
/// after the producer side has dropped its sender.
pub fn spawn_workers(
    count: usize,
    rx: mpsc::Receiver<Vec<TransactionRow>>,
    probe: Arc<dyn CancelProbe>,
    job_id: &str,
    global: Arc<Mutex<SettlementMap>>,
    cancel_seen: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));

    (0..count)
        .map(|worker| {
            let rx = rx.clone();
            let probe = probe.clone();
            let job_id = job_id.to_string();
            let global = global.clone();
            let cancel_seen = cancel_seen.clone();

            tokio::spawn(async move {
                tracing::debug!(worker, job_id = %job_id, "aggregation worker started");
                loop {
                    if cancel_seen.load(Ordering::Relaxed) {
                        return;
                    }

                    // Holding the receiver lock across recv serializes
                    // dequeue only; folding happens outside it.
                    let batch = { rx.lock().await.recv().await };
                    let Some(batch) = batch else {
                        return;
                    };

                    match probe.is_cancel_requested(&job_id).await {
                        Ok(true) => {
                            cancel_seen.store(true, Ordering::Relaxed);
                            tracing::info!(worker, job_id = %job_id, "cancel observed, dropping batch");
                            return;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            // Failed flag read counts as not canceled.
                            tracing::warn!(worker, job_id = %job_id, error = %e, "cancel probe failed");
                        }
                    }

                    let local = fold_batch(&batch);
                    let mut agg = global.lock().await;
                    merge_into(&mut agg, local);
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Probe stub with a fixed answer.
    struct FixedProbe(bool);

    #[async_trait]
    impl CancelProbe for FixedProbe {
        async fn is_cancel_requested(&self, _job_id: &str) -> Result<bool, sqlx::Error> {
            Ok(self.0)
        }
    }

    fn txn(id: i64, merchant: &str, amount: i64, fee: i64) -> TransactionRow {
        TransactionRow {
            id,
            merchant_id: merchant.to_string(),
            amount_cents: amount,
            fee_cents: fee,
            status: "PAID".to_string(),
            paid_at: Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn pool_folds_every_batch_exactly_once() {
        let batches: Vec<Vec<TransactionRow>> = (0..10)
            .map(|b| {
                (0..50)
                    .map(|i| txn(b * 50 + i, if i % 2 == 0 { "A" } else { "B" }, 100, 3))
                    .collect()
            })
            .collect();

        let mut expected = SettlementMap::default();
        for batch in &batches {
            merge_into(&mut expected, fold_batch(batch));
        }

        let (tx, rx) = mpsc::channel(4);
        let global = Arc::new(Mutex::new(SettlementMap::default()));
        let cancel_seen = Arc::new(AtomicBool::new(false));
        let handles = spawn_workers(
            4,
            rx,
            Arc::new(FixedProbe(false)),
            "job_test",
            global.clone(),
            cancel_seen.clone(),
        );

        for batch in batches {
            tx.send(batch).await.unwrap();
        }
        drop(tx);
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(*global.lock().await, expected);
        assert!(!cancel_seen.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn canceled_pool_folds_nothing() {
        let (tx, rx) = mpsc::channel(2);
        let global = Arc::new(Mutex::new(SettlementMap::default()));
        let cancel_seen = Arc::new(AtomicBool::new(false));
        let handles = spawn_workers(
            2,
            rx,
            Arc::new(FixedProbe(true)),
            "job_test",
            global.clone(),
            cancel_seen.clone(),
        );

        // Workers may exit (dropping the receiver) before every send lands.
        for b in 0..4 {
            let _ = tx.send(vec![txn(b, "A", 100, 3)]).await;
        }
        drop(tx);
        for h in handles {
            h.await.unwrap();
        }

        assert!(global.lock().await.is_empty());
        assert!(cancel_seen.load(Ordering::Relaxed));
    }
}
