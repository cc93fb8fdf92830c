//! Merchant settlement
//!
//! Streams PAID transactions for a date range in batches, folds them with a
//! worker pool into per-merchant-per-day totals, and emits the result to
//! the `settlements` table and a CSV artifact. Jobs run one at a time
//! through a bounded in-process queue and honor cooperative cancellation.

mod aggregate;
mod engine;
mod error;
mod report;
mod runner;

pub use aggregate::{DayTotals, SettlementKey, SettlementMap, fold_batch, merge_into};
pub use engine::{BATCH_SIZE, CancelProbe, spawn_workers};
pub use error::JobError;
pub use report::ReportWriter;
pub use runner::{JOB_QUEUE_CAPACITY, SettlementRunner};
