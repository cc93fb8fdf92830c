//! Transaction source for settlement runs
//!
//! Streams PAID transactions for a date range as id-ordered batches using
//! keyset pagination (`id > last_id ORDER BY id ASC LIMIT n`), so the scan
//! never re-reads or skips rows when new transactions land concurrently.
//! The stream is finite and reads fresh on every call; it is not
//! restartable mid-way.

use std::future::Future;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

/// One PAID transaction as the aggregation engine sees it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub merchant_id: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub status: String,
    pub paid_at: DateTime<Utc>,
}

/// Store for the `transactions` table.
#[derive(Clone)]
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count PAID rows with `paid_at` in `[from, to + 1 day)` (UTC).
    pub async fn count_in_range(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, sqlx::Error> {
        let (start, end) = day_bounds(from, to);
        sqlx::query_scalar(
            "SELECT COUNT(1) FROM transactions WHERE paid_at >= $1 AND paid_at < $2 AND status = 'PAID'",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
    }

    /// Stream the range as ordered, non-overlapping batches.
    ///
    /// `sink` is awaited once per batch; returning an error stops the
    /// stream and propagates it. Termination is an empty batch or a batch
    /// shorter than `batch_size`.
    pub async fn stream_batches<F, Fut, E>(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        batch_size: i64,
        mut sink: F,
    ) -> Result<(), E>
    where
        F: FnMut(Vec<TransactionRow>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: From<sqlx::Error>,
    {
        let (start, end) = day_bounds(from, to);
        let mut last_id: i64 = 0;

        loop {
            tracing::debug!(last_id, batch_size, "fetching transaction batch");

            let batch: Vec<TransactionRow> = sqlx::query_as(
                r#"
                SELECT id, merchant_id, amount_cents, fee_cents, status, paid_at
                FROM transactions
                WHERE paid_at >= $1 AND paid_at < $2 AND status = 'PAID' AND id > $3
                ORDER BY id ASC
                LIMIT $4
                "#,
            )
            .bind(start)
            .bind(end)
            .bind(last_id)
            .bind(batch_size)
            .fetch_all(&self.pool)
            .await
            .map_err(E::from)?;

            let Some(last) = batch.last() else {
                return Ok(());
            };
            last_id = last.id;
            let len = batch.len() as i64;

            sink(batch).await?;

            if len < batch_size {
                return Ok(());
            }
        }
    }
}

/// UTC half-open window `[from 00:00, to + 1 day 00:00)` for an inclusive
/// calendar-day range.
fn day_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = (to + Days::new(1)).and_time(NaiveTime::MIN).and_utc();
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_the_full_inclusive_range() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let (start, end) = day_bounds(from, to);
        assert_eq!(start.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        // End is exclusive: the whole of Jan 31 is inside the window.
        assert_eq!(end.to_rfc3339(), "2025-02-01T00:00:00+00:00");
    }

    #[test]
    fn single_day_range_is_one_day_wide() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let (start, end) = day_bounds(day, day);
        assert_eq!(end - start, chrono::Duration::days(1));
    }
}
