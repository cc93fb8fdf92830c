//! Settlement sink
//!
//! `(merchant_id, date)` is the primary key; a re-run over the same range
//! simply overwrites each aggregate with identical values, so settlement
//! output is idempotent per merchant/day with last-writer-wins by job.

use chrono::NaiveDate;
use sqlx::{PgPool, Row};

use crate::models::Settlement;

/// Store for the `settlements` table.
#[derive(Clone)]
pub struct SettlementStore {
    pool: PgPool,
}

impl SettlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert-or-replace one merchant/day aggregate, stamping
    /// `generated_at` and the producing job's id.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        merchant_id: &str,
        date: NaiveDate,
        gross_cents: i64,
        fee_cents: i64,
        net_cents: i64,
        txn_count: i64,
        run_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO settlements
                (merchant_id, date, gross_cents, fee_cents, net_cents, txn_count, unique_run_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (merchant_id, date) DO UPDATE SET
                gross_cents = EXCLUDED.gross_cents,
                fee_cents = EXCLUDED.fee_cents,
                net_cents = EXCLUDED.net_cents,
                txn_count = EXCLUDED.txn_count,
                unique_run_id = EXCLUDED.unique_run_id,
                generated_at = now()
            "#,
        )
        .bind(merchant_id)
        .bind(date)
        .bind(gross_cents)
        .bind(fee_cents)
        .bind(net_cents)
        .bind(txn_count)
        .bind(run_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch one merchant/day row.
    pub async fn get(
        &self,
        merchant_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Settlement>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT merchant_id, date, gross_cents, fee_cents, net_cents, txn_count,
                   generated_at, unique_run_id
            FROM settlements
            WHERE merchant_id = $1 AND date = $2
            "#,
        )
        .bind(merchant_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Settlement {
            merchant_id: r.get("merchant_id"),
            date: r.get("date"),
            gross_cents: r.get("gross_cents"),
            fee_cents: r.get("fee_cents"),
            net_cents: r.get("net_cents"),
            txn_count: r.get("txn_count"),
            generated_at: r.get("generated_at"),
            unique_run_id: r.get("unique_run_id"),
        }))
    }

    /// Count settlement rows for merchants in a date range. Used to assert
    /// cancellation never leaked partial aggregates.
    pub async fn count_in_range(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(1) FROM settlements WHERE date >= $1 AND date <= $2")
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
    }
}
