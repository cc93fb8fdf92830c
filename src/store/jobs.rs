//! Job lifecycle store
//!
//! The `jobs` table is the durable record of every settlement run. Status
//! mutation belongs to the controller that is processing the job; the one
//! exception is `request_cancel`, which any client may call at any time.
//! The store records the request and stamps `canceled_at` but never flips
//! `status` itself: the controller observes the flag and performs the
//! CANCELED transition once it has actually stopped working.

use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::models::{Job, JobStatus, JobType};

/// Store for the `jobs` table.
#[derive(Clone)]
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a QUEUED job row. `total` is the expected row count for the
    /// range, computed once here at create time and never revised.
    pub async fn create(
        &self,
        id: &str,
        job_type: JobType,
        total: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, type, status, total, from_date, to_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(job_type.as_str())
        .bind(JobStatus::Queued.as_str())
        .bind(total)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// QUEUED → RUNNING, stamping `started_at`. Errors if the row is not
    /// currently QUEUED.
    pub async fn set_running(&self, id: &str) -> Result<(), sqlx::Error> {
        let affected = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, started_at = now(), updated_at = now()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(JobStatus::Running.as_str())
        .bind(id)
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Overwrite `processed`. The caller supplies non-decreasing values;
    /// the store does not enforce monotonicity.
    pub async fn set_progress(&self, id: &str, processed: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET processed = $1, updated_at = now() WHERE id = $2")
            .bind(processed)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Terminal: COMPLETED with the artifact location.
    pub async fn set_completed(&self, id: &str, result_path: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, completed_at = now(), updated_at = now(), result_path = $2
            WHERE id = $3
            "#,
        )
        .bind(JobStatus::Completed.as_str())
        .bind(result_path)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal: FAILED with the error message recorded on the row.
    pub async fn set_failed(&self, id: &str, message: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, error = $2, updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(JobStatus::Failed.as_str())
        .bind(message)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal: CANCELED. Called only by the controller after it has
    /// stopped streaming and folding; `canceled_at` was already stamped
    /// when the request was recorded.
    pub async fn set_canceled(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET status = $1, updated_at = now() WHERE id = $2")
            .bind(JobStatus::Canceled.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a cancellation request. Safe to repeat in any non-terminal
    /// state; this is a request, not a status transition. Returns whether
    /// the job row exists.
    pub async fn request_cancel(&self, id: &str) -> Result<bool, sqlx::Error> {
        let affected = sqlx::query(
            r#"
            UPDATE jobs
            SET cancel_requested = true, canceled_at = now(), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    /// Full row fetch.
    pub async fn get(&self, id: &str) -> Result<Option<Job>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, type, status, created_at, updated_at, started_at, completed_at,
                   canceled_at, cancel_requested, total, processed, result_path, error,
                   from_date, to_date
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(job_from_row))
    }

    /// Cheap predicate read used on the hot cancellation path.
    pub async fn is_cancel_requested(&self, id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT cancel_requested FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }
}

fn job_from_row(row: PgRow) -> Job {
    let status: String = row.get("status");
    Job {
        id: row.get("id"),
        job_type: row.get("type"),
        status: JobStatus::from_db(&status),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        canceled_at: row.get("canceled_at"),
        cancel_requested: row.get("cancel_requested"),
        total: row.get("total"),
        processed: row.get("processed"),
        result_path: row.get("result_path"),
        error: row.get("error"),
        from_date: row.get("from_date"),
        to_date: row.get("to_date"),
    }
}
