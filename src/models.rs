//! Core data models
//!
//! Plain row-shaped structs shared by the stores, the settlement runner and
//! the gateway. Money is integer cents end to end; days are UTC calendar
//! dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Product catalog row
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A placed order. Only ever created together with a successful stock
/// decrement; `total_cents` snapshots the price at decrement time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: String,
    pub quantity: i32,
    pub total_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Status every freshly placed order carries.
pub const ORDER_STATUS_CREATED: &str = "CREATED";

/// Per-merchant-per-day settlement aggregate row
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub merchant_id: String,
    pub date: NaiveDate,
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub txn_count: i64,
    pub generated_at: DateTime<Utc>,
    /// Id of the job that last produced this row
    pub unique_run_id: String,
}

// ============================================================================
// Jobs
// ============================================================================

/// Background job kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    Settlement,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Settlement => "SETTLEMENT",
        }
    }
}

/// Job lifecycle status.
///
/// ```text
/// QUEUED ──► RUNNING ──► COMPLETED
///               │   └───► FAILED
///               └───────► CANCELED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Canceled,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Canceled => "CANCELED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Parse the database representation. Unknown strings map to FAILED
    /// rather than panicking; the store only ever writes the five known
    /// values.
    pub fn from_db(s: &str) -> Self {
        match s {
            "QUEUED" => JobStatus::Queued,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "CANCELED" => JobStatus::Canceled,
            _ => JobStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Canceled | JobStatus::Failed
        )
    }
}

/// Background job row.
///
/// `processed` counts rows dispatched to workers and is monotonically
/// non-decreasing; `total` is fixed when the job is created and treated as
/// advisory afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_requested: bool,
    pub total: i64,
    pub processed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

impl Job {
    /// Whole-percent progress, `⌊processed * 100 / total⌋`.
    ///
    /// A zero total reports 0 rather than dividing; under concurrent
    /// inserts `processed` may legitimately exceed `total`, so the value is
    /// not clamped to 100.
    pub fn progress_percent(&self) -> i64 {
        if self.total > 0 {
            self.processed * 100 / self.total
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job_with(processed: i64, total: i64) -> Job {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Job {
            id: "job_test".to_string(),
            job_type: JobType::Settlement.as_str().to_string(),
            status: JobStatus::Running,
            created_at: t,
            updated_at: t,
            started_at: None,
            completed_at: None,
            canceled_at: None,
            cancel_requested: false,
            total,
            processed,
            result_path: None,
            error: None,
            from_date: None,
            to_date: None,
        }
    }

    #[test]
    fn progress_is_floored_percent() {
        assert_eq!(job_with(0, 300).progress_percent(), 0);
        assert_eq!(job_with(150, 300).progress_percent(), 50);
        assert_eq!(job_with(299, 300).progress_percent(), 99);
        assert_eq!(job_with(300, 300).progress_percent(), 100);
    }

    #[test]
    fn progress_handles_zero_and_overrun_totals() {
        assert_eq!(job_with(50, 0).progress_percent(), 0);
        // New PAID rows after Create can push processed past total.
        assert_eq!(job_with(400, 300).progress_percent(), 133);
    }

    #[test]
    fn status_round_trips_through_db_repr() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Canceled,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_db(status.as_str()), status);
        }
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
