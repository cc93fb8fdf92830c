//! Settlement job DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Job, JobStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Body of `POST /jobs/settlement`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartSettlementRequest {
    /// Inclusive range start, `YYYY-MM-DD`
    #[schema(example = "2025-01-01")]
    pub from: String,
    /// Inclusive range end, `YYYY-MM-DD`
    #[schema(example = "2025-01-31")]
    pub to: String,
}

impl StartSettlementRequest {
    pub fn parse_range(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let from = NaiveDate::parse_from_str(&self.from, DATE_FORMAT)
            .map_err(|_| "invalid date format".to_string())?;
        let to = NaiveDate::parse_from_str(&self.to, DATE_FORMAT)
            .map_err(|_| "invalid date format".to_string())?;
        Ok((from, to))
    }
}

/// `POST /jobs/settlement` acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobStatus,
}

/// `POST /jobs/{id}/cancel` acknowledgement. `CANCEL_REQUESTED` is an
/// acknowledgement of the request, not a job status; the job transitions
/// to CANCELED once the controller stops its work.
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelAccepted {
    pub job_id: String,
    pub status: String,
}

/// `GET /jobs/{id}` response
#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusData {
    pub job_id: String,
    pub status: JobStatus,
    pub processed: i64,
    pub total: i64,
    /// Whole percent, `⌊processed · 100 / total⌋`
    pub progress: i64,
    /// Present only once the job is COMPLETED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl JobStatusData {
    pub fn from_job(job: &Job) -> Self {
        let download_url = match (job.status, &job.result_path) {
            (JobStatus::Completed, Some(_)) => Some(format!("/downloads/{}.csv", job.id)),
            _ => None,
        };
        Self {
            job_id: job.id.clone(),
            status: job.status,
            processed: job.processed,
            total: job.total,
            progress: job.progress_percent(),
            download_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::models::JobType;

    #[test]
    fn parses_iso_date_range() {
        let req = StartSettlementRequest {
            from: "2025-01-01".to_string(),
            to: "2025-01-31".to_string(),
        };
        let (from, to) = req.parse_range().unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    }

    #[test]
    fn rejects_malformed_dates() {
        for (from, to) in [
            ("2025-01-01", "31/01/2025"),
            ("not-a-date", "2025-01-31"),
            ("2025-02-30", "2025-03-01"),
            ("", "2025-01-31"),
        ] {
            let req = StartSettlementRequest {
                from: from.to_string(),
                to: to.to_string(),
            };
            assert!(req.parse_range().is_err(), "accepted {from}..{to}");
        }
    }

    fn job(status: JobStatus, result_path: Option<&str>) -> Job {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Job {
            id: "job_abc".to_string(),
            job_type: JobType::Settlement.as_str().to_string(),
            status,
            created_at: t,
            updated_at: t,
            started_at: None,
            completed_at: None,
            canceled_at: None,
            cancel_requested: false,
            total: 200,
            processed: 50,
            result_path: result_path.map(str::to_string),
            error: None,
            from_date: None,
            to_date: None,
        }
    }

    #[test]
    fn download_url_published_only_when_completed() {
        let running = JobStatusData::from_job(&job(JobStatus::Running, None));
        assert_eq!(running.download_url, None);
        assert_eq!(running.progress, 25);

        // FAILED may leave a partial file on disk; it is never exposed.
        let failed = JobStatusData::from_job(&job(JobStatus::Failed, Some("tmp/job_abc.csv")));
        assert_eq!(failed.download_url, None);

        let done = JobStatusData::from_job(&job(JobStatus::Completed, Some("tmp/job_abc.csv")));
        assert_eq!(done.download_url.as_deref(), Some("/downloads/job_abc.csv"));
    }
}
