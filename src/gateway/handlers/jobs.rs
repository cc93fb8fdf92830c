//! Settlement job handlers (start, status, cancel)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CancelAccepted, JobAccepted, JobStatusData, StartSettlementRequest,
    created, ok,
};
use crate::models::JobStatus;

fn new_job_id() -> String {
    format!("job_{}", Uuid::new_v4().simple())
}

/// Start a settlement job
///
/// POST /jobs/settlement
///
/// Counts the PAID rows in range, records the QUEUED job and enqueues it.
/// The call returns as soon as the id is on the dispatch queue; processing
/// is strictly sequential per process.
#[utoipa::path(
    post,
    path = "/jobs/settlement",
    request_body = StartSettlementRequest,
    responses(
        (status = 201, description = "Job queued", body = JobAccepted),
        (status = 400, description = "Bad date"),
        (status = 500, description = "Backend failure")
    ),
    tag = "Jobs"
)]
pub async fn start_settlement(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartSettlementRequest>,
) -> ApiResult<JobAccepted> {
    let (from, to) = match req.parse_range() {
        Ok(range) => range,
        Err(msg) => return ApiError::bad_request(msg).into_err(),
    };

    let job_id = new_job_id();
    if let Err(e) = state.runner.start_settlement(&job_id, from, to).await {
        tracing::error!(job_id = %job_id, error = %e, "failed to start settlement job");
        return ApiError::internal(e.to_string()).into_err();
    }

    created(JobAccepted {
        job_id,
        status: JobStatus::Queued,
    })
}

/// Fetch job status and progress
///
/// GET /jobs/{id}
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job status", body = JobStatusData),
        (status = 404, description = "Unknown job")
    ),
    tag = "Jobs"
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<JobStatusData> {
    match state.jobs.get(&id).await {
        Ok(Some(job)) => ok(JobStatusData::from_job(&job)),
        Ok(None) => ApiError::not_found("job not found").into_err(),
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "job lookup failed");
            ApiError::db_error(e.to_string()).into_err()
        }
    }
}

/// Request cancellation of a job
///
/// POST /jobs/{id}/cancel
///
/// Records the request; the running controller observes the flag at its
/// next checkpoint and stops without writing partial output. Safe to call
/// repeatedly and in any non-terminal state.
#[utoipa::path(
    post,
    path = "/jobs/{id}/cancel",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Cancellation recorded", body = CancelAccepted),
        (status = 404, description = "Unknown job")
    ),
    tag = "Jobs"
)]
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<CancelAccepted> {
    match state.jobs.request_cancel(&id).await {
        Ok(true) => {
            tracing::info!(job_id = %id, "job cancellation requested");
            ok(CancelAccepted {
                job_id: id,
                status: "CANCEL_REQUESTED".to_string(),
            })
        }
        Ok(false) => ApiError::not_found("job not found").into_err(),
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "cancel request failed");
            ApiError::db_error(e.to_string()).into_err()
        }
    }
}
