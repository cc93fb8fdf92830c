//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State, http::StatusCode};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1735689600000_u64)]
    pub timestamp_ms: u64,
}

/// Health check endpoint
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms}}
/// - Unhealthy: 503 Service Unavailable + {code: 503, msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    // Rate limit: only ping the database once per interval
    static LAST_CHECK_MS: AtomicU64 = AtomicU64::new(0);
    const CHECK_INTERVAL_MS: u64 = 5000;

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let last_check = LAST_CHECK_MS.load(Ordering::Relaxed);
    let healthy = if now_ms.saturating_sub(last_check) > CHECK_INTERVAL_MS {
        LAST_CHECK_MS.store(now_ms, Ordering::Relaxed);
        match state.db.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "database ping failed");
                false
            }
        }
    } else {
        true // Within interval, assume healthy
    };

    if healthy {
        (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                timestamp_ms: now_ms,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: error_codes::SERVICE_UNAVAILABLE,
                msg: "unavailable".to_string(),
                data: None,
            }),
        )
    }
}
