//! API response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiResult<T>`: Type alias for handler return types
//! - `ApiError`: Unified error type with IntoResponse
//! - `error_codes`: Standard error code constants

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// ApiResult: DRY Type Alias for Handlers
// ============================================================================

/// Type alias for handler return types - reduces boilerplate
pub type ApiResult<T> =
    Result<(StatusCode, Json<ApiResponse<T>>), (StatusCode, Json<ApiResponse<()>>)>;

/// Helper to create success response (200 OK)
#[inline]
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// Helper to create created response (201 CREATED)
#[inline]
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

// ============================================================================
// ApiError: Unified Error Type
// ============================================================================

/// Unified API error type with automatic IntoResponse
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub message: String,
}

impl ApiError {
    /// Create a new ApiError
    pub fn new(status: StatusCode, code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 Bad Request with INVALID_PARAMETER code
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    /// 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }

    /// 409 Conflict (stock exhausted)
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, error_codes::OUT_OF_STOCK, msg)
    }

    /// 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    /// Database error (500)
    pub fn db_error(msg: impl Into<String>) -> Self {
        Self::internal(format!("Database error: {}", msg.into()))
    }

    /// Convert to handler error tuple
    pub fn into_err<T>(self) -> ApiResult<T> {
        Err((
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.message)),
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ApiResponse::<()>::error(self.code, self.message));
        (self.status, body).into_response()
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const OUT_OF_STOCK: i32 = 1002;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}
