//! OpenAPI documentation
//!
//! The generated document is served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    CancelAccepted, CreateOrderRequest, JobAccepted, JobStatusData, StartSettlementRequest,
};
use crate::models::{JobStatus, Order};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mercato Commerce API",
        version = "1.0.0",
        description = "Order placement with contention-safe stock decrement, and asynchronous merchant settlement jobs with progress and cancellation.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_order,
        crate::gateway::handlers::get_order,
        crate::gateway::handlers::start_settlement,
        crate::gateway::handlers::get_job,
        crate::gateway::handlers::cancel_job,
    ),
    components(
        schemas(
            HealthResponse,
            Order,
            JobStatus,
            CreateOrderRequest,
            StartSettlementRequest,
            JobAccepted,
            JobStatusData,
            CancelAccepted,
        )
    ),
    tags(
        (name = "Orders", description = "Order placement and lookup"),
        (name = "Jobs", description = "Settlement job control"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/health",
            "/orders",
            "/orders/{id}",
            "/jobs/settlement",
            "/jobs/{id}",
            "/jobs/{id}/cancel",
        ] {
            assert!(
                paths.iter().any(|p| *p == expected),
                "missing path {expected}, have {paths:?}"
            );
        }
    }
}
