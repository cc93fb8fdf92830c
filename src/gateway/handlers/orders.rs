//! Order handlers (place, fetch)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, CreateOrderRequest, created, ok};
use crate::models::Order;
use crate::store::OrderError;

/// Place an order
///
/// POST /orders
///
/// The stock decrement and the order insert commit atomically; under
/// contention the conditional update decides winners, so the endpoint can
/// never oversell.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid parameters"),
        (status = 409, description = "Out of stock"),
        (status = 500, description = "Backend failure")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Order> {
    if let Err(msg) = req.validate() {
        return ApiError::bad_request(msg).into_err();
    }

    match state
        .orders
        .place_order(req.product_id, req.quantity, &req.buyer_id)
        .await
    {
        Ok(order) => {
            tracing::info!(
                order_id = order.id,
                product_id = order.product_id,
                quantity = order.quantity,
                "order placed"
            );
            created(order)
        }
        // Expected contention outcome, not an error worth logging.
        Err(OrderError::OutOfStock) => ApiError::conflict("OUT_OF_STOCK").into_err(),
        Err(OrderError::Database(e)) => {
            tracing::error!(product_id = req.product_id, error = %e, "order placement failed");
            ApiError::db_error(e.to_string()).into_err()
        }
    }
}

/// Fetch an order by id
///
/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 404, description = "Unknown order")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    match state.orders.get_by_id(id).await {
        Ok(Some(order)) => ok(order),
        Ok(None) => ApiError::not_found("order not found").into_err(),
        Err(e) => {
            tracing::error!(order_id = id, error = %e, "order lookup failed");
            ApiError::db_error(e.to_string()).into_err()
        }
    }
}
