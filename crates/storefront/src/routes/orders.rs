//! Order API handlers.
//!
//! Customers work on their pending order (the cart) and read their own
//! orders. Admins list, move, cancel and delete any order.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vintage_shop_core::order::{CancelledOrder, ShippingDetails};
use vintage_shop_core::{OrderId, ProductId};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{CancelledOrderView, OrderView};
use crate::services::OrderService;
use crate::services::orders::AddToOrder;
use crate::state::AppState;

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orders",
            get(active).post(add).patch(set_quantity),
        )
        .route("/api/orders/count", get(count))
        .route("/api/orders/all", get(list_all))
        .route("/api/orders/cancelled", get(list_cancelled))
        .route(
            "/api/orders/{id}",
            get(show).patch(transition).delete(remove_line),
        )
        .route("/api/orders/{id}/cancel", post(cancel))
        .route("/api/orders/delete-order/{id}", delete(destroy))
}

// =============================================================================
// Customer
// =============================================================================

/// The caller's pending order, as a list of zero or one orders.
#[instrument(skip_all, fields(user = %user.id))]
pub async fn active(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderView>>> {
    let order = OrderService::new(state.repos())
        .get_active_order(user.id)
        .await?;
    Ok(Json(order.into_iter().collect()))
}

/// Add products to the caller's pending order.
#[instrument(skip_all, fields(user = %user.id))]
pub async fn add(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddToOrder>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let order = OrderService::new(state.repos())
        .add_or_update_lines(user.id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Body of a line quantity change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantity {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Overwrite one line's quantity in the caller's pending order.
#[instrument(skip_all, fields(user = %user.id, product = %body.product_id))]
pub async fn set_quantity(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SetQuantity>,
) -> Result<Json<OrderView>> {
    let order = OrderService::new(state.repos())
        .set_line_quantity(user.id, body.product_id, body.quantity)
        .await?;
    Ok(Json(order))
}

/// Remove a product from the caller's pending order.
#[instrument(skip_all, fields(user = %user.id, product = %product))]
pub async fn remove_line(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiPath(product): ApiPath<ProductId>,
) -> Result<Json<OrderView>> {
    let order = OrderService::new(state.repos())
        .remove_line(user.id, product)
        .await?;
    Ok(Json(order))
}

/// Item count badge.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Total quantity in the caller's pending order.
pub async fn count(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>> {
    let count = OrderService::new(state.repos()).line_count(user.id).await?;
    Ok(Json(CountResponse { count }))
}

/// One of the caller's own orders.
#[instrument(skip_all, fields(user = %user.id, order = %id))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    let order = OrderService::new(state.repos())
        .get_order_for_user(user.id, id)
        .await?;
    Ok(Json(order))
}

// =============================================================================
// Admin
// =============================================================================

/// Filter of the admin order listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    pub status: Option<String>,
}

/// Every order, optionally filtered by status.
#[instrument(skip_all, fields(status = ?filter.status))]
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ListFilter>,
) -> Result<Json<Vec<OrderView>>> {
    let status = filter.status.as_deref().filter(|s| !s.is_empty());
    let orders = OrderService::new(state.repos()).list_all(status).await?;
    Ok(Json(orders))
}

/// Every cancellation record.
pub async fn list_cancelled(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CancelledOrderView>>> {
    let records = OrderService::new(state.repos()).list_cancelled().await?;
    Ok(Json(records))
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
    #[serde(flatten)]
    pub details: ShippingDetails,
}

/// Force an order into a status.
#[instrument(skip_all, fields(admin = %admin.id, order = %id, status = %body.status))]
pub async fn transition(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusChange>,
) -> Result<Json<OrderView>> {
    let order = OrderService::new(state.repos())
        .transition_status(id, &body.status, body.details)
        .await?;
    Ok(Json(order))
}

/// Optional body of a cancellation.
#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Result of a cancellation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub order: OrderView,
    pub cancelled_order: CancelledOrder,
}

/// Read an optional JSON body. An empty body means no fields.
fn optional_body(body: &Bytes) -> Result<CancelRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CancelRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Cancel an order.
#[instrument(skip_all, fields(admin = %admin.id, order = %id))]
pub async fn cancel(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    body: Bytes,
) -> Result<Json<CancelResponse>> {
    let request = optional_body(&body)?;
    let reason = request.reason.filter(|r| !r.trim().is_empty());

    let cancellation = OrderService::new(state.repos()).cancel(id, reason).await?;
    Ok(Json(CancelResponse {
        order: cancellation.order,
        cancelled_order: cancellation.record,
    }))
}

/// Delete an order.
#[instrument(skip_all, fields(admin = %admin.id, order = %id))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<serde_json::Value>> {
    OrderService::new(state.repos()).delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Order deleted" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_cancel_body() {
        assert!(optional_body(&Bytes::new()).unwrap().reason.is_none());
        assert!(optional_body(&Bytes::from_static(b" \n")).unwrap().reason.is_none());
        assert_eq!(
            optional_body(&Bytes::from_static(br#"{"reason":"lost"}"#))
                .unwrap()
                .reason
                .as_deref(),
            Some("lost")
        );
        assert!(optional_body(&Bytes::from_static(b"{reason")).is_err());
    }

    #[test]
    fn test_status_change_flattens_details() {
        let body: StatusChange = serde_json::from_str(
            r#"{"status":"shipped","trackingNumber":"T-1","estimatedDelivery":"2026-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(body.status, "shipped");
        assert_eq!(body.details.tracking_number.as_deref(), Some("T-1"));
        assert!(body.details.estimated_delivery.is_some());
    }
}
