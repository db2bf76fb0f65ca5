//! Shipment archive API handlers.

use axum::{Json, Router, extract::State, routing::get};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::ShippedOrderView;
use crate::services::OrderService;
use crate::state::AppState;

/// Build the shipped-orders router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/shipped-orders", get(list))
}

/// Every shipping record with its order.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ShippedOrderView>>> {
    let records = OrderService::new(state.repos()).list_shipped().await?;
    Ok(Json(records))
}
