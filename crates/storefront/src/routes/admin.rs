//! Admin console API handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use vintage_shop_core::OrderId;

use super::extract::ApiPath;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentUser, OrderView};
use crate::services::{DashboardService, DashboardStats, OrderService};
use crate::state::AppState;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/verify", get(verify))
        .route("/api/admin/dashboard-stats", get(dashboard_stats))
        .route("/api/admin/orders/{id}", get(order_detail))
}

/// Response of the admin identity check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_admin: bool,
    pub user: CurrentUser,
}

/// Confirm the caller is an admin.
pub async fn verify(RequireAdmin(admin): RequireAdmin) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        is_admin: true,
        user: admin,
    })
}

/// Figures for the dashboard.
pub async fn dashboard_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>> {
    Ok(Json(DashboardService::new(state.repos()).stats().await?))
}

/// Any order, populated.
pub async fn order_detail(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    let order = OrderService::new(state.repos()).get_order_detail(id).await?;
    Ok(Json(order))
}
