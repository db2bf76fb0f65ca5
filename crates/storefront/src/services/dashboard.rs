//! Admin dashboard figures.

use serde::Serialize;

use super::ServiceError;
use super::orders::OrderService;
use crate::db::Repositories;
use crate::models::views::OrderView;

/// Number of orders shown on the dashboard.
pub const RECENT_ORDER_COUNT: u32 = 5;

/// Dashboard summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub recent_orders: Vec<OrderView>,
}

/// Dashboard service.
pub struct DashboardService<'a> {
    repos: &'a Repositories,
}

impl<'a> DashboardService<'a> {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Product and order counts plus the most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        let total_products = self.repos.products.count().await?;
        let total_orders = self.repos.orders.count().await?;
        let recent_orders = OrderService::new(self.repos)
            .recent(RECENT_ORDER_COUNT)
            .await?;

        Ok(DashboardStats {
            total_products,
            total_orders,
            recent_orders,
        })
    }
}
