//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Readiness (store ping)
//!
//! # Products
//! GET    /api/products                  - Listing (category, search, featured, sort, page, limit)
//! GET    /api/products/{id}             - Product detail
//! POST   /api/products                  - Create (admin, multipart)
//! PATCH  /api/products/{id}             - Update (admin, multipart)
//! DELETE /api/products/{id}             - Delete (admin)
//!
//! # Orders
//! GET    /api/orders                    - Caller's pending order
//! POST   /api/orders                    - Add products to it
//! PATCH  /api/orders                    - Set a line quantity
//! DELETE /api/orders/{productId}        - Remove a line
//! GET    /api/orders/count              - Item count
//! GET    /api/orders/{id}               - One of the caller's orders
//! GET    /api/orders/all                - Every order (admin)
//! GET    /api/orders/cancelled          - Cancellation records (admin)
//! PATCH  /api/orders/{id}               - Change status (admin)
//! POST   /api/orders/{id}/cancel        - Cancel (admin)
//! DELETE /api/orders/delete-order/{id}  - Delete (admin)
//! GET    /api/shipped-orders            - Shipping records (admin)
//!
//! # Settings
//! GET    /api/site-settings             - Read (created on first use)
//! PUT    /api/site-settings             - Update (admin, multipart)
//!
//! # Admin
//! GET    /api/admin/verify              - Admin identity check
//! GET    /api/admin/dashboard-stats     - Dashboard figures
//! GET    /api/admin/orders/{id}         - Order detail
//!
//! # Newsletter
//! POST   /api/newsletter/subscribe      - Subscribe
//! ```

pub mod admin;
pub mod extract;
pub mod forms;
pub mod health;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod shipped_orders;
pub mod site_settings;

use axum::Router;

use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(shipped_orders::router())
        .merge(site_settings::router())
        .merge(admin::router())
        .merge(newsletter::router())
}
