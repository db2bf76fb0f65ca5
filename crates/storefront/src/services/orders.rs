//! Order aggregate management.
//!
//! A user's pending order is their cart. This service merges products into
//! it, edits its lines, and drives orders through their lifecycle with the
//! archival side effects: a [`ShippedOrder`] on the first move into
//! "shipped" and a [`CancelledOrder`] on every cancellation.
//!
//! Every write goes through [`OrderRepository::update`], which checks the
//! order's version. Two requests racing on the same order therefore end with
//! one success and one Conflict instead of a silent lost update.
//!
//! [`OrderRepository::update`]: crate::db::OrderRepository::update

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use vintage_shop_core::order::{
    CancelledOrder, LineItem, Order, ShippedOrder, ShippingAddress, ShippingDetails,
    ensure_lines, positive_quantity,
};
use vintage_shop_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use super::ServiceError;
use crate::db::{RepositoryError, Repositories};
use crate::models::views::{CancelledOrderView, Lookup, OrderView, ShippedOrderView};

/// One product in an add-to-order request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Body of an add-to-order request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToOrder {
    pub products: Vec<LineRequest>,
    /// Amount added to the order total, as computed by the client.
    pub total_amount: Decimal,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

/// Result of a cancellation.
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub order: OrderView,
    pub record: CancelledOrder,
}

/// Order aggregate service.
pub struct OrderService<'a> {
    repos: &'a Repositories,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Merge products into the user's pending order, creating it if needed.
    ///
    /// Lines for a product already in the order increase its quantity;
    /// others are appended. `total_amount` is added to the stored total. The
    /// shipping address only applies when the order is created.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an empty request, a
    /// non-positive quantity or a negative total, and `ServiceError::Conflict`
    /// if the pending order changed concurrently.
    #[instrument(skip(self, request), fields(user = %user, lines = request.products.len()))]
    pub async fn add_or_update_lines(
        &self,
        user: UserId,
        request: AddToOrder,
    ) -> Result<OrderView, ServiceError> {
        let lines = request
            .products
            .into_iter()
            .map(|l| LineItem::new(l.product, l.quantity, l.size, l.color))
            .collect::<Result<Vec<_>, _>>()?;
        ensure_lines(&lines)?;
        let delta = Price::new(request.total_amount)?;

        let saved = match self.repos.orders.find_pending(user).await? {
            Some(mut order) => {
                order.merge_lines(lines);
                order.add_to_total(delta)?;
                self.repos.orders.update(&order).await?
            }
            None => {
                let order = Order::new_pending(
                    user,
                    lines,
                    delta,
                    request.shipping_address.unwrap_or_default(),
                    Utc::now(),
                );
                tracing::info!(order_id = %order.id, "Creating pending order");
                self.repos.orders.insert(&order).await?
            }
        };

        self.view(saved).await
    }

    /// Overwrite the quantity of one line of the user's pending order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a non-positive quantity and
    /// `ServiceError::NotFound` when there is no pending order or the product
    /// is not in it.
    #[instrument(skip(self), fields(user = %user, product = %product))]
    pub async fn set_line_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i64,
    ) -> Result<OrderView, ServiceError> {
        let quantity = positive_quantity(product, quantity)?;
        let mut order = self.pending(user).await?;

        let previous = order.set_line_quantity(product, quantity)?;
        self.reprice(&mut order, product, previous, quantity).await?;

        let saved = self.repos.orders.update(&order).await?;
        self.view(saved).await
    }

    /// Remove a product from the user's pending order.
    ///
    /// Removing a product that is not in the order changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when there is no pending order.
    #[instrument(skip(self), fields(user = %user, product = %product))]
    pub async fn remove_line(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<OrderView, ServiceError> {
        let mut order = self.pending(user).await?;

        let Some(removed) = order.remove_line(product) else {
            return self.view(order).await;
        };
        self.reprice(&mut order, product, removed.quantity, 0).await?;

        let saved = self.repos.orders.update(&order).await?;
        self.view(saved).await
    }

    /// The user's pending order, populated.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn get_active_order(&self, user: UserId) -> Result<Option<OrderView>, ServiceError> {
        match self.repos.orders.find_pending(user).await? {
            Some(order) => Ok(Some(self.view(order).await?)),
            None => Ok(None),
        }
    }

    /// Total quantity across the user's pending order, zero without one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn line_count(&self, user: UserId) -> Result<u64, ServiceError> {
        Ok(self
            .repos
            .orders
            .find_pending(user)
            .await?
            .map_or(0, |order| order.item_count()))
    }

    /// One of the user's own orders, in any status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist or
    /// belongs to someone else.
    pub async fn get_order_for_user(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<OrderView, ServiceError> {
        let order = self
            .repos
            .orders
            .get(id)
            .await?
            .filter(|order| order.user == user)
            .ok_or_else(|| ServiceError::NotFound("order".to_owned()))?;

        self.view(order).await
    }

    // =========================================================================
    // Lifecycle (admin)
    // =========================================================================

    /// Force an order into `status`.
    ///
    /// The first move into "shipped" records a [`ShippedOrder`] before the
    /// status is written. Any other move, backwards included, only
    /// overwrites the status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unknown status,
    /// `ServiceError::NotFound` if the order does not exist and
    /// `ServiceError::Conflict` when moving it back to pending while its
    /// owner already has another pending order.
    #[instrument(skip(self, details), fields(order = %id))]
    pub async fn transition_status(
        &self,
        id: OrderId,
        status: &str,
        details: ShippingDetails,
    ) -> Result<OrderView, ServiceError> {
        let next: OrderStatus = status.parse()?;
        let mut order = self.order(id).await?;

        if order.needs_shipping_record(next) {
            let record = ShippedOrder::new(order.id, details, Utc::now());
            self.repos.orders.insert_shipped(&record).await?;
            tracing::info!(shipped_id = %record.id, "Recorded shipment");
        }

        tracing::info!(from = %order.status, to = %next, "Changing order status");
        order.status = next;
        let saved = self.repos.orders.update(&order).await?;
        self.view(saved).await
    }

    /// Cancel an order and record why.
    ///
    /// Cancelling an order that is already cancelled is allowed and records
    /// another cancellation.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist and
    /// `ServiceError::Conflict` if it has shipped or been delivered.
    #[instrument(skip(self), fields(order = %id))]
    pub async fn cancel(
        &self,
        id: OrderId,
        reason: Option<String>,
    ) -> Result<Cancellation, ServiceError> {
        let mut order = self.order(id).await?;
        order.ensure_cancellable()?;

        let record = CancelledOrder::new(order.id, reason, Utc::now());
        self.repos.orders.insert_cancelled(&record).await?;

        order.status = OrderStatus::Cancelled;
        let saved = self.repos.orders.update(&order).await?;
        tracing::info!(reason = %record.reason, "Order cancelled");

        Ok(Cancellation {
            order: self.view(saved).await?,
            record,
        })
    }

    /// Delete an order. Its archive records stay behind.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order = %id))]
    pub async fn delete(&self, id: OrderId) -> Result<(), ServiceError> {
        self.repos
            .orders
            .delete(id)
            .await
            .map_err(|e| not_found(e, "order"))
    }

    // =========================================================================
    // Admin listings
    // =========================================================================

    /// Every order, newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unknown status.
    pub async fn list_all(&self, status: Option<&str>) -> Result<Vec<OrderView>, ServiceError> {
        let status = status.map(str::parse::<OrderStatus>).transpose()?;
        let orders = self.repos.orders.list(status).await?;
        self.populate(orders).await
    }

    /// The `limit` most recent orders, populated.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn recent(&self, limit: u32) -> Result<Vec<OrderView>, ServiceError> {
        let orders = self.repos.orders.list_recent(limit).await?;
        self.populate(orders).await
    }

    /// Every cancellation record with its order and that order's user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_cancelled(&self) -> Result<Vec<CancelledOrderView>, ServiceError> {
        let records = self.repos.orders.list_cancelled().await?;
        let ids: Vec<OrderId> = records.iter().map(|r| r.original_order).collect();
        let orders = self.by_id(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| CancelledOrderView::new(record, &orders))
            .collect())
    }

    /// Every shipping record with its order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_shipped(&self) -> Result<Vec<ShippedOrderView>, ServiceError> {
        let records = self.repos.orders.list_shipped().await?;
        let ids: Vec<OrderId> = records.iter().map(|r| r.original_order).collect();
        let orders = self.by_id(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| ShippedOrderView::new(record, &orders))
            .collect())
    }

    /// Any order, populated.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    pub async fn get_order_detail(&self, id: OrderId) -> Result<OrderView, ServiceError> {
        let order = self.order(id).await?;
        self.view(order).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn order(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.repos
            .orders
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("order".to_owned()))
    }

    async fn pending(&self, user: UserId) -> Result<Order, ServiceError> {
        self.repos
            .orders
            .find_pending(user)
            .await?
            .ok_or_else(|| ServiceError::NotFound("pending order".to_owned()))
    }

    /// Move the total by the catalog price of a quantity change.
    ///
    /// A product that has left the catalog leaves the total untouched.
    async fn reprice(
        &self,
        order: &mut Order,
        product: ProductId,
        old_quantity: u32,
        new_quantity: u32,
    ) -> Result<(), ServiceError> {
        let Some(entry) = self.repos.products.get(product).await? else {
            tracing::warn!(
                order_id = %order.id,
                product_id = %product,
                "Product no longer in catalog, order total left unchanged"
            );
            return Ok(());
        };

        if new_quantity >= old_quantity {
            order.add_to_total(entry.price.times(new_quantity - old_quantity)?)?;
        } else {
            let refund = entry.price.times(old_quantity - new_quantity)?;
            order.total_amount = order.total_amount.saturating_sub(refund);
        }
        Ok(())
    }

    async fn view(&self, order: Order) -> Result<OrderView, ServiceError> {
        let mut views = self.populate(vec![order]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound("order".to_owned()))
    }

    /// Resolve users and products of `orders` with one lookup each.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn populate(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, ServiceError> {
        let mut user_ids: Vec<UserId> = orders.iter().map(|o| o.user).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut product_ids: Vec<ProductId> = orders
            .iter()
            .flat_map(|o| o.lines.iter().map(|l| l.product))
            .collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let lookup = Lookup {
            users: self
                .repos
                .users
                .get_many(&user_ids)
                .await?
                .into_iter()
                .map(|u| (u.id, u.summary()))
                .collect(),
            products: self
                .repos
                .products
                .get_many(&product_ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect(),
        };

        Ok(orders
            .into_iter()
            .map(|order| OrderView::new(order, &lookup))
            .collect())
    }

    async fn by_id(&self, ids: &[OrderId]) -> Result<HashMap<OrderId, OrderView>, ServiceError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let orders = self.repos.orders.get_many(&ids).await?;
        Ok(self
            .populate(orders)
            .await?
            .into_iter()
            .map(|view| (view.id, view))
            .collect())
    }
}

/// Turn a repository `NotFound` into a named `ServiceError::NotFound`.
fn not_found(err: RepositoryError, what: &str) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound(what.to_owned()),
        other => other.into(),
    }
}
