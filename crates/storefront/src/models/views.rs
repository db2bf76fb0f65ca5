//! Order views with users and products resolved.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use vintage_shop_core::catalog::Product;
use vintage_shop_core::order::{CancelledOrder, Order, ShippedOrder, ShippingAddress};
use vintage_shop_core::user::UserSummary;
use vintage_shop_core::{
    CancelledOrderId, OrderId, OrderStatus, Price, ProductId, ShippedOrderId, UserId,
};

/// Users and products referenced by a batch of orders.
#[derive(Debug, Default)]
pub struct Lookup {
    pub users: HashMap<UserId, UserSummary>,
    pub products: HashMap<ProductId, Product>,
}

/// One order line with its product resolved.
///
/// `product` is `None` when the product has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub product_id: ProductId,
    pub product: Option<Product>,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// An order as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    /// `None` when the user record is unknown to the shop.
    pub user: Option<UserSummary>,
    pub products: Vec<LineView>,
    pub total_amount: Price,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl OrderView {
    #[must_use]
    pub fn new(order: Order, lookup: &Lookup) -> Self {
        let products = order
            .lines
            .into_iter()
            .map(|line| LineView {
                product_id: line.product,
                product: lookup.products.get(&line.product).cloned(),
                quantity: line.quantity,
                size: line.size,
                color: line.color,
            })
            .collect();

        Self {
            id: order.id,
            user_id: order.user,
            user: lookup.users.get(&order.user).cloned(),
            products,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
            status: order.status,
            created_at: order.created_at,
            version: order.version,
        }
    }
}

/// A cancellation record with the original order resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledOrderView {
    pub id: CancelledOrderId,
    pub original_order_id: OrderId,
    /// `None` once the order has been deleted.
    pub original_order: Option<OrderView>,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
}

impl CancelledOrderView {
    #[must_use]
    pub fn new(record: CancelledOrder, orders: &HashMap<OrderId, OrderView>) -> Self {
        Self {
            id: record.id,
            original_order_id: record.original_order,
            original_order: orders.get(&record.original_order).cloned(),
            cancelled_at: record.cancelled_at,
            reason: record.reason,
        }
    }
}

/// A shipping record with the original order resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippedOrderView {
    pub id: ShippedOrderId,
    pub original_order_id: OrderId,
    pub original_order: Option<OrderView>,
    pub shipped_at: DateTime<Utc>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl ShippedOrderView {
    #[must_use]
    pub fn new(record: ShippedOrder, orders: &HashMap<OrderId, OrderView>) -> Self {
        Self {
            id: record.id,
            original_order_id: record.original_order,
            original_order: orders.get(&record.original_order).cloned(),
            shipped_at: record.shipped_at,
            tracking_number: record.tracking_number,
            estimated_delivery: record.estimated_delivery,
        }
    }
}
