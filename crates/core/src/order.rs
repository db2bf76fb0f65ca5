//! Orders and their lifecycle rules.
//!
//! An [`Order`] doubles as the user's cart while its status is
//! [`OrderStatus::Pending`]. Adding products merges into the pending order by
//! product ID; an admin later moves it through the lifecycle. Two transitions
//! leave an archival record behind: the first move into "shipped" creates a
//! [`ShippedOrder`], and a cancellation creates a [`CancelledOrder`]. Those
//! records hold a plain order ID and outlive the order if it is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    CancelledOrderId, OrderId, OrderStatus, Price, ProductId, ShippedOrderId, UserId,
};

/// Reason stored when a cancellation does not give one.
pub const DEFAULT_CANCEL_REASON: &str = "No reason provided";

/// Errors raised by order rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// An add-to-order request carried no lines.
    #[error("order must contain at least one product")]
    NoLines,
    /// A quantity was zero, negative or too large.
    #[error("quantity for product {product} must be a positive integer (got {quantity})")]
    InvalidQuantity { product: ProductId, quantity: i64 },
    /// The product is not a line of the order.
    #[error("product {0} not found in order")]
    LineNotFound(ProductId),
    /// Cancel was attempted from a status that forbids it.
    #[error("cannot cancel an order that is {0}")]
    NotCancellable(OrderStatus),
}

/// One product entry of an order.
///
/// Size and color are carried for display but are not part of the merge key:
/// a product appears at most once per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LineItem {
    /// Build a line from an untrusted quantity.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidQuantity`] unless `1 <= quantity <= u32::MAX`.
    pub fn new(
        product: ProductId,
        quantity: i64,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<Self, OrderError> {
        Ok(Self {
            product,
            quantity: positive_quantity(product, quantity)?,
            size,
            color,
        })
    }
}

/// Validate a requested quantity.
///
/// # Errors
///
/// Returns [`OrderError::InvalidQuantity`] for zero, negative or oversized values.
pub fn positive_quantity(product: ProductId, quantity: i64) -> Result<u32, OrderError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(OrderError::InvalidQuantity { product, quantity })
}

/// Where an order ships to. Every field is optional free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// An order (or, while pending, the user's cart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub lines: Vec<LineItem>,
    pub total_amount: Price,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token; bumped by the store on every write.
    pub version: i64,
}

impl Order {
    /// Start a new pending order for `user`.
    #[must_use]
    pub fn new_pending(
        user: UserId,
        lines: Vec<LineItem>,
        total_amount: Price,
        shipping_address: ShippingAddress,
        now: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            id: OrderId::generate(),
            user,
            lines: Vec::with_capacity(lines.len()),
            total_amount,
            shipping_address,
            status: OrderStatus::Pending,
            created_at: now,
            version: 0,
        };
        // Duplicates inside a single request collapse the same way as later adds.
        order.merge_lines(lines);
        order
    }

    /// Merge incoming lines by product ID.
    ///
    /// A product already in the order has its quantity increased; a new
    /// product is appended. Size and color of an existing line are kept.
    pub fn merge_lines(&mut self, incoming: impl IntoIterator<Item = LineItem>) {
        for line in incoming {
            match self.lines.iter_mut().find(|l| l.product == line.product) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => self.lines.push(line),
            }
        }
    }

    /// Add a caller-supplied delta to the running total.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PriceError::Overflow`] if the sum is out of range.
    pub fn add_to_total(&mut self, delta: Price) -> Result<(), crate::PriceError> {
        self.total_amount = self.total_amount.checked_add(delta)?;
        Ok(())
    }

    /// The line for `product`, if any.
    #[must_use]
    pub fn line(&self, product: ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.product == product)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Overwrite the quantity of an existing line, returning the old quantity.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::LineNotFound`] if `product` is not in the order.
    pub fn set_line_quantity(
        &mut self,
        product: ProductId,
        quantity: u32,
    ) -> Result<u32, OrderError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product == product)
            .ok_or(OrderError::LineNotFound(product))?;
        Ok(std::mem::replace(&mut line.quantity, quantity))
    }

    /// Remove the line for `product`, returning it if it was present.
    pub fn remove_line(&mut self, product: ProductId) -> Option<LineItem> {
        let index = self.lines.iter().position(|l| l.product == product)?;
        Some(self.lines.remove(index))
    }

    /// Check the cancel guard.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotCancellable`] for shipped or delivered orders.
    pub const fn ensure_cancellable(&self) -> Result<(), OrderError> {
        if self.status.is_cancellable() {
            Ok(())
        } else {
            Err(OrderError::NotCancellable(self.status))
        }
    }

    /// Whether moving to `next` must create a [`ShippedOrder`] record.
    ///
    /// Only the first entry into "shipped" is archived; re-setting an already
    /// shipped order is a plain status write.
    #[must_use]
    pub fn needs_shipping_record(&self, next: OrderStatus) -> bool {
        next == OrderStatus::Shipped && self.status != OrderStatus::Shipped
    }
}

/// Validate the lines of an add-to-order request.
///
/// # Errors
///
/// Returns [`OrderError::NoLines`] for an empty request.
pub fn ensure_lines(lines: &[LineItem]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::NoLines);
    }
    Ok(())
}

/// Extra data accepted with a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Archival record written when an order first ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippedOrder {
    pub id: ShippedOrderId,
    pub original_order: OrderId,
    pub shipped_at: DateTime<Utc>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl ShippedOrder {
    /// Record that `order` shipped at `now`.
    #[must_use]
    pub fn new(order: OrderId, details: ShippingDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: ShippedOrderId::generate(),
            original_order: order,
            shipped_at: now,
            tracking_number: details.tracking_number,
            estimated_delivery: details.estimated_delivery,
        }
    }
}

/// Archival record written when an order is cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledOrder {
    pub id: CancelledOrderId,
    pub original_order: OrderId,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
}

impl CancelledOrder {
    /// Record that `order` was cancelled. Blank reasons fall back to
    /// [`DEFAULT_CANCEL_REASON`].
    #[must_use]
    pub fn new(order: OrderId, reason: Option<String>, now: DateTime<Utc>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_owned());
        Self {
            id: CancelledOrderId::generate(),
            original_order: order,
            cancelled_at: now,
            reason,
        }
    }
}
