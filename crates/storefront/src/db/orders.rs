//! `PostgreSQL` storage for orders and their archive records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use vintage_shop_core::order::{CancelledOrder, LineItem, Order, ShippedOrder, ShippingAddress};
use vintage_shop_core::{CancelledOrderId, OrderId, OrderStatus, Price, ShippedOrderId, UserId};

use super::{OrderRepository, RepositoryError, conflict_on_unique, row_count};

const ORDER_COLUMNS: &str = "id, user_id, line_items, total_amount, shipping_address, status, \
                             created_at, version";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    line_items: Json<Vec<LineItem>>,
    total_amount: Decimal,
    shipping_address: Json<ShippingAddress>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_amount = Price::new(row.total_amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("order {} total: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user: row.user_id,
            lines: row.line_items.0,
            total_amount,
            shipping_address: row.shipping_address.0,
            status: row.status,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShippedOrderRow {
    id: ShippedOrderId,
    order_id: OrderId,
    shipped_at: DateTime<Utc>,
    tracking_number: Option<String>,
    estimated_delivery: Option<DateTime<Utc>>,
}

impl From<ShippedOrderRow> for ShippedOrder {
    fn from(row: ShippedOrderRow) -> Self {
        Self {
            id: row.id,
            original_order: row.order_id,
            shipped_at: row.shipped_at,
            tracking_number: row.tracking_number,
            estimated_delivery: row.estimated_delivery,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CancelledOrderRow {
    id: CancelledOrderId,
    order_id: OrderId,
    cancelled_at: DateTime<Utc>,
    reason: String,
}

impl From<CancelledOrderRow> for CancelledOrder {
    fn from(row: CancelledOrderRow) -> Self {
        Self {
            id: row.id,
            original_order: row.order_id,
            cancelled_at: row.cancelled_at,
            reason: row.reason,
        }
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    rows.into_iter().map(Order::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Order repository backed by `storefront.customer_order`.
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_pending(&self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order \
             WHERE user_id = $1 AND status = 'pending'"
        ))
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn get_many(&self, ids: &[OrderId]) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    async fn insert(&self, order: &Order) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO storefront.customer_order \
                 (id, user_id, line_items, total_amount, shipping_address, status, created_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id)
        .bind(order.user)
        .bind(Json(&order.lines))
        .bind(order.total_amount.amount())
        .bind(Json(&order.shipping_address))
        .bind(order.status)
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user already has a pending order"))?;

        row.try_into()
    }

    async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE storefront.customer_order \
             SET line_items = $3, total_amount = $4, shipping_address = $5, status = $6, \
                 version = version + 1 \
             WHERE id = $1 AND version = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id)
        .bind(order.version)
        .bind(Json(&order.lines))
        .bind(order.total_amount.amount())
        .bind(Json(&order.shipping_address))
        .bind(order.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user already has a pending order"))?;

        if let Some(row) = row {
            return row.try_into();
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM storefront.customer_order WHERE id = $1)",
        )
        .bind(order.id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Err(RepositoryError::Conflict(format!(
                "order {} was modified concurrently",
                order.id
            )))
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.customer_order WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order \
             WHERE $1::storefront.order_status IS NULL OR status = $1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order \
             ORDER BY created_at DESC, id LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        into_orders(rows)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.customer_order")
            .fetch_one(&self.pool)
            .await?;
        row_count(count)
    }

    async fn insert_shipped(&self, record: &ShippedOrder) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.shipped_order \
                 (id, order_id, shipped_at, tracking_number, estimated_delivery) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(record.original_order)
        .bind(record.shipped_at)
        .bind(&record.tracking_number)
        .bind(record.estimated_delivery)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_shipped(&self) -> Result<Vec<ShippedOrder>, RepositoryError> {
        let rows: Vec<ShippedOrderRow> = sqlx::query_as(
            "SELECT id, order_id, shipped_at, tracking_number, estimated_delivery \
             FROM storefront.shipped_order ORDER BY shipped_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ShippedOrder::from).collect())
    }

    async fn insert_cancelled(&self, record: &CancelledOrder) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.cancelled_order (id, order_id, cancelled_at, reason) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id)
        .bind(record.original_order)
        .bind(record.cancelled_at)
        .bind(&record.reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_cancelled(&self) -> Result<Vec<CancelledOrder>, RepositoryError> {
        let rows: Vec<CancelledOrderRow> = sqlx::query_as(
            "SELECT id, order_id, cancelled_at, reason \
             FROM storefront.cancelled_order ORDER BY cancelled_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CancelledOrder::from).collect())
    }
}
