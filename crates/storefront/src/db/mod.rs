//! Persistence for the storefront.
//!
//! # Database: `vintage_shop`
//!
//! Everything lives in the `storefront` schema:
//!
//! ## Tables
//!
//! - `user` - Contact details of users known to the identity gateway
//! - `product` - Catalog entries
//! - `customer_order` - Orders; a `pending` row is the user's cart
//! - `shipped_order` - Archive row written when an order first ships
//! - `cancelled_order` - Archive row written on every cancellation
//! - `site_settings` - Singleton row, created lazily with defaults
//! - `newsletter_subscriber` - Newsletter sign-ups
//!
//! Each table is reached through a repository trait so the HTTP layer can
//! run against either `PostgreSQL` or the in-memory [`MemoryStore`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p vintage-shop-cli -- migrate
//! ```

pub mod memory;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use vintage_shop_core::catalog::{Product, ProductQuery};
use vintage_shop_core::order::{CancelledOrder, Order, ShippedOrder};
use vintage_shop_core::settings::SiteSettings;
use vintage_shop_core::user::{NewUser, User};
use vintage_shop_core::{Email, OrderId, OrderStatus, ProductId, UserId};

pub use memory::MemoryStore;
pub use newsletter::PgNewsletterRepository;
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;
pub use settings::PgSettingsRepository;
pub use users::PgUserRepository;

use crate::models::newsletter::Subscriber;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or stale write.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Orders and their archive records.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// The user's pending order, if any.
    async fn find_pending(&self, user: UserId) -> Result<Option<Order>, RepositoryError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Orders with the given IDs, in no particular order. Missing IDs are skipped.
    async fn get_many(&self, ids: &[OrderId]) -> Result<Vec<Order>, RepositoryError>;

    /// Insert a new order.
    ///
    /// Returns [`RepositoryError::Conflict`] if it would give the user a
    /// second pending order.
    async fn insert(&self, order: &Order) -> Result<Order, RepositoryError>;

    /// Overwrite an order if its stored version still equals `order.version`.
    ///
    /// Returns the stored order with its version bumped,
    /// [`RepositoryError::Conflict`] on a stale version and
    /// [`RepositoryError::NotFound`] if the order is gone.
    async fn update(&self, order: &Order) -> Result<Order, RepositoryError>;

    /// Delete an order. Archive records are left alone.
    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError>;

    /// Every order, newest first, optionally restricted to one status.
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError>;

    /// The `limit` most recent orders.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;

    async fn insert_shipped(&self, record: &ShippedOrder) -> Result<(), RepositoryError>;

    /// Every shipped record, most recent first.
    async fn list_shipped(&self) -> Result<Vec<ShippedOrder>, RepositoryError>;

    async fn insert_cancelled(&self, record: &CancelledOrder) -> Result<(), RepositoryError>;

    /// Every cancelled record, most recent first.
    async fn list_cancelled(&self) -> Result<Vec<CancelledOrder>, RepositoryError>;
}

/// Catalog storage.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of products matching `query`, plus the total match count.
    async fn search(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64), RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products with the given IDs. Missing IDs are skipped.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Overwrite a product. [`RepositoryError::NotFound`] if it is gone.
    async fn update(&self, product: &Product) -> Result<(), RepositoryError>;

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// User records used to decorate order views.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. [`RepositoryError::Conflict`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Users with the given IDs. Missing IDs are skipped.
    async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;
}

/// The site settings singleton.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Read the settings, storing `defaults` first if no record exists.
    ///
    /// Concurrent first reads agree on a single record.
    async fn get_or_init(&self, defaults: &SiteSettings) -> Result<SiteSettings, RepositoryError>;

    /// Replace the stored settings.
    async fn save(&self, settings: &SiteSettings) -> Result<SiteSettings, RepositoryError>;
}

/// Newsletter sign-ups.
#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    /// Record a subscription. [`RepositoryError::Conflict`] if already subscribed.
    async fn subscribe(
        &self,
        email: &Email,
        at: DateTime<Utc>,
    ) -> Result<Subscriber, RepositoryError>;
}

/// The full set of repositories handed to services.
#[derive(Clone)]
pub struct Repositories {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub newsletter: Arc<dyn NewsletterRepository>,
    pool: Option<PgPool>,
}

impl Repositories {
    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            settings: Arc::new(PgSettingsRepository::new(pool.clone())),
            newsletter: Arc::new(PgNewsletterRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories sharing one fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            orders: store.clone(),
            products: store.clone(),
            users: store.clone(),
            settings: store.clone(),
            newsletter: store,
            pool: None,
        }
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `SELECT 1` fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a row count into `u64`.
pub(crate) fn row_count(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {value}")))
}
