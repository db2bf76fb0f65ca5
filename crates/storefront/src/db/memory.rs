//! In-memory implementation of every repository trait.
//!
//! Mirrors the `PostgreSQL` constraints that the services rely on: one
//! pending order per user, version-checked order updates, unique user and
//! subscriber emails, and a single settings record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use vintage_shop_core::catalog::{Product, ProductQuery, sort_products};
use vintage_shop_core::order::{CancelledOrder, Order, ShippedOrder};
use vintage_shop_core::settings::SiteSettings;
use vintage_shop_core::user::{NewUser, User};
use vintage_shop_core::{Email, OrderId, OrderStatus, ProductId, UserId};

use super::{
    NewsletterRepository, OrderRepository, ProductRepository, RepositoryError,
    SettingsRepository, UserRepository,
};
use crate::models::newsletter::Subscriber;

#[derive(Default)]
struct Tables {
    orders: Vec<Order>,
    shipped: Vec<ShippedOrder>,
    cancelled: Vec<CancelledOrder>,
    products: Vec<Product>,
    users: Vec<User>,
    settings: Option<SiteSettings>,
    subscribers: Vec<Subscriber>,
}

/// Store that keeps every table in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(
    rows: &[T],
    created_at: impl Fn(&T) -> DateTime<Utc>,
    limit: Option<usize>,
) -> Vec<T> {
    // Reverse first so rows sharing a timestamp keep newest-inserted first.
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}

fn second_pending(tables: &Tables, order: &Order) -> bool {
    order.status == OrderStatus::Pending
        && tables.orders.iter().any(|o| {
            o.id != order.id && o.user == order.user && o.status == OrderStatus::Pending
        })
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find_pending(&self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| o.user == user && o.status == OrderStatus::Pending)
            .cloned())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn get_many(&self, ids: &[OrderId]) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|o| ids.contains(&o.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, order: &Order) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if second_pending(&tables, order) {
            return Err(RepositoryError::Conflict(
                "user already has a pending order".to_owned(),
            ));
        }
        if tables.orders.iter().any(|o| o.id == order.id) {
            return Err(RepositoryError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }

        let mut stored = order.clone();
        stored.version = 0;
        tables.orders.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, order: &Order) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if second_pending(&tables, order) {
            return Err(RepositoryError::Conflict(
                "user already has a pending order".to_owned(),
            ));
        }

        let stored = tables
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != order.version {
            return Err(RepositoryError::Conflict(format!(
                "order {} was modified concurrently",
                order.id
            )));
        }

        stored.lines.clone_from(&order.lines);
        stored.total_amount = order.total_amount;
        stored.shipping_address.clone_from(&order.shipping_address);
        stored.status = order.status;
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        if tables.orders.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders = newest_first(&tables.orders, |o| o.created_at, None);
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        Ok(orders)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(newest_first(&tables.orders, |o| o.created_at, Some(limit)))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.len() as u64)
    }

    async fn insert_shipped(&self, record: &ShippedOrder) -> Result<(), RepositoryError> {
        self.tables.write().await.shipped.push(record.clone());
        Ok(())
    }

    async fn list_shipped(&self) -> Result<Vec<ShippedOrder>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.shipped, |r| r.shipped_at, None))
    }

    async fn insert_cancelled(&self, record: &CancelledOrder) -> Result<(), RepositoryError> {
        self.tables.write().await.cancelled.push(record.clone());
        Ok(())
    }

    async fn list_cancelled(&self) -> Result<Vec<CancelledOrder>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.cancelled, |r| r.cancelled_at, None))
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn search(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64), RepositoryError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Product> = tables
            .products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        sort_products(&mut matching, query.sort);

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.products.iter().any(|p| p.id == product.id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        tables.products.push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(RepositoryError::NotFound)?;
        let created_at = stored.created_at;
        *stored = product.clone();
        stored.created_at = created_at;
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        if tables.products.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.len() as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: user.id.unwrap_or_else(UserId::generate),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get_or_init(&self, defaults: &SiteSettings) -> Result<SiteSettings, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.settings.get_or_insert_with(|| defaults.clone()).clone())
    }

    async fn save(&self, settings: &SiteSettings) -> Result<SiteSettings, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.settings = Some(settings.clone());
        Ok(settings.clone())
    }
}

#[async_trait]
impl NewsletterRepository for MemoryStore {
    async fn subscribe(
        &self,
        email: &Email,
        at: DateTime<Utc>,
    ) -> Result<Subscriber, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.subscribers.iter().any(|s| &s.email == email) {
            return Err(RepositoryError::Conflict(
                "email is already subscribed".to_owned(),
            ));
        }

        let subscriber = Subscriber {
            email: email.clone(),
            subscribed_at: at,
        };
        tables.subscribers.push(subscriber.clone());
        Ok(subscriber)
    }
}
