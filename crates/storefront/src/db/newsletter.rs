//! Newsletter subscriber storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vintage_shop_core::Email;

use super::{NewsletterRepository, RepositoryError, conflict_on_unique};
use crate::models::newsletter::Subscriber;

/// Newsletter repository backed by `storefront.newsletter_subscriber`.
pub struct PgNewsletterRepository {
    pool: PgPool,
}

impl PgNewsletterRepository {
    /// Create a new newsletter repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsletterRepository for PgNewsletterRepository {
    async fn subscribe(
        &self,
        email: &Email,
        at: DateTime<Utc>,
    ) -> Result<Subscriber, RepositoryError> {
        let subscribed_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO storefront.newsletter_subscriber (email, subscribed_at) \
             VALUES ($1, $2) RETURNING subscribed_at",
        )
        .bind(email.as_str())
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email is already subscribed"))?;

        Ok(Subscriber {
            email: email.clone(),
            subscribed_at,
        })
    }
}
