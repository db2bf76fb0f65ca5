//! Site settings storage.
//!
//! The settings live as a single JSONB document in `storefront.site_settings`.
//! The table's primary key is a boolean constrained to `TRUE`, so at most one
//! row can ever exist.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use vintage_shop_core::settings::SiteSettings;

use super::{RepositoryError, SettingsRepository};

/// Settings repository backed by `storefront.site_settings`.
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get_or_init(&self, defaults: &SiteSettings) -> Result<SiteSettings, RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.site_settings (id, value) VALUES (TRUE, $1) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Json(defaults))
        .execute(&self.pool)
        .await?;

        let Json(settings): Json<SiteSettings> =
            sqlx::query_scalar("SELECT value FROM storefront.site_settings WHERE id")
                .fetch_one(&self.pool)
                .await?;

        Ok(settings)
    }

    async fn save(&self, settings: &SiteSettings) -> Result<SiteSettings, RepositoryError> {
        let Json(saved): Json<SiteSettings> = sqlx::query_scalar(
            "INSERT INTO storefront.site_settings (id, value) VALUES (TRUE, $1) \
             ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING value",
        )
        .bind(Json(settings))
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
