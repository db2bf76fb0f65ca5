//! Site settings API handlers.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::get,
};
use tracing::instrument;

use vintage_shop_core::settings::{SiteSettings, SiteSettingsFields};

use super::forms::FormData;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::{HeroUploads, SettingsService};
use crate::state::AppState;

/// Build the site settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/site-settings", get(show).put(update))
}

/// Current settings, created with defaults on first read.
pub async fn show(State(state): State<AppState>) -> Result<Json<SiteSettings>> {
    let settings = SettingsService::new(state.repos(), state.images())
        .get_or_init()
        .await?;
    Ok(Json(settings))
}

/// Settings fields of a console form.
///
/// `categories` and `socialLinks` arrive JSON-encoded.
fn settings_fields(form: &FormData) -> Result<SiteSettingsFields> {
    Ok(SiteSettingsFields {
        site_name: form.text("siteName"),
        hero_title: form.text("heroTitle"),
        hero_subtitle: form.text("heroSubtitle"),
        footer_text: form.text("footerText"),
        contact_email: form.text("contactEmail"),
        contact_phone: form.text("contactPhone"),
        categories: form.json("categories")?,
        social_links: form.json("socialLinks")?,
        ..SiteSettingsFields::default()
    })
}

/// Update settings from a multipart form with optional hero images.
#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SiteSettings>> {
    let mut form = FormData::read(multipart).await?;
    let fields = settings_fields(&form)?;
    let heroes = HeroUploads {
        desktop: form.take_file("heroImageDesktop"),
        mobile: form.take_file("heroImageMobile"),
    };

    let settings = SettingsService::new(state.repos(), state.images())
        .update(fields, heroes)
        .await?;
    Ok(Json(settings))
}
