//! Site settings.

use tracing::instrument;

use vintage_shop_core::settings::{SiteSettings, SiteSettingsFields};

use super::ServiceError;
use super::images::{ImageStore, ImageUpload};
use crate::db::Repositories;

/// New hero images sent with a settings update.
#[derive(Debug, Default)]
pub struct HeroUploads {
    pub desktop: Option<ImageUpload>,
    pub mobile: Option<ImageUpload>,
}

/// Settings service.
pub struct SettingsService<'a> {
    repos: &'a Repositories,
    images: &'a dyn ImageStore,
}

impl<'a> SettingsService<'a> {
    /// Create a new settings service.
    #[must_use]
    pub const fn new(repos: &'a Repositories, images: &'a dyn ImageStore) -> Self {
        Self { repos, images }
    }

    /// Read the settings, creating the default record on first use.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn get_or_init(&self) -> Result<SiteSettings, ServiceError> {
        Ok(self
            .repos
            .settings
            .get_or_init(&SiteSettings::default())
            .await?)
    }

    /// Apply an update, storing any new hero images first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for blank fields or unsupported
    /// images and `ServiceError::ImageStore` if an image cannot be stored.
    #[instrument(skip_all)]
    pub async fn update(
        &self,
        mut fields: SiteSettingsFields,
        heroes: HeroUploads,
    ) -> Result<SiteSettings, ServiceError> {
        let mut settings = self.get_or_init().await?;

        // Reject bad files and blank fields before anything is written.
        for upload in [&heroes.desktop, &heroes.mobile].into_iter().flatten() {
            upload.extension()?;
        }
        settings.clone().apply(fields.clone())?;

        if let Some(desktop) = heroes.desktop {
            fields.hero_image_desktop = Some(self.images.put(desktop).await?);
        }
        if let Some(mobile) = heroes.mobile {
            fields.hero_image_mobile = Some(self.images.put(mobile).await?);
        }

        settings.apply(fields)?;
        let saved = self.repos.settings.save(&settings).await?;
        tracing::info!(site_name = %saved.site_name, "Site settings updated");
        Ok(saved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;
    use crate::services::images::MemoryImageStore;

    fn hero(file_name: &str) -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: Some(file_name.into()),
            content_type: None,
            bytes: Bytes::from_static(b"hero"),
        })
    }

    #[tokio::test]
    async fn test_update_sets_hero_reference() {
        let repos = Repositories::in_memory();
        let images = MemoryImageStore::new();
        let service = SettingsService::new(&repos, &images);

        let saved = service
            .update(
                SiteSettingsFields {
                    footer_text: Some("Since 1972".into()),
                    ..SiteSettingsFields::default()
                },
                HeroUploads {
                    desktop: None,
                    mobile: hero("m.jpg"),
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.footer_text, "Since 1972");
        assert_eq!(saved.hero_image_mobile, images.references().await[0]);
        assert_eq!(saved.site_name, "Vintage Shop");
        assert_eq!(service.get_or_init().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_invalid_update_changes_nothing() {
        let repos = Repositories::in_memory();
        let images = MemoryImageStore::new();
        let service = SettingsService::new(&repos, &images);

        let blank = service
            .update(
                SiteSettingsFields {
                    hero_title: Some(String::new()),
                    ..SiteSettingsFields::default()
                },
                HeroUploads {
                    desktop: hero("d.png"),
                    mobile: None,
                },
            )
            .await;
        let bad_file = service
            .update(
                SiteSettingsFields::default(),
                HeroUploads {
                    desktop: hero("d.bmp"),
                    mobile: None,
                },
            )
            .await;

        assert!(matches!(blank, Err(ServiceError::Validation(_))));
        assert!(matches!(bad_file, Err(ServiceError::Validation(_))));
        assert!(images.references().await.is_empty());
        assert_eq!(
            service.get_or_init().await.unwrap(),
            SiteSettings::default()
        );
    }
}
