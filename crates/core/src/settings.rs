//! Storefront-wide settings shown in the header, hero banner and footer.

use serde::{Deserialize, Serialize};

/// Errors raised while validating a settings update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsInputError {
    /// A required text field was submitted blank.
    #[error("{0} must not be blank")]
    Blank(&'static str),
}

/// Links to the shop's social profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// The singleton settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub site_name: String,
    pub hero_image_desktop: String,
    pub hero_image_mobile: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub categories: Vec<String>,
    pub footer_text: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub social_links: SocialLinks,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Vintage Shop".into(),
            hero_image_desktop: "/placeholder.svg?height=400&width=800".into(),
            hero_image_mobile: "/placeholder.svg?height=600&width=400".into(),
            hero_title: "Welcome to our Vintage Shop".into(),
            hero_subtitle: "Discover timeless fashion pieces".into(),
            categories: vec!["Shirts".into(), "Pants".into(), "Accessories".into()],
            footer_text: "Find unique vintage clothing".into(),
            contact_email: "contact@vintageshop.com".into(),
            contact_phone: "123-456-7890".into(),
            social_links: SocialLinks {
                facebook: Some("https://facebook.com".into()),
                instagram: Some("https://instagram.com".into()),
            },
        }
    }
}

/// A settings update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsFields {
    pub site_name: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub footer_text: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub categories: Option<Vec<String>>,
    pub social_links: Option<SocialLinks>,
    /// Stored reference of a newly uploaded desktop hero image.
    #[serde(skip)]
    pub hero_image_desktop: Option<String>,
    /// Stored reference of a newly uploaded mobile hero image.
    #[serde(skip)]
    pub hero_image_mobile: Option<String>,
}

impl SiteSettings {
    /// Apply an update.
    ///
    /// Nothing is changed when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsInputError::Blank`] when a submitted text field is
    /// empty after trimming.
    pub fn apply(&mut self, fields: SiteSettingsFields) -> Result<(), SettingsInputError> {
        let mut next = self.clone();

        for (slot, value, name) in [
            (&mut next.site_name, fields.site_name, "siteName"),
            (&mut next.hero_title, fields.hero_title, "heroTitle"),
            (&mut next.hero_subtitle, fields.hero_subtitle, "heroSubtitle"),
            (&mut next.footer_text, fields.footer_text, "footerText"),
            (&mut next.contact_email, fields.contact_email, "contactEmail"),
            (&mut next.contact_phone, fields.contact_phone, "contactPhone"),
        ] {
            if let Some(value) = value {
                let value = value.trim();
                if value.is_empty() {
                    return Err(SettingsInputError::Blank(name));
                }
                value.clone_into(slot);
            }
        }

        if let Some(categories) = fields.categories {
            next.categories = categories
                .into_iter()
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(links) = fields.social_links {
            next.social_links = links;
        }
        if let Some(desktop) = fields.hero_image_desktop {
            next.hero_image_desktop = desktop;
        }
        if let Some(mobile) = fields.hero_image_mobile {
            next.hero_image_mobile = mobile;
        }

        *self = next;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SiteSettings::default();
        assert_eq!(settings.site_name, "Vintage Shop");
        assert_eq!(settings.categories, vec!["Shirts", "Pants", "Accessories"]);
        assert_eq!(
            settings.social_links.instagram.as_deref(),
            Some("https://instagram.com")
        );
    }

    #[test]
    fn test_apply_replaces_given_fields_only() {
        let mut settings = SiteSettings::default();
        settings
            .apply(SiteSettingsFields {
                site_name: Some(" Retro Rack ".into()),
                categories: Some(vec!["Coats".into(), String::new()]),
                hero_image_mobile: Some("/uploads/m.png".into()),
                ..SiteSettingsFields::default()
            })
            .unwrap();

        assert_eq!(settings.site_name, "Retro Rack");
        assert_eq!(settings.categories, vec!["Coats"]);
        assert_eq!(settings.hero_image_mobile, "/uploads/m.png");
        assert_eq!(
            settings.hero_image_desktop,
            SiteSettings::default().hero_image_desktop
        );
        assert_eq!(settings.hero_title, SiteSettings::default().hero_title);
    }

    #[test]
    fn test_apply_rejects_blank_without_partial_write() {
        let mut settings = SiteSettings::default();
        let err = settings
            .apply(SiteSettingsFields {
                site_name: Some("New Name".into()),
                contact_phone: Some("  ".into()),
                ..SiteSettingsFields::default()
            })
            .unwrap_err();

        assert_eq!(err, SettingsInputError::Blank("contactPhone"));
        assert_eq!(settings, SiteSettings::default());
    }

    #[test]
    fn test_json_is_camel_case() {
        let json = serde_json::to_value(SiteSettings::default()).unwrap();
        assert_eq!(json["heroImageDesktop"], "/placeholder.svg?height=400&width=800");
        assert_eq!(json["socialLinks"]["facebook"], "https://facebook.com");
    }
}
