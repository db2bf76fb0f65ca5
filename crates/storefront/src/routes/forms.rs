//! Multipart form decoding for the admin console's uploads.
//!
//! The console sends scalar fields as text parts, list and object fields as
//! JSON-encoded text parts, and files as parts with a file name.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::services::ImageUpload;

/// A fully read multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<(String, ImageUpload)>,
}

impl FormData {
    /// Read every part of `multipart`.
    ///
    /// File parts with no content are skipped, which is what a browser sends
    /// for an empty file input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_owned) {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                form.files.push((
                    name,
                    ImageUpload {
                        file_name: Some(file_name),
                        content_type,
                        bytes,
                    },
                ));
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// A boolean field, `"true"` meaning true and anything else false.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.fields.get(name).map(|v| v.trim() == "true")
    }

    /// A JSON-encoded field.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the field is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.fields
            .get(name)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| AppError::BadRequest(format!("{name}: {e}")))
            })
            .transpose()
    }

    /// A JSON string array field, empty when absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the field is not a JSON string array.
    pub fn list(&self, name: &str) -> Result<Vec<String>, AppError> {
        Ok(self.json::<Vec<String>>(name)?.unwrap_or_default())
    }

    /// Remove and return the files sent under `name`, in upload order.
    pub fn take_files(&mut self, name: &str) -> Vec<ImageUpload> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }

    /// Remove and return the first file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        let position = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(position).1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;

    fn form() -> FormData {
        let mut form = FormData::default();
        form.fields.insert("inStock".into(), "true".into());
        form.fields.insert("featured".into(), "yes".into());
        form.fields
            .insert("categories".into(), r#"["Shirts","Denim"]"#.into());
        form.fields.insert("sizes".into(), "S, M".into());
        for name in ["a.jpg", "b.png"] {
            form.files.push((
                "images".into(),
                ImageUpload {
                    file_name: Some(name.into()),
                    content_type: None,
                    bytes: Bytes::from_static(b"img"),
                },
            ));
        }
        form
    }

    #[test]
    fn test_flags() {
        let form = form();
        assert_eq!(form.flag("inStock"), Some(true));
        assert_eq!(form.flag("featured"), Some(false));
        assert_eq!(form.flag("missing"), None);
    }

    #[test]
    fn test_lists() {
        let form = form();
        assert_eq!(form.list("categories").unwrap(), vec!["Shirts", "Denim"]);
        assert!(form.list("colors").unwrap().is_empty());
        assert!(matches!(form.list("sizes"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_take_files_keeps_order() {
        let mut form = form();
        let files = form.take_files("images");
        let names: Vec<_> = files.iter().filter_map(|f| f.file_name.as_deref()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
        assert!(form.take_file("images").is_none());
    }
}
