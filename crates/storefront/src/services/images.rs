//! Storage for uploaded product and hero images.
//!
//! Uploads are written under a configured directory and served back under
//! `/uploads`. Each stored file gets a fresh UUID name so references are
//! stable and never collide.

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Most image files accepted in one product upload.
pub const MAX_IMAGES_PER_UPLOAD: usize = 10;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Errors from image storage.
#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    /// The file is not one of the accepted image formats.
    #[error("unsupported image type: {0} (allowed: jpg, jpeg, png, webp)")]
    UnsupportedType(String),

    /// More files than allowed in a single request.
    #[error("too many images: at most 10 per upload (got {0})")]
    TooMany(usize),

    /// Writing the file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// The file extension to store under.
    ///
    /// Taken from the file name when present, otherwise from the content type.
    ///
    /// # Errors
    ///
    /// Returns [`ImageStoreError::UnsupportedType`] for anything but jpg,
    /// jpeg, png or webp.
    pub fn extension(&self) -> Result<&'static str, ImageStoreError> {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        let candidate = match (from_name, self.content_type.as_deref()) {
            (Some(ext), _) => ext,
            (None, Some("image/jpeg")) => "jpg".to_owned(),
            (None, Some("image/png")) => "png".to_owned(),
            (None, Some("image/webp")) => "webp".to_owned(),
            (None, other) => other.unwrap_or("unknown").to_owned(),
        };

        ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == candidate)
            .copied()
            .ok_or(ImageStoreError::UnsupportedType(candidate))
    }
}

/// Check the batch size of a product upload.
///
/// # Errors
///
/// Returns [`ImageStoreError::TooMany`] above [`MAX_IMAGES_PER_UPLOAD`].
pub const fn ensure_upload_count(count: usize) -> Result<(), ImageStoreError> {
    if count > MAX_IMAGES_PER_UPLOAD {
        return Err(ImageStoreError::TooMany(count));
    }
    Ok(())
}

/// Destination for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image and return its public reference.
    async fn put(&self, upload: ImageUpload) -> Result<String, ImageStoreError>;
}

/// Image store writing files to a local directory.
pub struct FsImageStore {
    dir: PathBuf,
    base_url: String,
}

impl FsImageStore {
    /// Store files in `dir`, referenced as `{base_url}/{file}`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        let file = format!("{}.{}", Uuid::new_v4(), upload.extension()?);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file), &upload.bytes).await?;

        tracing::debug!(file = %file, size = upload.bytes.len(), "Stored image");
        Ok(format!("{}/{file}", self.base_url))
    }
}

/// Image store that only remembers what it was given.
#[derive(Default)]
pub struct MemoryImageStore {
    stored: RwLock<Vec<(String, Bytes)>>,
}

impl MemoryImageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// References handed out so far, in upload order.
    pub async fn references(&self) -> Vec<String> {
        self.stored
            .read()
            .await
            .iter()
            .map(|(reference, _)| reference.clone())
            .collect()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        let reference = format!("/uploads/{}.{}", Uuid::new_v4(), upload.extension()?);
        self.stored
            .write()
            .await
            .push((reference.clone(), upload.bytes));
        Ok(reference)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(file_name: Option<&str>, content_type: Option<&str>) -> ImageUpload {
        ImageUpload {
            file_name: file_name.map(str::to_owned),
            content_type: content_type.map(str::to_owned),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn test_extension_from_name_or_content_type() {
        assert_eq!(upload(Some("Coat.JPG"), None).extension().unwrap(), "jpg");
        assert_eq!(
            upload(None, Some("image/webp")).extension().unwrap(),
            "webp"
        );
        assert!(matches!(
            upload(Some("notes.pdf"), Some("image/png")).extension(),
            Err(ImageStoreError::UnsupportedType(ext)) if ext == "pdf"
        ));
        assert!(upload(None, None).extension().is_err());
    }

    #[test]
    fn test_upload_count_limit() {
        assert!(ensure_upload_count(MAX_IMAGES_PER_UPLOAD).is_ok());
        assert!(matches!(
            ensure_upload_count(MAX_IMAGES_PER_UPLOAD + 1),
            Err(ImageStoreError::TooMany(11))
        ));
    }

    #[tokio::test]
    async fn test_fs_store_writes_file_under_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "/uploads/");

        let reference = store
            .put(upload(Some("hero.png"), Some("image/png")))
            .await
            .unwrap();

        assert!(reference.starts_with("/uploads/"));
        assert!(reference.ends_with(".png"));
        let file = reference.trim_start_matches("/uploads/");
        let written = std::fs::read(dir.path().join(file)).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_fs_store_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "/uploads");

        let err = store.put(upload(Some("x.gif"), None)).await.unwrap_err();

        assert!(matches!(err, ImageStoreError::UnsupportedType(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
