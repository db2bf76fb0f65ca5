//! Catalog queries and product maintenance.

use chrono::Utc;
use tracing::instrument;

use vintage_shop_core::ProductId;
use vintage_shop_core::catalog::{Product, ProductFields, ProductPage, ProductQuery, merge_images};

use super::ServiceError;
use super::images::{ImageStore, ImageUpload, ensure_upload_count};
use crate::db::{RepositoryError, Repositories};

/// Catalog service.
pub struct CatalogService<'a> {
    repos: &'a Repositories,
    images: &'a dyn ImageStore,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(repos: &'a Repositories, images: &'a dyn ImageStore) -> Self {
        Self { repos, images }
    }

    /// One page of products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: ProductQuery) -> Result<ProductPage, ServiceError> {
        let (products, total) = self.repos.products.search(&query).await?;
        Ok(ProductPage::new(products, &query, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.repos
            .products
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product".to_owned()))
    }

    /// Create a product, storing its images in upload order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid fields or images and
    /// `ServiceError::ImageStore` if an image cannot be stored.
    #[instrument(skip(self, fields, uploads), fields(images = uploads.len()))]
    pub async fn create(
        &self,
        fields: ProductFields,
        uploads: Vec<ImageUpload>,
    ) -> Result<Product, ServiceError> {
        let draft = fields.validate()?;
        let images = self.store_images(uploads).await?;

        let product = Product::new(draft, images, Utc::now());
        self.repos.products.insert(&product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// The new image list is `retained` followed by the new uploads.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist and
    /// `ServiceError::Validation` for invalid fields or images.
    #[instrument(skip(self, fields, retained, uploads), fields(product = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        fields: ProductFields,
        retained: Vec<String>,
        uploads: Vec<ImageUpload>,
    ) -> Result<Product, ServiceError> {
        let mut product = self.get(id).await?;
        let draft = fields.validate()?;
        let uploaded = self.store_images(uploads).await?;

        product.apply(draft, merge_images(retained, uploaded));
        self.repos
            .products
            .update(&product)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("product".to_owned()),
                other => other.into(),
            })?;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        self.repos
            .products
            .delete(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("product".to_owned()),
                other => other.into(),
            })
    }

    async fn store_images(&self, uploads: Vec<ImageUpload>) -> Result<Vec<String>, ServiceError> {
        ensure_upload_count(uploads.len())?;
        // Check every file before writing any of them.
        for upload in &uploads {
            upload.extension()?;
        }

        let mut references = Vec::with_capacity(uploads.len());
        for upload in uploads {
            references.push(self.images.put(upload).await?);
        }
        Ok(references)
    }
}
