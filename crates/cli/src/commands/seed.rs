//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Denim Jacket
//!     description: Faded 80s denim
//!     price: "45.00"
//!     categories: [Jackets]
//!     sizes: [M, L]
//!     images: [/uploads/denim.jpg]
//!     featured: true
//! ```
//!
//! Products whose name is already in the catalog are skipped, so the file
//! can be re-run.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use vintage_shop_core::catalog::{Product, ProductFields, ProductQuery};
use vintage_shop_storefront::db::{PgProductRepository, ProductRepository};

/// A catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<SeedProduct>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    #[serde(flatten)]
    pub fields: ProductFields,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse and validate a catalog file.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or any product is invalid.
pub fn parse_catalog(content: &str) -> Result<Vec<Product>, Box<dyn std::error::Error>> {
    let file: CatalogFile = serde_yaml::from_str(content)?;
    let now = Utc::now();

    let mut products = Vec::with_capacity(file.products.len());
    let mut errors = Vec::new();
    for (index, entry) in file.products.into_iter().enumerate() {
        let name = entry.fields.name.clone().unwrap_or_default();
        match entry.fields.validate() {
            Ok(draft) => products.push(Product::new(draft, entry.images, now)),
            Err(e) => errors.push(format!("product {} ({name}): {e}", index + 1)),
        }
    }

    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }
    Ok(products)
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or database
/// operations fail.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_catalog(&content)?;
    info!(products = products.len(), "Catalog validated successfully");

    let repo = PgProductRepository::new(super::connect().await?);

    // Names already present, across every page of the catalog.
    let total = repo.count().await?;
    let everything = ProductQuery::default().paginate(1, u32::try_from(total.max(1))?);
    let (existing, _) = repo.search(&everything).await?;
    let mut names: HashSet<String> = existing.into_iter().map(|p| p.name).collect();

    let mut summary = SeedSummary::default();
    for product in products {
        if !names.insert(product.name.clone()) {
            summary.skipped += 1;
            continue;
        }
        repo.insert(&product).await?;
        summary.inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.inserted);
    info!("  Products skipped (already exist): {}", summary.skipped);
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let products = parse_catalog(
            r#"
products:
  - name: Denim Jacket
    description: Faded 80s denim
    price: "45.00"
    categories: [Jackets]
    images: [/uploads/denim.jpg]
    featured: true
  - name: Silk Scarf
    description: Hand-rolled edges
    price: "12.50"
    categories: [Accessories]
    inStock: false
"#,
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].images, vec!["/uploads/denim.jpg"]);
        assert!(products[0].featured);
        assert!(products[0].in_stock);
        assert!(!products[1].in_stock);
    }

    #[test]
    fn test_parse_catalog_rejects_invalid_product() {
        let result = parse_catalog(
            r#"
products:
  - name: No Price
    description: Missing its price
    categories: [Shirts]
"#,
        );
        assert!(result.is_err());
    }
}
