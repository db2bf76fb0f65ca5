//! `PostgreSQL` storage for the catalog.
//!
//! Listing filters are assembled with [`QueryBuilder`] so the count and the
//! page query share one `WHERE` clause. Search uses `PostgreSQL` full-text
//! matching (`english` configuration) over name, description and categories
//! with OR semantics across the search terms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use vintage_shop_core::catalog::{Product, ProductQuery, ProductSort};
use vintage_shop_core::{Price, ProductId};

use super::{ProductRepository, RepositoryError, row_count};

const PRODUCT_COLUMNS: &str = "id, name, description, price, categories, images, sizes, colors, \
                               in_stock, featured, created_at";

/// Indexed by `idx_product_search`.
const SEARCH_DOCUMENT: &str = "storefront.product_search_document(name, description, categories)";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    categories: Vec<String>,
    images: Vec<String>,
    sizes: Vec<String>,
    colors: Vec<String>,
    in_stock: bool,
    featured: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {} price: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            categories: row.categories,
            images: row.images,
            sizes: row.sizes,
            colors: row.colors,
            in_stock: row.in_stock,
            featured: row.featured,
            created_at: row.created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Append the `WHERE` clause for `query`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");

    if let Some(category) = &query.category {
        builder
            .push(" AND ")
            .push_bind(category.clone())
            .push(" = ANY(categories)");
    }

    if let Some(featured) = query.featured {
        builder.push(" AND featured = ").push_bind(featured);
    }

    if query.search.is_some() {
        let terms = query.search_terms();
        if terms.is_empty() {
            // Nothing searchable survived sanitizing.
            builder.push(" AND FALSE");
        } else {
            builder
                .push(" AND ")
                .push(SEARCH_DOCUMENT)
                .push(" @@ to_tsquery('english', ")
                .push_bind(terms.join(" | "))
                .push(")");
        }
    }
}

const fn order_clause(sort: Option<ProductSort>) -> &'static str {
    match sort {
        Some(ProductSort::PriceAsc) => " ORDER BY price ASC, created_at, id",
        Some(ProductSort::PriceDesc) => " ORDER BY price DESC, created_at, id",
        Some(ProductSort::Newest) => " ORDER BY created_at DESC, id",
        None => " ORDER BY created_at, id",
    }
}

/// Product repository backed by `storefront.product`.
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn search(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64), RepositoryError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM storefront.product");
        push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        // Offsets past i64::MAX simply yield an empty page.
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

        let mut page = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product"));
        push_filters(&mut page, query);
        page.push(order_clause(query.sort))
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit()))
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = page
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((into_products(rows)?, row_count(total)?))
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.product \
                 (id, name, description, price, categories, images, sizes, colors, \
                  in_stock, featured, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.categories)
        .bind(&product.images)
        .bind(&product.sizes)
        .bind(&product.colors)
        .bind(product.in_stock)
        .bind(product.featured)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.product \
             SET name = $2, description = $3, price = $4, categories = $5, images = $6, \
                 sizes = $7, colors = $8, in_stock = $9, featured = $10 \
             WHERE id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.categories)
        .bind(&product.images)
        .bind(&product.sizes)
        .bind(&product.colors)
        .bind(product.in_stock)
        .bind(product.featured)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(&self.pool)
            .await?;
        row_count(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn where_clause(query: &ProductQuery) -> String {
        let mut builder = QueryBuilder::new("SELECT 1 FROM storefront.product");
        push_filters(&mut builder, query);
        builder.sql().to_owned()
    }

    #[test]
    fn test_search_uses_indexed_document() {
        let migration =
            include_str!("../../migrations/20260301000005_create_product_search_index.sql");
        assert!(migration.contains(&format!("USING GIN ({SEARCH_DOCUMENT})")));

        let mut query = ProductQuery::default();
        query.search = Some("denim jackets".into());
        let sql = where_clause(&query);
        assert!(sql.contains(&format!("{SEARCH_DOCUMENT} @@ to_tsquery('english', $1)")));
    }

    #[test]
    fn test_stopword_only_search_matches_nothing() {
        let mut query = ProductQuery::default();
        query.search = Some("the".into());
        let sql = where_clause(&query);
        assert!(sql.ends_with(" AND FALSE"));
    }
}
