//! Product catalog API handlers.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use vintage_shop_core::ProductId;
use vintage_shop_core::catalog::{Product, ProductFields, ProductPage, ProductQuery, ProductSort};

use super::extract::{ApiPath, ApiQuery};
use super::forms::FormData;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::CatalogService;
use crate::state::AppState;

/// Build the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route(
            "/api/products/{id}",
            get(show).patch(update).delete(destroy),
        )
}

/// Query parameters of the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ListParams> for ProductQuery {
    fn from(params: ListParams) -> Self {
        let mut query = Self::default();
        query.category = params.category.filter(|c| !c.is_empty());
        query.search = params.search.filter(|s| !s.trim().is_empty());
        query.featured = params.featured.map(|f| f == "true");
        query.sort = params.sort.as_deref().and_then(ProductSort::parse);

        let page = params.page.unwrap_or_else(|| query.page());
        let limit = params.limit.unwrap_or_else(|| query.limit());
        query.paginate(page, limit)
    }
}

/// List products.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ProductPage>> {
    let service = CatalogService::new(state.repos(), state.images());
    Ok(Json(service.list(params.into()).await?))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    let service = CatalogService::new(state.repos(), state.images());
    Ok(Json(service.get(id).await?))
}

/// Product fields of a console form.
fn product_fields(form: &FormData) -> Result<ProductFields> {
    Ok(ProductFields {
        name: form.text("name"),
        description: form.text("description"),
        price: form.text("price"),
        categories: form.list("categories")?,
        sizes: form.list("sizes")?,
        colors: form.list("colors")?,
        in_stock: form.flag("inStock").unwrap_or(true),
        featured: form.flag("featured").unwrap_or(false),
    })
}

/// Create a product from a multipart form.
#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>)> {
    let mut form = FormData::read(multipart).await?;
    let fields = product_fields(&form)?;
    let uploads = form.take_files("images");

    let service = CatalogService::new(state.repos(), state.images());
    let product = service.create(fields, uploads).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product from a multipart form.
///
/// `existingImages` lists the current images to keep; new files follow them.
#[instrument(skip_all, fields(admin = %admin.id, product = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let mut form = FormData::read(multipart).await?;
    let fields = product_fields(&form)?;
    let retained = form.list("existingImages")?;
    let uploads = form.take_files("images");

    let service = CatalogService::new(state.repos(), state.images());
    Ok(Json(service.update(id, fields, retained, uploads).await?))
}

/// Delete a product.
#[instrument(skip_all, fields(admin = %admin.id, product = %id))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<serde_json::Value>> {
    let service = CatalogService::new(state.repos(), state.images());
    service.delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}
