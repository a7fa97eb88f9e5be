use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::AppState;
use crate::domain::commission::parse_amount;
use crate::domain::errors::DomainError;
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::errors::AppError;

use super::{money, sse_response, validate_decimal, validate_not_blank, ActiveFilter};

// ── Request / response DTOs ──────────────────────────────────────────────────

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal price as a string, e.g. "89.90"
    #[validate(custom = "validate_decimal")]
    pub price: String,
    pub image_url: Option<String>,
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub category: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl CreateProductRequest {
    fn into_domain(self) -> Result<NewProduct, DomainError> {
        Ok(NewProduct {
            price: parse_amount("price", &self.price)?,
            name: self.name.trim().to_string(),
            description: self.description,
            image_url: self.image_url,
            category: self.category.trim().to_string(),
            active: self.active,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_decimal")]
    pub price: Option<String>,
    pub image_url: Option<String>,
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub category: Option<String>,
    pub active: Option<bool>,
}

impl UpdateProductRequest {
    fn into_domain(self) -> Result<ProductPatch, DomainError> {
        Ok(ProductPatch {
            price: self
                .price
                .map(|raw| parse_amount("price", &raw))
                .transpose()?,
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description,
            image_url: self.image_url,
            category: self.category.map(|c| c.trim().to_string()),
            active: self.active,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category: String,
    pub active: bool,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            price: money(&p.price),
            name: p.name,
            description: p.description,
            image_url: p.image_url,
            category: p.category,
            active: p.active,
        }
    }
}

fn responses(products: Vec<Product>) -> Vec<ProductResponse> {
    products.into_iter().map(ProductResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /products
///
/// Lists the catalog ordered by category and name.
#[utoipa::path(
    get,
    path = "/products",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Catalog", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ActiveFilter>,
) -> Result<HttpResponse, AppError> {
    let active_only = query.active;
    let products = web::block(move || state.products.list(active_only)).await??;
    Ok(HttpResponse::Ok().json(responses(products)))
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
    ),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()?;
    let product = body.into_domain()?;

    let product = web::block(move || state.products.create(product)).await??;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || state.products.get(id)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PATCH /products/{id}
///
/// Merge-patch: absent fields are left untouched.
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    body.validate()?;
    let patch = body.into_domain()?;

    let product = web::block(move || state.products.update(id, patch)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /products/{id}
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.products.delete(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /products/watch
///
/// Server-sent events: a `products` event carrying the full list now and
/// after every catalog change.
#[utoipa::path(
    get,
    path = "/products/watch",
    params(ActiveFilter),
    responses(
        (status = 200, description = "text/event-stream of product lists", body = [ProductResponse], content_type = "text/event-stream"),
    ),
    tag = "products"
)]
pub async fn watch_products(
    state: web::Data<AppState>,
    query: web::Query<ActiveFilter>,
) -> Result<HttpResponse, AppError> {
    let active_only = query.active;
    let watcher = state.clone();
    let watch = web::block(move || watcher.products.watch(active_only)).await??;

    Ok(sse_response(
        "products",
        responses(watch.snapshot),
        watch.subscription,
        move || state.products.list(active_only).map(responses),
    ))
}
