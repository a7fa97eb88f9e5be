use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::AppState;
use crate::domain::commission::CommissionRate;
use crate::domain::coupon::SellerCoupon;
use crate::domain::errors::DomainError;
use crate::domain::seller::{NewSeller, Seller, SellerPatch, SellerStats};
use crate::errors::AppError;

use super::{money, sse_response, validate_decimal, validate_not_blank, ActiveFilter, SetActiveRequest};

// ── Request / response DTOs ──────────────────────────────────────────────────

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSellerRequest {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 50), custom = "validate_not_blank")]
    pub phone: String,
    /// Percentage of the order total, "0" to "100"
    #[validate(custom = "validate_decimal")]
    pub commission_rate: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl CreateSellerRequest {
    fn into_domain(self) -> Result<NewSeller, DomainError> {
        Ok(NewSeller {
            commission_rate: self.commission_rate.parse()?,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            active: self.active,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSellerRequest {
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50), custom = "validate_not_blank")]
    pub phone: Option<String>,
    #[validate(custom = "validate_decimal")]
    pub commission_rate: Option<String>,
    pub active: Option<bool>,
}

impl UpdateSellerRequest {
    fn into_domain(self) -> Result<SellerPatch, DomainError> {
        Ok(SellerPatch {
            commission_rate: self
                .commission_rate
                .map(|raw| raw.parse::<CommissionRate>())
                .transpose()?,
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.map(|e| e.trim().to_string()),
            phone: self.phone.map(|p| p.trim().to_string()),
            active: self.active,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub commission_rate: String,
    pub created_at: String,
}

impl From<Seller> for SellerResponse {
    fn from(s: Seller) -> Self {
        Self {
            id: s.id,
            commission_rate: money(s.commission_rate.as_decimal()),
            created_at: s.created_at.to_rfc3339(),
            name: s.name,
            email: s.email,
            phone: s.phone,
            active: s.active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub used_count: i32,
    pub total_commission: String,
    pub created_at: String,
}

impl From<SellerCoupon> for CouponResponse {
    fn from(c: SellerCoupon) -> Self {
        Self {
            id: c.id,
            seller_id: c.seller_id,
            code: c.code.to_string(),
            is_active: c.is_active,
            used_count: c.used_count,
            total_commission: money(&c.total_commission),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSellerResponse {
    pub seller: SellerResponse,
    pub coupon: CouponResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerStatsResponse {
    pub total_commissions: String,
    pub total_orders: i64,
    pub average_commission: String,
}

impl From<SellerStats> for SellerStatsResponse {
    fn from(s: SellerStats) -> Self {
        Self {
            total_commissions: money(&s.total_commissions),
            total_orders: s.total_orders,
            average_commission: money(&s.average_commission),
        }
    }
}

fn responses(sellers: Vec<Seller>) -> Vec<SellerResponse> {
    sellers.into_iter().map(SellerResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /sellers
///
/// Newest sellers first.
#[utoipa::path(
    get,
    path = "/sellers",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Sellers", body = [SellerResponse]),
    ),
    tag = "sellers"
)]
pub async fn list_sellers(
    state: web::Data<AppState>,
    query: web::Query<ActiveFilter>,
) -> Result<HttpResponse, AppError> {
    let active_only = query.active;
    let sellers = web::block(move || state.sellers.list(active_only)).await??;
    Ok(HttpResponse::Ok().json(responses(sellers)))
}

/// POST /sellers
///
/// Registers the seller and issues its first coupon code.
#[utoipa::path(
    post,
    path = "/sellers",
    request_body = CreateSellerRequest,
    responses(
        (status = 201, description = "Seller created with its first coupon", body = CreateSellerResponse),
        (status = 400, description = "Invalid seller"),
        (status = 503, description = "No free coupon code could be found"),
    ),
    tag = "sellers"
)]
pub async fn create_seller(
    state: web::Data<AppState>,
    body: web::Json<CreateSellerRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()?;
    let seller = body.into_domain()?;

    let (seller, coupon) = web::block(move || state.sellers.create(seller)).await??;
    Ok(HttpResponse::Created().json(CreateSellerResponse {
        seller: seller.into(),
        coupon: coupon.into(),
    }))
}

/// GET /sellers/{id}
#[utoipa::path(
    get,
    path = "/sellers/{id}",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    responses(
        (status = 200, description = "Seller found", body = SellerResponse),
        (status = 404, description = "Seller not found"),
    ),
    tag = "sellers"
)]
pub async fn get_seller(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let seller = web::block(move || state.sellers.get(id)).await??;
    Ok(HttpResponse::Ok().json(SellerResponse::from(seller)))
}

/// PATCH /sellers/{id}
#[utoipa::path(
    patch,
    path = "/sellers/{id}",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    request_body = UpdateSellerRequest,
    responses(
        (status = 200, description = "Seller updated", body = SellerResponse),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Seller not found"),
    ),
    tag = "sellers"
)]
pub async fn update_seller(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateSellerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    body.validate()?;
    let patch = body.into_domain()?;

    let seller = web::block(move || state.sellers.update(id, patch)).await??;
    Ok(HttpResponse::Ok().json(SellerResponse::from(seller)))
}

/// DELETE /sellers/{id}
///
/// Sellers whose coupons were ever redeemed cannot be deleted; deactivate
/// them instead.
#[utoipa::path(
    delete,
    path = "/sellers/{id}",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    responses(
        (status = 204, description = "Seller and coupons deleted"),
        (status = 404, description = "Seller not found"),
        (status = 409, description = "Seller has redeemed coupons"),
    ),
    tag = "sellers"
)]
pub async fn delete_seller(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.sellers.delete(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /sellers/{id}/active
#[utoipa::path(
    put,
    path = "/sellers/{id}/active",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Seller updated", body = SellerResponse),
        (status = 404, description = "Seller not found"),
    ),
    tag = "sellers"
)]
pub async fn set_seller_active(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SetActiveRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let active = body.active;
    let seller = web::block(move || state.sellers.set_active(id, active)).await??;
    Ok(HttpResponse::Ok().json(SellerResponse::from(seller)))
}

/// GET /sellers/{id}/coupons
///
/// Newest coupon first.
#[utoipa::path(
    get,
    path = "/sellers/{id}/coupons",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    responses(
        (status = 200, description = "Coupons of the seller", body = [CouponResponse]),
        (status = 404, description = "Seller not found"),
    ),
    tag = "sellers"
)]
pub async fn list_seller_coupons(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let coupons = web::block(move || state.sellers.coupons(id)).await??;
    Ok(HttpResponse::Ok().json(
        coupons
            .into_iter()
            .map(CouponResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST /sellers/{id}/coupons
///
/// Issues an additional coupon code to an existing seller.
#[utoipa::path(
    post,
    path = "/sellers/{id}/coupons",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    responses(
        (status = 201, description = "Coupon issued", body = CouponResponse),
        (status = 404, description = "Seller not found"),
        (status = 503, description = "No free coupon code could be found"),
    ),
    tag = "sellers"
)]
pub async fn issue_seller_coupon(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let coupon = web::block(move || state.sellers.issue_coupon(id)).await??;
    Ok(HttpResponse::Created().json(CouponResponse::from(coupon)))
}

/// GET /sellers/{id}/stats
#[utoipa::path(
    get,
    path = "/sellers/{id}/stats",
    params(("id" = Uuid, Path, description = "Seller UUID")),
    responses(
        (status = 200, description = "Commission totals", body = SellerStatsResponse),
        (status = 404, description = "Seller not found"),
    ),
    tag = "sellers"
)]
pub async fn seller_stats(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let stats = web::block(move || state.sellers.stats(id)).await??;
    Ok(HttpResponse::Ok().json(SellerStatsResponse::from(stats)))
}

/// GET /sellers/watch
///
/// Server-sent events: a `sellers` event with the full list now and after
/// every change to the directory.
#[utoipa::path(
    get,
    path = "/sellers/watch",
    params(ActiveFilter),
    responses(
        (status = 200, description = "text/event-stream of seller lists", body = [SellerResponse], content_type = "text/event-stream"),
    ),
    tag = "sellers"
)]
pub async fn watch_sellers(
    state: web::Data<AppState>,
    query: web::Query<ActiveFilter>,
) -> Result<HttpResponse, AppError> {
    let active_only = query.active;
    let watcher = state.clone();
    let watch = web::block(move || watcher.sellers.watch(active_only)).await??;

    Ok(sse_response(
        "sellers",
        responses(watch.snapshot),
        watch.subscription,
        move || state.sellers.list(active_only).map(responses),
    ))
}
