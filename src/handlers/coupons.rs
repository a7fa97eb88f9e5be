use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::AppState;
use crate::domain::commission::parse_amount;
use crate::domain::coupon::CouponRejection;
use crate::errors::AppError;

use super::sellers::CouponResponse;
use super::{money, validate_decimal, SetActiveRequest};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateCouponRequest {
    /// Code as typed by the customer; case and surrounding spaces are ignored.
    pub code: String,
    /// Order total to price the commission for, e.g. "200.00"
    #[validate(custom = "validate_decimal")]
    pub total: Option<String>,
}

/// Checkout preview. `valid = false` comes with a `reason`; a valid code
/// names the seller and, when a total was sent, the commission it would earn.
#[derive(Debug, Serialize, ToSchema)]
pub struct CouponValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponRejection>,
}

/// PUT /coupons/{id}/active
#[utoipa::path(
    put,
    path = "/coupons/{id}/active",
    params(("id" = Uuid, Path, description = "Coupon UUID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Coupon updated", body = CouponResponse),
        (status = 404, description = "Coupon not found"),
    ),
    tag = "coupons"
)]
pub async fn set_coupon_active(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SetActiveRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let active = body.active;
    let coupon = web::block(move || state.coupons.set_active(id, active)).await??;
    Ok(HttpResponse::Ok().json(CouponResponse::from(coupon)))
}

/// POST /coupons/validate
///
/// Tells the checkout whether a code will earn a commission, without
/// touching any counters.
#[utoipa::path(
    post,
    path = "/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Validation result", body = CouponValidationResponse),
        (status = 400, description = "Malformed total"),
    ),
    tag = "coupons"
)]
pub async fn validate_coupon(
    state: web::Data<AppState>,
    body: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    body.validate()?;
    let total = body
        .total
        .as_deref()
        .map(|raw| parse_amount("total", raw))
        .transpose()?;

    let preview = web::block(move || state.coupons.preview(&body.code, total.as_ref())).await??;

    let response = match preview {
        Ok(preview) => CouponValidationResponse {
            valid: true,
            code: Some(preview.code.to_string()),
            seller_name: Some(preview.seller_name),
            commission_rate: Some(money(&preview.commission_rate)),
            commission: preview.commission.as_ref().map(money),
            reason: None,
        },
        Err(reason) => CouponValidationResponse {
            valid: false,
            code: None,
            seller_name: None,
            commission_rate: None,
            commission: None,
            reason: Some(reason),
        },
    };
    Ok(HttpResponse::Ok().json(response))
}
