pub mod coupons;
pub mod orders;
pub mod products;
pub mod sellers;

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use futures::stream;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::ValidationError;

use crate::application::feed::Subscription;
use crate::domain::commission::round_money;
use crate::domain::errors::DomainError;
use crate::errors::AppError;

/// Money leaves the API as a decimal string with two places, e.g. "30.00".
/// `Display` drops the scale of zero, so the precision is spelled out.
pub(crate) fn money(amount: &BigDecimal) -> String {
    format!("{:.2}", round_money(amount))
}

pub(crate) fn validate_decimal(value: &str) -> Result<(), ValidationError> {
    match value.trim().parse::<BigDecimal>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("decimal");
            err.message = Some("must be a decimal number such as \"9.99\"".into());
            Err(err)
        }
    }
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActiveFilter {
    /// Only return active records.
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// Serve a watched collection as server-sent events: one event with the
/// current snapshot, then a fresh snapshot after every change. The stream
/// ends, and the subscription is dropped, when the client disconnects.
pub(crate) fn sse_response<R, F>(
    event: &'static str,
    initial: Vec<R>,
    subscription: Subscription,
    reload: F,
) -> HttpResponse
where
    R: Serialize + Send + 'static,
    F: Fn() -> Result<Vec<R>, DomainError> + Clone + Send + 'static,
{
    let events = stream::unfold(
        (Some(initial), subscription, reload),
        move |(pending, mut subscription, reload)| async move {
            let snapshot = match pending {
                Some(snapshot) => snapshot,
                None => {
                    if !subscription.changed().await {
                        return None;
                    }
                    match web::block(reload.clone()).await {
                        Ok(Ok(snapshot)) => snapshot,
                        Ok(Err(e)) => {
                            log::error!("Reloading {} for watchers failed: {}", event, e);
                            return None;
                        }
                        Err(e) => {
                            log::error!("Reloading {} for watchers failed: {}", event, e);
                            return None;
                        }
                    }
                }
            };
            let frame = serde_json::to_string(&snapshot)
                .map(|json| web::Bytes::from(format!("event: {}\ndata: {}\n\n", event, json)))
                .map_err(|e| AppError::Internal(e.to_string()));
            Some((frame, (None, subscription, reload)))
        },
    );

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::watch_products,
        sellers::list_sellers,
        sellers::create_seller,
        sellers::get_seller,
        sellers::update_seller,
        sellers::delete_seller,
        sellers::set_seller_active,
        sellers::list_seller_coupons,
        sellers::issue_seller_coupon,
        sellers::seller_stats,
        sellers::watch_sellers,
        coupons::set_coupon_active,
        coupons::validate_coupon,
        orders::create_order,
        orders::get_order,
        orders::list_orders,
        orders::update_order_status,
        orders::delete_order,
        orders::orders_by_coupon,
        orders::orders_by_customer,
    ),
    tags(
        (name = "products", description = "Catalog"),
        (name = "sellers", description = "Seller directory and coupons"),
        (name = "coupons", description = "Coupon administration and checkout preview"),
        (name = "orders", description = "Order intake and history"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn money_always_has_two_places() {
        assert_eq!(money(&BigDecimal::from(30)), "30.00");
        assert_eq!(money(&BigDecimal::from_str("0.125").unwrap()), "0.12");
        assert_eq!(money(&BigDecimal::from_str("9.9").unwrap()), "9.90");
        assert_eq!(money(&BigDecimal::from(0)), "0.00");
        assert_eq!(money(&BigDecimal::from_str("0.004").unwrap()), "0.00");
    }

    #[test]
    fn decimal_validator_rejects_text() {
        assert!(validate_decimal("12.50").is_ok());
        assert!(validate_decimal(" 7 ").is_ok());
        assert!(validate_decimal("abc").is_err());
        assert!(validate_decimal("").is_err());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("Ana").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
