use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::coupon::{CouponCode, CouponRejection};
use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Orders leave `pending` exactly once; `completed` and `cancelled` are
    /// terminal.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct Checkout {
    pub lines: Vec<CheckoutLine>,
    pub customer: Customer,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub lines: Vec<NewOrderLine>,
    pub total: BigDecimal,
    pub customer: Customer,
    /// The code offered at checkout, kept even when it earned nothing.
    pub seller_coupon_code: Option<String>,
    pub seller_commission: BigDecimal,
}

/// Longest offered coupon text kept on an order.
pub const MAX_OFFERED_CODE_LEN: usize = 32;

/// How an offered coupon code is kept on the order: normalized when well
/// formed, otherwise the trimmed input cut to `MAX_OFFERED_CODE_LEN` chars.
pub fn offered_code(raw: &str) -> String {
    match CouponCode::parse(raw) {
        Ok(code) => code.to_string(),
        Err(_) => raw.trim().chars().take(MAX_OFFERED_CODE_LEN).collect(),
    }
}

/// Coupon statistics to bump in the same transaction as the order insert.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub coupon_id: Uuid,
    pub commission: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub id: Uuid,
    pub total: BigDecimal,
    pub customer: Customer,
    pub status: OrderStatus,
    pub seller_coupon_code: Option<String>,
    pub seller_commission: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// What happened to the coupon code offered with a checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponOutcome {
    NotProvided,
    Applied {
        code: CouponCode,
        seller_id: Uuid,
        commission: BigDecimal,
    },
    Ignored {
        code: String,
        reason: CouponRejection,
    },
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: OrderView,
    pub coupon: CouponOutcome,
}
