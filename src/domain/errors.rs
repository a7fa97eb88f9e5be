use thiserror::Error;

use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Coupon code {0} is already taken")]
    DuplicateCode(String),
    #[error("Could not generate a unique coupon code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    /// The coupon picked at checkout disappeared or was deactivated before the
    /// order transaction reached it.
    #[error("Coupon is no longer redeemable")]
    CouponUnavailable,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Internal error: {0}")]
    Internal(String),
}
