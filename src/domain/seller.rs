use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::commission::{round_money, CommissionRate};
use super::coupon::SellerCoupon;

#[derive(Debug, Clone, PartialEq)]
pub struct Seller {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub commission_rate: CommissionRate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSeller {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub commission_rate: CommissionRate,
}

/// Merge-patch for a seller; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct SellerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
    pub commission_rate: Option<CommissionRate>,
}

impl SellerPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.active.is_none()
            && self.commission_rate.is_none()
    }
}

/// Commission totals across every coupon a seller owns.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerStats {
    pub total_commissions: BigDecimal,
    pub total_orders: i64,
    pub average_commission: BigDecimal,
}

impl SellerStats {
    pub fn from_coupons(coupons: &[SellerCoupon]) -> Self {
        let total_commissions = coupons
            .iter()
            .fold(BigDecimal::zero(), |acc, c| acc + &c.total_commission);
        let total_orders: i64 = coupons.iter().map(|c| i64::from(c.used_count)).sum();
        let average_commission = if total_orders > 0 {
            round_money(&(total_commissions.clone() / BigDecimal::from(total_orders)))
        } else {
            BigDecimal::zero()
        };

        Self {
            total_commissions,
            total_orders,
            average_commission,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::coupon::CouponCode;

    fn coupon(used: i32, total: &str) -> SellerCoupon {
        SellerCoupon {
            id: Uuid::new_v4(),
            seller_id: Uuid::nil(),
            code: CouponCode::parse("ABC123").unwrap(),
            is_active: true,
            used_count: used,
            total_commission: BigDecimal::from_str(total).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stats_of_no_coupons_are_zero() {
        let stats = SellerStats::from_coupons(&[]);
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_commissions, BigDecimal::zero());
        assert_eq!(stats.average_commission, BigDecimal::zero());
    }

    #[test]
    fn stats_sum_across_coupons() {
        let stats = SellerStats::from_coupons(&[coupon(2, "30.00"), coupon(1, "10.00")]);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_commissions, BigDecimal::from(40));
        assert_eq!(stats.average_commission, BigDecimal::from_str("13.33").unwrap());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(SellerPatch::default().is_empty());
        let patch = SellerPatch {
            active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
