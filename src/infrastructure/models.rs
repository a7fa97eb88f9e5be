use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::commission::CommissionRate;
use crate::domain::coupon::{CouponCode, SellerCoupon};
use crate::domain::errors::DomainError;
use crate::domain::order::{Customer, OrderLineView, OrderView};
use crate::domain::product::Product;
use crate::domain::seller::Seller;
use crate::schema::{order_lines, orders, products, seller_coupons, sellers};

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub category: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub category: String,
    pub active: bool,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            category: row.category,
            active: row.active,
        }
    }
}

// ── Sellers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = sellers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SellerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub commission_rate: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sellers)]
pub struct NewSellerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub commission_rate: BigDecimal,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = sellers)]
pub struct SellerChangeset {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
    pub commission_rate: Option<BigDecimal>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SellerRow> for Seller {
    type Error = DomainError;

    fn try_from(row: SellerRow) -> Result<Self, Self::Error> {
        Ok(Seller {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            active: row.active,
            commission_rate: CommissionRate::new(row.commission_rate)
                .map_err(|e| DomainError::Internal(format!("seller {}: {}", row.id, e)))?,
            created_at: row.created_at,
        })
    }
}

// ── Coupons ──────────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = seller_coupons)]
#[diesel(belongs_to(SellerRow, foreign_key = seller_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CouponRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub used_count: i32,
    pub total_commission: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = seller_coupons)]
pub struct NewCouponRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub code: String,
}

impl TryFrom<CouponRow> for SellerCoupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(SellerCoupon {
            id: row.id,
            seller_id: row.seller_id,
            code: CouponCode::parse(&row.code)
                .map_err(|e| DomainError::Internal(format!("coupon {}: {}", row.id, e)))?,
            is_active: row.is_active,
            used_count: row.used_count,
            total_commission: row.total_commission,
            created_at: row.created_at,
        })
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub total: BigDecimal,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: String,
    pub seller_coupon_code: Option<String>,
    pub seller_commission: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub total: BigDecimal,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: String,
    pub seller_coupon_code: Option<String>,
    pub seller_commission: BigDecimal,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderRow {
    pub fn into_view(self, lines: Vec<OrderLineRow>) -> Result<OrderView, DomainError> {
        let status = self
            .status
            .parse()
            .map_err(|e| DomainError::Internal(format!("order {}: {}", self.id, e)))?;
        Ok(OrderView {
            id: self.id,
            total: self.total,
            customer: Customer {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
            },
            status,
            seller_coupon_code: self.seller_coupon_code,
            seller_commission: self.seller_commission,
            created_at: self.created_at,
            lines: lines
                .into_iter()
                .map(|l| OrderLineView {
                    id: l.id,
                    product_id: l.product_id,
                    product_name: l.product_name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
        })
    }
}
