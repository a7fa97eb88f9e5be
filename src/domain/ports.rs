use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::coupon::{CouponCode, SellerCoupon};
use super::errors::DomainError;
use super::order::{ListResult, NewOrder, OrderStatus, OrderView, Redemption};
use super::product::{NewProduct, Product, ProductPatch};
use super::seller::{NewSeller, Seller, SellerPatch};

pub trait ProductRepository: Send + Sync + 'static {
    fn insert(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn insert_many(&self, products: Vec<NewProduct>) -> Result<usize, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    fn list(&self, active_only: bool) -> Result<Vec<Product>, DomainError>;
    fn count(&self) -> Result<i64, DomainError>;
    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait SellerRepository: Send + Sync + 'static {
    fn insert(&self, seller: NewSeller) -> Result<Seller, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Seller>, DomainError>;
    /// Newest first.
    fn list(&self, active_only: bool) -> Result<Vec<Seller>, DomainError>;
    fn update(&self, id: Uuid, patch: SellerPatch) -> Result<Option<Seller>, DomainError>;
    /// Deletes the seller together with its coupons. Fails with
    /// `DomainError::Conflict` when any of those coupons was ever redeemed.
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait CouponRepository: Send + Sync + 'static {
    /// Fails with `DomainError::DuplicateCode` when the code is taken.
    fn insert(&self, seller_id: Uuid, code: &CouponCode) -> Result<SellerCoupon, DomainError>;
    fn code_exists(&self, code: &CouponCode) -> Result<bool, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<SellerCoupon>, DomainError>;
    fn find_active_by_code(&self, code: &CouponCode) -> Result<Option<SellerCoupon>, DomainError>;
    /// Newest first.
    fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<SellerCoupon>, DomainError>;
    fn set_active(&self, id: Uuid, active: bool) -> Result<Option<SellerCoupon>, DomainError>;
    /// Atomic `used_count += 1, total_commission += commission`.
    fn record_redemption(
        &self,
        id: Uuid,
        commission: &BigDecimal,
    ) -> Result<Option<SellerCoupon>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Inserts the order and, when given, applies the redemption in the same
    /// transaction. A redemption against a coupon that is gone or inactive
    /// fails with `DomainError::CouponUnavailable` and nothing is written.
    fn create(
        &self,
        order: NewOrder,
        redemption: Option<Redemption>,
    ) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    fn list_by_coupon(&self, code: &CouponCode) -> Result<Vec<OrderView>, DomainError>;
    fn list_by_customer_email(&self, email: &str) -> Result<Vec<OrderView>, DomainError>;
    /// Moves the order to `to` only if it is currently in `from`; `None` when
    /// no such order exists in that state.
    fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}
