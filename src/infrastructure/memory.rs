//! A process-local store implementing every repository port behind a single
//! mutex. Each call holds the lock for its whole duration, which gives the
//! same all-or-nothing behaviour as the Postgres transactions.

use std::sync::{Mutex, MutexGuard};

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::coupon::{CouponCode, SellerCoupon};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderLineView, OrderStatus, OrderView, Redemption,
};
use crate::domain::ports::{
    CouponRepository, OrderRepository, ProductRepository, SellerRepository,
};
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::domain::seller::{NewSeller, Seller, SellerPatch};

#[derive(Default)]
struct State {
    products: Vec<Product>,
    sellers: Vec<Seller>,
    coupons: Vec<SellerCoupon>,
    orders: Vec<OrderView>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("memory store lock poisoned".to_string()))
    }
}

fn summary(order: &OrderView) -> OrderView {
    OrderView {
        lines: vec![],
        ..order.clone()
    }
}

// ── Products ─────────────────────────────────────────────────────────────────

impl ProductRepository for MemoryStore {
    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            category: product.category,
            active: product.active,
        };
        self.lock()?.products.push(product.clone());
        Ok(product)
    }

    fn insert_many(&self, products: Vec<NewProduct>) -> Result<usize, DomainError> {
        let count = products.len();
        for product in products {
            ProductRepository::insert(self, product)?;
        }
        Ok(count)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.lock()?.products.iter().find(|p| p.id == id).cloned())
    }

    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        Ok(self
            .lock()?
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn list(&self, active_only: bool) -> Result<Vec<Product>, DomainError> {
        let mut products: Vec<Product> = self
            .lock()?
            .products
            .iter()
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect();
        products.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(products)
    }

    fn count(&self) -> Result<i64, DomainError> {
        Ok(self.lock()?.products.len() as i64)
    }

    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, DomainError> {
        let mut state = self.lock()?;
        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(active) = patch.active {
            product.active = active;
        }
        Ok(Some(product.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() != before)
    }
}

// ── Sellers ──────────────────────────────────────────────────────────────────

impl SellerRepository for MemoryStore {
    fn insert(&self, seller: NewSeller) -> Result<Seller, DomainError> {
        let seller = Seller {
            id: Uuid::new_v4(),
            name: seller.name,
            email: seller.email,
            phone: seller.phone,
            active: seller.active,
            commission_rate: seller.commission_rate,
            created_at: Utc::now(),
        };
        self.lock()?.sellers.push(seller.clone());
        Ok(seller)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Seller>, DomainError> {
        Ok(self.lock()?.sellers.iter().find(|s| s.id == id).cloned())
    }

    fn list(&self, active_only: bool) -> Result<Vec<Seller>, DomainError> {
        Ok(self
            .lock()?
            .sellers
            .iter()
            .rev()
            .filter(|s| !active_only || s.active)
            .cloned()
            .collect())
    }

    fn update(&self, id: Uuid, patch: SellerPatch) -> Result<Option<Seller>, DomainError> {
        let mut state = self.lock()?;
        let Some(seller) = state.sellers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            seller.name = name;
        }
        if let Some(email) = patch.email {
            seller.email = email;
        }
        if let Some(phone) = patch.phone {
            seller.phone = phone;
        }
        if let Some(active) = patch.active {
            seller.active = active;
        }
        if let Some(rate) = patch.commission_rate {
            seller.commission_rate = rate;
        }
        Ok(Some(seller.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        if !state.sellers.iter().any(|s| s.id == id) {
            return Ok(false);
        }
        if state
            .coupons
            .iter()
            .any(|c| c.seller_id == id && c.used_count > 0)
        {
            return Err(DomainError::Conflict(
                "seller has redeemed coupons; deactivate it instead".to_string(),
            ));
        }
        state.coupons.retain(|c| c.seller_id != id);
        state.sellers.retain(|s| s.id != id);
        Ok(true)
    }
}

// ── Coupons ──────────────────────────────────────────────────────────────────

impl CouponRepository for MemoryStore {
    fn insert(&self, seller_id: Uuid, code: &CouponCode) -> Result<SellerCoupon, DomainError> {
        let mut state = self.lock()?;
        if !state.sellers.iter().any(|s| s.id == seller_id) {
            return Err(DomainError::NotFound("Seller"));
        }
        if state.coupons.iter().any(|c| &c.code == code) {
            return Err(DomainError::DuplicateCode(code.to_string()));
        }
        let coupon = SellerCoupon {
            id: Uuid::new_v4(),
            seller_id,
            code: code.clone(),
            is_active: true,
            used_count: 0,
            total_commission: BigDecimal::zero(),
            created_at: Utc::now(),
        };
        state.coupons.push(coupon.clone());
        Ok(coupon)
    }

    fn code_exists(&self, code: &CouponCode) -> Result<bool, DomainError> {
        Ok(self.lock()?.coupons.iter().any(|c| &c.code == code))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<SellerCoupon>, DomainError> {
        Ok(self.lock()?.coupons.iter().find(|c| c.id == id).cloned())
    }

    fn find_active_by_code(&self, code: &CouponCode) -> Result<Option<SellerCoupon>, DomainError> {
        Ok(self
            .lock()?
            .coupons
            .iter()
            .find(|c| &c.code == code && c.is_active)
            .cloned())
    }

    fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<SellerCoupon>, DomainError> {
        Ok(self
            .lock()?
            .coupons
            .iter()
            .rev()
            .filter(|c| c.seller_id == seller_id)
            .cloned()
            .collect())
    }

    fn set_active(&self, id: Uuid, active: bool) -> Result<Option<SellerCoupon>, DomainError> {
        let mut state = self.lock()?;
        Ok(state.coupons.iter_mut().find(|c| c.id == id).map(|c| {
            c.is_active = active;
            c.clone()
        }))
    }

    fn record_redemption(
        &self,
        id: Uuid,
        commission: &BigDecimal,
    ) -> Result<Option<SellerCoupon>, DomainError> {
        let mut state = self.lock()?;
        Ok(state.coupons.iter_mut().find(|c| c.id == id).map(|c| {
            c.used_count += 1;
            c.total_commission += commission;
            c.clone()
        }))
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

impl OrderRepository for MemoryStore {
    fn create(
        &self,
        order: NewOrder,
        redemption: Option<Redemption>,
    ) -> Result<OrderView, DomainError> {
        let mut state = self.lock()?;

        if let Some(redemption) = redemption {
            let coupon = state
                .coupons
                .iter_mut()
                .find(|c| c.id == redemption.coupon_id && c.is_active)
                .ok_or(DomainError::CouponUnavailable)?;
            coupon.used_count += 1;
            coupon.total_commission += &redemption.commission;
        }

        let view = OrderView {
            id: Uuid::new_v4(),
            total: order.total,
            customer: order.customer,
            status: OrderStatus::Pending,
            seller_coupon_code: order.seller_coupon_code,
            seller_commission: order.seller_commission,
            created_at: Utc::now(),
            lines: order
                .lines
                .into_iter()
                .map(|l| OrderLineView {
                    id: Uuid::new_v4(),
                    product_id: l.product_id,
                    product_name: l.product_name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
        };
        state.orders.push(view.clone());
        Ok(view)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.lock()?.orders.iter().find(|o| o.id == id).cloned())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let state = self.lock()?;
        let offset = ((page - 1) * limit).max(0) as usize;
        Ok(ListResult {
            items: state
                .orders
                .iter()
                .rev()
                .skip(offset)
                .take(limit.max(0) as usize)
                .map(summary)
                .collect(),
            total: state.orders.len() as i64,
        })
    }

    fn list_by_coupon(&self, code: &CouponCode) -> Result<Vec<OrderView>, DomainError> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .rev()
            .filter(|o| o.seller_coupon_code.as_deref() == Some(code.as_str()))
            .map(summary)
            .collect())
    }

    fn list_by_customer_email(&self, email: &str) -> Result<Vec<OrderView>, DomainError> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .rev()
            .filter(|o| o.customer.email == email)
            .map(summary)
            .collect())
    }

    fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut state = self.lock()?;
        Ok(state
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == from)
            .map(|o| {
                o.status = to;
                o.clone()
            }))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        let before = state.orders.len();
        state.orders.retain(|o| o.id != id);
        Ok(state.orders.len() != before)
    }
}
