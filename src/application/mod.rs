pub mod coupon_service;
pub mod feed;
pub mod order_service;
pub mod product_service;
pub mod seller_service;

use std::sync::Arc;

use crate::domain::ports::{CouponRepository, OrderRepository, ProductRepository, SellerRepository};
use crate::infrastructure::memory::MemoryStore;

use coupon_service::{CouponService, DEFAULT_MAX_ATTEMPTS};
use feed::ChangeFeed;
use order_service::OrderService;
use product_service::ProductService;
use seller_service::SellerService;

/// Every service the HTTP layer needs, wired to one set of repositories.
pub struct AppState {
    pub products: ProductService,
    pub sellers: SellerService,
    pub coupons: Arc<CouponService>,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        sellers: Arc<dyn SellerRepository>,
        coupons: Arc<dyn CouponRepository>,
        orders: Arc<dyn OrderRepository>,
        max_code_attempts: u32,
    ) -> Self {
        let feed = ChangeFeed::default();
        let coupon_service = Arc::new(CouponService::new(
            coupons,
            sellers.clone(),
            max_code_attempts,
        ));
        Self {
            products: ProductService::new(products.clone(), feed.clone()),
            sellers: SellerService::new(sellers, coupon_service.clone(), feed),
            orders: OrderService::new(orders, products, coupon_service.clone()),
            coupons: coupon_service,
        }
    }

    /// State backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            DEFAULT_MAX_ATTEMPTS,
        )
    }
}
