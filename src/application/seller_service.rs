use std::sync::Arc;

use log::{error, info, warn};
use uuid::Uuid;

use super::coupon_service::CouponService;
use super::feed::{ChangeFeed, Topic, Watch};
use crate::domain::coupon::SellerCoupon;
use crate::domain::errors::DomainError;
use crate::domain::ports::SellerRepository;
use crate::domain::seller::{NewSeller, Seller, SellerPatch, SellerStats};

pub struct SellerService {
    sellers: Arc<dyn SellerRepository>,
    coupons: Arc<CouponService>,
    feed: ChangeFeed,
}

impl SellerService {
    pub fn new(
        sellers: Arc<dyn SellerRepository>,
        coupons: Arc<CouponService>,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            sellers,
            coupons,
            feed,
        }
    }

    /// Register a seller and issue its first coupon.
    ///
    /// A seller never exists without a coupon: if issuing fails the seller
    /// record is removed again and the issuing error is returned.
    pub fn create(&self, seller: NewSeller) -> Result<(Seller, SellerCoupon), DomainError> {
        let seller = self.sellers.insert(seller)?;

        let coupon = match self.coupons.issue(seller.id) {
            Ok(coupon) => coupon,
            Err(e) => {
                warn!(
                    "Could not issue initial coupon for seller {}: {}; rolling back",
                    seller.id, e
                );
                if let Err(cleanup) = self.sellers.delete(seller.id) {
                    error!("Failed to remove seller {} after coupon error: {}", seller.id, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            "Created seller {} ({}) with coupon {}",
            seller.id, seller.name, coupon.code
        );
        self.feed.publish(Topic::Sellers);
        Ok((seller, coupon))
    }

    pub fn get(&self, id: Uuid) -> Result<Seller, DomainError> {
        self.sellers
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Seller"))
    }

    pub fn list(&self, active_only: bool) -> Result<Vec<Seller>, DomainError> {
        self.sellers.list(active_only)
    }

    pub fn update(&self, id: Uuid, patch: SellerPatch) -> Result<Seller, DomainError> {
        if patch.is_empty() {
            return self.get(id);
        }
        let seller = self
            .sellers
            .update(id, patch)?
            .ok_or(DomainError::NotFound("Seller"))?;
        self.feed.publish(Topic::Sellers);
        Ok(seller)
    }

    /// Coupons keep their own flag; redemption checks both.
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<Seller, DomainError> {
        let seller = self.update(
            id,
            SellerPatch {
                active: Some(active),
                ..Default::default()
            },
        )?;
        info!(
            "Seller {} {}",
            seller.id,
            if active { "activated" } else { "deactivated" }
        );
        Ok(seller)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.sellers.delete(id)? {
            return Err(DomainError::NotFound("Seller"));
        }
        info!("Deleted seller {}", id);
        self.feed.publish(Topic::Sellers);
        Ok(())
    }

    pub fn issue_coupon(&self, id: Uuid) -> Result<SellerCoupon, DomainError> {
        self.coupons.issue(id)
    }

    pub fn coupons(&self, id: Uuid) -> Result<Vec<SellerCoupon>, DomainError> {
        self.get(id)?;
        self.coupons.list_for(id)
    }

    pub fn stats(&self, id: Uuid) -> Result<SellerStats, DomainError> {
        Ok(SellerStats::from_coupons(&self.coupons(id)?))
    }

    pub fn watch(&self, active_only: bool) -> Result<Watch<Seller>, DomainError> {
        let subscription = self.feed.subscribe(Topic::Sellers);
        Ok(Watch {
            snapshot: self.list(active_only)?,
            subscription,
        })
    }
}
