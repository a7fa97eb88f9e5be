use std::sync::{Arc, Mutex};

use bigdecimal::{BigDecimal, Zero};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::domain::commission::commission;
use crate::domain::coupon::{generate_code, CouponCode, CouponRejection, SellerCoupon};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CouponRepository, SellerRepository};
use crate::domain::seller::Seller;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Result of resolving a code offered at checkout.
#[derive(Debug, Clone)]
pub enum CouponCheck {
    Valid { coupon: SellerCoupon, seller: Seller },
    Invalid(CouponRejection),
}

/// Checkout preview for a code: who gets the commission and how much.
#[derive(Debug, Clone)]
pub struct CouponPreview {
    pub code: CouponCode,
    pub seller_name: String,
    pub commission_rate: BigDecimal,
    pub commission: Option<BigDecimal>,
}

pub struct CouponService {
    coupons: Arc<dyn CouponRepository>,
    sellers: Arc<dyn SellerRepository>,
    rng: Mutex<StdRng>,
    max_attempts: u32,
}

impl CouponService {
    pub fn new(
        coupons: Arc<dyn CouponRepository>,
        sellers: Arc<dyn SellerRepository>,
        max_attempts: u32,
    ) -> Self {
        Self::with_rng(coupons, sellers, max_attempts, StdRng::from_entropy())
    }

    pub fn with_rng(
        coupons: Arc<dyn CouponRepository>,
        sellers: Arc<dyn SellerRepository>,
        max_attempts: u32,
        rng: StdRng,
    ) -> Self {
        Self {
            coupons,
            sellers,
            rng: Mutex::new(rng),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn generate_code(&self) -> Result<CouponCode, DomainError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DomainError::Internal("coupon rng lock poisoned".to_string()))?;
        Ok(generate_code(&mut *rng))
    }

    /// True when no coupon, active or not, carries `code`.
    pub fn is_code_unique(&self, code: &CouponCode) -> Result<bool, DomainError> {
        Ok(!self.coupons.code_exists(code)?)
    }

    pub fn generate_unique_code(&self) -> Result<CouponCode, DomainError> {
        let mut remaining = self.max_attempts;
        self.draw_unique_code(&mut remaining)
    }

    /// Draw candidates until one passes the uniqueness pre-check. Every draw
    /// spends one of `remaining`.
    fn draw_unique_code(&self, remaining: &mut u32) -> Result<CouponCode, DomainError> {
        while *remaining > 0 {
            *remaining -= 1;
            let code = self.generate_code()?;
            if self.is_code_unique(&code)? {
                return Ok(code);
            }
            debug!("Coupon code {} already taken, drawing another", code);
        }
        Err(DomainError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Issue a fresh coupon for `seller_id`.
    ///
    /// The unique constraint on the code is the authority: a candidate that
    /// passes the pre-check but loses the insert race is retried and counts
    /// against the same attempt budget.
    pub fn issue(&self, seller_id: Uuid) -> Result<SellerCoupon, DomainError> {
        if self.sellers.find_by_id(seller_id)?.is_none() {
            return Err(DomainError::NotFound("Seller"));
        }

        let mut remaining = self.max_attempts;
        loop {
            let code = self.draw_unique_code(&mut remaining)?;
            match self.coupons.insert(seller_id, &code) {
                Ok(coupon) => {
                    info!("Issued coupon {} for seller {}", coupon.code, seller_id);
                    return Ok(coupon);
                }
                Err(DomainError::DuplicateCode(code)) => {
                    debug!("Coupon code {} taken concurrently, drawing another", code);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn list_for(&self, seller_id: Uuid) -> Result<Vec<SellerCoupon>, DomainError> {
        self.coupons.list_for_seller(seller_id)
    }

    pub fn set_active(&self, coupon_id: Uuid, active: bool) -> Result<SellerCoupon, DomainError> {
        let coupon = self
            .coupons
            .set_active(coupon_id, active)?
            .ok_or(DomainError::NotFound("Coupon"))?;
        info!(
            "Coupon {} {}",
            coupon.code,
            if active { "activated" } else { "deactivated" }
        );
        Ok(coupon)
    }

    pub fn activate(&self, coupon_id: Uuid) -> Result<SellerCoupon, DomainError> {
        self.set_active(coupon_id, true)
    }

    pub fn deactivate(&self, coupon_id: Uuid) -> Result<SellerCoupon, DomainError> {
        self.set_active(coupon_id, false)
    }

    pub fn record_redemption(
        &self,
        coupon_id: Uuid,
        commission: &BigDecimal,
    ) -> Result<SellerCoupon, DomainError> {
        if *commission < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "commission must not be negative".to_string(),
            ));
        }
        self.coupons
            .record_redemption(coupon_id, commission)?
            .ok_or(DomainError::NotFound("Coupon"))
    }

    /// Resolve a raw code. Only storage failures are errors; every way a code
    /// can fail to qualify is reported as `CouponCheck::Invalid`.
    pub fn resolve(&self, raw: &str) -> Result<CouponCheck, DomainError> {
        let Ok(code) = CouponCode::parse(raw) else {
            return Ok(CouponCheck::Invalid(CouponRejection::Malformed));
        };
        let Some(coupon) = self.coupons.find_active_by_code(&code)? else {
            return Ok(CouponCheck::Invalid(CouponRejection::UnknownOrInactive));
        };
        match self.sellers.find_by_id(coupon.seller_id)? {
            Some(seller) if seller.active => Ok(CouponCheck::Valid { coupon, seller }),
            _ => Ok(CouponCheck::Invalid(CouponRejection::SellerUnavailable)),
        }
    }

    pub fn preview(
        &self,
        raw: &str,
        order_total: Option<&BigDecimal>,
    ) -> Result<Result<CouponPreview, CouponRejection>, DomainError> {
        Ok(match self.resolve(raw)? {
            CouponCheck::Valid { coupon, seller } => Ok(CouponPreview {
                code: coupon.code,
                commission: order_total.map(|total| commission(total, &seller.commission_rate)),
                commission_rate: seller.commission_rate.as_decimal().clone(),
                seller_name: seller.name,
            }),
            CouponCheck::Invalid(reason) => Err(reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    use super::*;
    use crate::domain::commission::CommissionRate;
    use crate::domain::seller::{NewSeller, SellerPatch};
    use crate::infrastructure::memory::MemoryStore;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn seller(store: &MemoryStore, rate: &str) -> Seller {
        SellerRepository::insert(
            store,
            NewSeller {
                name: "João Silva".to_string(),
                email: "joao.silva@suamedicina.com".to_string(),
                phone: "(11) 99999-1111".to_string(),
                active: true,
                commission_rate: CommissionRate::from_str(rate).unwrap(),
            },
        )
        .unwrap()
    }

    fn service(store: &Arc<MemoryStore>, seed: u64) -> CouponService {
        CouponService::with_rng(
            store.clone(),
            store.clone(),
            DEFAULT_MAX_ATTEMPTS,
            StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn issue_creates_fresh_active_coupon() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "15");
        let coupon = service(&store, 1).issue(s.id).unwrap();

        assert_eq!(coupon.seller_id, s.id);
        assert!(coupon.is_active);
        assert_eq!(coupon.used_count, 0);
        assert_eq!(coupon.total_commission, BigDecimal::zero());
    }

    #[test]
    fn issue_for_unknown_seller_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            service(&store, 1).issue(Uuid::new_v4()),
            Err(DomainError::NotFound("Seller"))
        ));
    }

    #[test]
    fn preseeded_collision_is_never_returned() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");

        // The first candidate a seed-9 generator draws is taken in advance.
        let colliding = generate_code(&mut StdRng::seed_from_u64(9));
        CouponRepository::insert(&*store, s.id, &colliding).unwrap();

        let svc = service(&store, 9);
        let coupon = svc.issue(s.id).unwrap();
        assert_ne!(coupon.code, colliding);

        let code = service(&store, 9).generate_unique_code().unwrap();
        assert_ne!(code, colliding);
    }

    #[test]
    fn many_issues_yield_distinct_codes() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let svc = service(&store, 3);
        for _ in 0..50 {
            svc.issue(s.id).unwrap();
        }
        let coupons = svc.list_for(s.id).unwrap();
        let codes: std::collections::HashSet<_> = coupons.iter().map(|c| c.code.clone()).collect();
        assert_eq!(codes.len(), 50);
    }

    struct AlwaysTaken;

    impl CouponRepository for AlwaysTaken {
        fn insert(&self, _: Uuid, code: &CouponCode) -> Result<SellerCoupon, DomainError> {
            Err(DomainError::DuplicateCode(code.to_string()))
        }
        fn code_exists(&self, _: &CouponCode) -> Result<bool, DomainError> {
            Ok(false)
        }
        fn find_by_id(&self, _: Uuid) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
        fn find_active_by_code(&self, _: &CouponCode) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
        fn list_for_seller(&self, _: Uuid) -> Result<Vec<SellerCoupon>, DomainError> {
            Ok(vec![])
        }
        fn set_active(&self, _: Uuid, _: bool) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
        fn record_redemption(
            &self,
            _: Uuid,
            _: &BigDecimal,
        ) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
    }

    #[test]
    fn insert_conflicts_exhaust_after_bounded_attempts() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let svc = CouponService::with_rng(
            Arc::new(AlwaysTaken),
            store.clone(),
            5,
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(
            svc.issue(s.id),
            Err(DomainError::CodeSpaceExhausted { attempts: 5 })
        ));
    }

    /// Every candidate is already taken; counts the inserts attempted.
    #[derive(Default)]
    struct CodeSpaceFull {
        inserts: AtomicU32,
    }

    impl CouponRepository for CodeSpaceFull {
        fn insert(&self, _: Uuid, code: &CouponCode) -> Result<SellerCoupon, DomainError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::DuplicateCode(code.to_string()))
        }
        fn code_exists(&self, _: &CouponCode) -> Result<bool, DomainError> {
            Ok(true)
        }
        fn find_by_id(&self, _: Uuid) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
        fn find_active_by_code(&self, _: &CouponCode) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
        fn list_for_seller(&self, _: Uuid) -> Result<Vec<SellerCoupon>, DomainError> {
            Ok(vec![])
        }
        fn set_active(&self, _: Uuid, _: bool) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
        fn record_redemption(
            &self,
            _: Uuid,
            _: &BigDecimal,
        ) -> Result<Option<SellerCoupon>, DomainError> {
            Ok(None)
        }
    }

    #[test]
    fn taken_codes_exhaust_without_inserting() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let full = Arc::new(CodeSpaceFull::default());
        let svc =
            CouponService::with_rng(full.clone(), store.clone(), 4, StdRng::seed_from_u64(0));

        assert!(matches!(
            svc.generate_unique_code(),
            Err(DomainError::CodeSpaceExhausted { attempts: 4 })
        ));
        assert!(matches!(
            svc.issue(s.id),
            Err(DomainError::CodeSpaceExhausted { attempts: 4 })
        ));
        assert_eq!(full.inserts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_redemptions_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let svc = Arc::new(service(&store, 4));
        let coupon = svc.issue(s.id).unwrap();

        let handles: Vec<_> = ["10", "20"]
            .into_iter()
            .map(|amount| {
                let svc = svc.clone();
                thread::spawn(move || svc.record_redemption(coupon.id, &dec(amount)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let coupon = CouponRepository::find_by_id(&*store, coupon.id).unwrap().unwrap();
        assert_eq!(coupon.used_count, 2);
        assert_eq!(coupon.total_commission, dec("30"));
    }

    #[test]
    fn negative_redemption_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let svc = service(&store, 4);
        let coupon = svc.issue(s.id).unwrap();
        assert!(matches!(
            svc.record_redemption(coupon.id, &dec("-1")),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn resolve_accepts_lowercase_input() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let svc = service(&store, 5);
        let coupon = svc.issue(s.id).unwrap();

        let raw = coupon.code.as_str().to_ascii_lowercase();
        assert!(matches!(svc.resolve(&raw).unwrap(), CouponCheck::Valid { .. }));
    }

    #[test]
    fn resolve_reports_each_rejection() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "10");
        let svc = service(&store, 6);
        let coupon = svc.issue(s.id).unwrap();

        assert!(matches!(
            svc.resolve("nope").unwrap(),
            CouponCheck::Invalid(CouponRejection::Malformed)
        ));
        assert!(matches!(
            svc.resolve("ZZZ000").unwrap(),
            CouponCheck::Invalid(CouponRejection::UnknownOrInactive)
        ));

        svc.deactivate(coupon.id).unwrap();
        assert!(matches!(
            svc.resolve(coupon.code.as_str()).unwrap(),
            CouponCheck::Invalid(CouponRejection::UnknownOrInactive)
        ));
        svc.activate(coupon.id).unwrap();

        SellerRepository::update(
            &*store,
            s.id,
            SellerPatch {
                active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(
            svc.resolve(coupon.code.as_str()).unwrap(),
            CouponCheck::Invalid(CouponRejection::SellerUnavailable)
        ));
    }

    #[test]
    fn preview_prices_commission_like_checkout() {
        let store = Arc::new(MemoryStore::new());
        let s = seller(&store, "15");
        let svc = service(&store, 8);
        let coupon = svc.issue(s.id).unwrap();

        let preview = svc
            .preview(coupon.code.as_str(), Some(&dec("200.00")))
            .unwrap()
            .unwrap();
        assert_eq!(preview.seller_name, "João Silva");
        assert_eq!(preview.commission_rate, dec("15"));
        assert_eq!(preview.commission, Some(dec("30.00")));

        let rejected = svc.preview("ABC999", None).unwrap();
        assert_eq!(rejected.unwrap_err(), CouponRejection::UnknownOrInactive);
    }

    #[test]
    fn set_active_on_unknown_coupon_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            service(&store, 1).deactivate(Uuid::new_v4()),
            Err(DomainError::NotFound("Coupon"))
        ));
    }
}
