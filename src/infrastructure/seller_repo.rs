use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::SellerRepository;
use crate::domain::seller::{NewSeller, Seller, SellerPatch};
use crate::schema::{seller_coupons, sellers};

use super::models::{NewSellerRow, SellerChangeset, SellerRow};

pub struct DieselSellerRepository {
    pool: DbPool,
}

impl DieselSellerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SellerRepository for DieselSellerRepository {
    fn insert(&self, seller: NewSeller) -> Result<Seller, DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(sellers::table)
            .values(&NewSellerRow {
                id: Uuid::new_v4(),
                name: seller.name,
                email: seller.email,
                phone: seller.phone,
                active: seller.active,
                commission_rate: seller.commission_rate.as_decimal().clone(),
            })
            .returning(SellerRow::as_returning())
            .get_result(&mut conn)?
            .try_into()
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Seller>, DomainError> {
        let mut conn = self.pool.get()?;
        sellers::table
            .find(id)
            .select(SellerRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Seller::try_from)
            .transpose()
    }

    fn list(&self, active_only: bool) -> Result<Vec<Seller>, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = sellers::table
            .select(SellerRow::as_select())
            .order(sellers::created_at.desc())
            .into_boxed();
        if active_only {
            query = query.filter(sellers::active.eq(true));
        }
        query
            .load(&mut conn)?
            .into_iter()
            .map(Seller::try_from)
            .collect()
    }

    fn update(&self, id: Uuid, patch: SellerPatch) -> Result<Option<Seller>, DomainError> {
        let mut conn = self.pool.get()?;
        diesel::update(sellers::table.find(id))
            .set(&SellerChangeset {
                name: patch.name,
                email: patch.email,
                phone: patch.phone,
                active: patch.active,
                commission_rate: patch.commission_rate.map(|r| r.as_decimal().clone()),
                updated_at: Utc::now(),
            })
            .returning(SellerRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(Seller::try_from)
            .transpose()
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row locks on the seller and its coupons keep issuance and
            // redemption out until the transaction ends.
            let exists = sellers::table
                .find(id)
                .select(sellers::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?
                .is_some();
            if !exists {
                return Ok(false);
            }

            let used_counts: Vec<i32> = seller_coupons::table
                .filter(seller_coupons::seller_id.eq(id))
                .select(seller_coupons::used_count)
                .for_update()
                .load(conn)?;
            if used_counts.iter().any(|used| *used > 0) {
                return Err(DomainError::Conflict(
                    "seller has redeemed coupons; deactivate it instead".to_string(),
                ));
            }

            diesel::delete(seller_coupons::table.filter(seller_coupons::seller_id.eq(id)))
                .execute(conn)?;
            diesel::delete(sellers::table.find(id)).execute(conn)?;
            Ok(true)
        })
    }
}
