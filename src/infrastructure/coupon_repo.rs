use bigdecimal::BigDecimal;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::coupon::{CouponCode, SellerCoupon};
use crate::domain::errors::DomainError;
use crate::domain::ports::CouponRepository;
use crate::schema::seller_coupons;

use super::models::{CouponRow, NewCouponRow};

const CODE_UNIQUE_CONSTRAINT: &str = "seller_coupons_code_key";

/// Bumps the usage counters of an active coupon in a single statement so
/// concurrent redemptions never lose an increment. Returns the number of rows
/// touched: zero means the coupon is gone or inactive.
pub(super) fn redeem_active(
    conn: &mut PgConnection,
    id: Uuid,
    commission: &BigDecimal,
) -> QueryResult<usize> {
    diesel::update(
        seller_coupons::table
            .filter(seller_coupons::id.eq(id))
            .filter(seller_coupons::is_active.eq(true)),
    )
    .set((
        seller_coupons::used_count.eq(seller_coupons::used_count + 1),
        seller_coupons::total_commission.eq(seller_coupons::total_commission + commission.clone()),
    ))
    .execute(conn)
}

pub struct DieselCouponRepository {
    pool: DbPool,
}

impl DieselCouponRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CouponRepository for DieselCouponRepository {
    fn insert(&self, seller_id: Uuid, code: &CouponCode) -> Result<SellerCoupon, DomainError> {
        let mut conn = self.pool.get()?;
        let result = diesel::insert_into(seller_coupons::table)
            .values(&NewCouponRow {
                id: Uuid::new_v4(),
                seller_id,
                code: code.to_string(),
            })
            .returning(CouponRow::as_returning())
            .get_result(&mut conn);

        match result {
            Ok(row) => row.try_into(),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                if info.constraint_name() == Some(CODE_UNIQUE_CONSTRAINT) =>
            {
                Err(DomainError::DuplicateCode(code.to_string()))
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                Err(DomainError::NotFound("Seller"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn code_exists(&self, code: &CouponCode) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::select(diesel::dsl::exists(
            seller_coupons::table.filter(seller_coupons::code.eq(code.as_str())),
        ))
        .get_result(&mut conn)?)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<SellerCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        seller_coupons::table
            .find(id)
            .select(CouponRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(SellerCoupon::try_from)
            .transpose()
    }

    fn find_active_by_code(&self, code: &CouponCode) -> Result<Option<SellerCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        seller_coupons::table
            .filter(seller_coupons::code.eq(code.as_str()))
            .filter(seller_coupons::is_active.eq(true))
            .select(CouponRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(SellerCoupon::try_from)
            .transpose()
    }

    fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<SellerCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        seller_coupons::table
            .filter(seller_coupons::seller_id.eq(seller_id))
            .select(CouponRow::as_select())
            .order(seller_coupons::created_at.desc())
            .load(&mut conn)?
            .into_iter()
            .map(SellerCoupon::try_from)
            .collect()
    }

    fn set_active(&self, id: Uuid, active: bool) -> Result<Option<SellerCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        diesel::update(seller_coupons::table.find(id))
            .set(seller_coupons::is_active.eq(active))
            .returning(CouponRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(SellerCoupon::try_from)
            .transpose()
    }

    fn record_redemption(
        &self,
        id: Uuid,
        commission: &BigDecimal,
    ) -> Result<Option<SellerCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        diesel::update(seller_coupons::table.find(id))
            .set((
                seller_coupons::used_count.eq(seller_coupons::used_count + 1),
                seller_coupons::total_commission
                    .eq(seller_coupons::total_commission + commission.clone()),
            ))
            .returning(CouponRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(SellerCoupon::try_from)
            .transpose()
    }
}
