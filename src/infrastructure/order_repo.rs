use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::coupon::CouponCode;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, OrderStatus, OrderView, Redemption};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_lines, orders};

use super::coupon_repo::redeem_active;
use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow};

fn load_lines(conn: &mut PgConnection, order_id: Uuid) -> QueryResult<Vec<OrderLineRow>> {
    order_lines::table
        .filter(order_lines::order_id.eq(order_id))
        .select(OrderLineRow::as_select())
        .order(order_lines::created_at.asc())
        .load(conn)
}

fn summaries(rows: Vec<OrderRow>) -> Result<Vec<OrderView>, DomainError> {
    rows.into_iter().map(|o| o.into_view(vec![])).collect()
}

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(
        &self,
        order: NewOrder,
        redemption: Option<Redemption>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Count the redemption first; a coupon deactivated since the
            //    checkout resolved it aborts the whole order.
            if let Some(redemption) = &redemption {
                if redeem_active(conn, redemption.coupon_id, &redemption.commission)? == 0 {
                    return Err(DomainError::CouponUnavailable);
                }
            }

            // 2. Insert the order
            let order_id = Uuid::new_v4();
            let row = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    total: order.total,
                    customer_name: order.customer.name,
                    customer_email: order.customer.email,
                    customer_phone: order.customer.phone,
                    status: OrderStatus::Pending.as_str().to_string(),
                    seller_coupon_code: order.seller_coupon_code,
                    seller_commission: order.seller_commission,
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 3. Insert order lines
            let new_lines: Vec<NewOrderLineRow> = order
                .lines
                .into_iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    product_name: l.product_name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect();
            let lines = if new_lines.is_empty() {
                vec![]
            } else {
                diesel::insert_into(order_lines::table)
                    .values(&new_lines)
                    .returning(OrderLineRow::as_returning())
                    .get_results(conn)?
            };

            row.into_view(lines)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = load_lines(&mut conn, order.id)?;
        order.into_view(lines).map(Some)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1).max(0) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: summaries(rows)?,
                total,
            })
        })
    }

    fn list_by_coupon(&self, code: &CouponCode) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = orders::table
            .filter(orders::seller_coupon_code.eq(code.as_str()))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;
        summaries(rows)
    }

    fn list_by_customer_email(&self, email: &str) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = orders::table
            .filter(orders::customer_email.eq(email))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;
        summaries(rows)
    }

    fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::update(
                orders::table
                    .filter(orders::id.eq(id))
                    .filter(orders::status.eq(from.as_str())),
            )
            .set((
                orders::status.eq(to.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(conn)
            .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };

            let lines = load_lines(conn, row.id)?;
            row.into_view(lines).map(Some)
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(orders::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::db::DbPool;
    use crate::domain::commission::CommissionRate;
    use crate::domain::coupon::{CouponCode, SellerCoupon};
    use crate::domain::errors::DomainError;
    use crate::domain::order::{Customer, NewOrder, NewOrderLine, OrderStatus, Redemption};
    use crate::domain::ports::{CouponRepository, OrderRepository, SellerRepository};
    use crate::domain::seller::NewSeller;
    use crate::infrastructure::coupon_repo::DieselCouponRepository;
    use crate::infrastructure::seller_repo::DieselSellerRepository;
    use crate::infrastructure::test_support::setup_db;

    fn make_order(email: &str, price: &str, coupon: Option<&CouponCode>) -> NewOrder {
        let unit_price = BigDecimal::from_str(price).expect("valid decimal");
        NewOrder {
            total: &unit_price * BigDecimal::from(2),
            lines: vec![NewOrderLine {
                product_id: Uuid::new_v4(),
                product_name: "Consulta Online".to_string(),
                quantity: 2,
                unit_price,
            }],
            customer: Customer {
                name: "Maria Silva".to_string(),
                email: email.to_string(),
                phone: "(21) 97777-2222".to_string(),
            },
            seller_coupon_code: coupon.map(CouponCode::to_string),
            seller_commission: BigDecimal::from(0),
        }
    }

    fn seed_coupon(pool: &DbPool, raw: &str) -> SellerCoupon {
        let seller = DieselSellerRepository::new(pool.clone())
            .insert(NewSeller {
                name: "Carlos Lima".to_string(),
                email: "carlos@suamedicina.com".to_string(),
                phone: "(31) 96666-4444".to_string(),
                active: true,
                commission_rate: CommissionRate::from_str("10").expect("valid rate"),
            })
            .expect("seller insert failed");
        DieselCouponRepository::new(pool.clone())
            .insert(seller.id, &CouponCode::parse(raw).expect("valid code"))
            .expect("coupon insert failed")
    }

    #[tokio::test]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let created = repo
            .create(make_order("maria@example.com", "9.99", None), None)
            .expect("create failed");

        let order = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(order, created);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, BigDecimal::from_str("19.98").unwrap());
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 2);
        assert!(order.seller_coupon_code.is_none());
    }

    #[tokio::test]
    async fn create_with_redemption_updates_coupon_in_same_transaction() {
        let (_container, pool) = setup_db().await;
        let coupon = seed_coupon(&pool, "MED100");
        let repo = DieselOrderRepository::new(pool.clone());
        let coupons = DieselCouponRepository::new(pool);

        let mut order = make_order("maria@example.com", "100.00", Some(&coupon.code));
        order.seller_commission = BigDecimal::from(20);
        let created = repo
            .create(
                order,
                Some(Redemption {
                    coupon_id: coupon.id,
                    commission: BigDecimal::from(20),
                }),
            )
            .expect("create failed");
        assert_eq!(created.seller_coupon_code.as_deref(), Some(coupon.code.as_str()));

        let coupon = coupons
            .find_by_id(coupon.id)
            .expect("find failed")
            .expect("coupon should exist");
        assert_eq!(coupon.used_count, 1);
        assert_eq!(coupon.total_commission, BigDecimal::from(20));

        let by_coupon = repo.list_by_coupon(&coupon.code).expect("list failed");
        assert_eq!(by_coupon.len(), 1);
        assert_eq!(by_coupon[0].id, created.id);
    }

    #[tokio::test]
    async fn redemption_against_inactive_coupon_writes_nothing() {
        let (_container, pool) = setup_db().await;
        let coupon = seed_coupon(&pool, "OFF404");
        let repo = DieselOrderRepository::new(pool.clone());
        let coupons = DieselCouponRepository::new(pool);
        coupons.set_active(coupon.id, false).expect("update failed");

        let err = repo
            .create(
                make_order("maria@example.com", "50.00", Some(&coupon.code)),
                Some(Redemption {
                    coupon_id: coupon.id,
                    commission: BigDecimal::from(5),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::CouponUnavailable));

        assert_eq!(repo.list(1, 20).expect("list failed").total, 0);
        let coupon = coupons
            .find_by_id(coupon.id)
            .expect("find failed")
            .expect("coupon should exist");
        assert_eq!(coupon.used_count, 0);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let result = repo
            .find_by_id(Uuid::new_v4())
            .expect("find should not error");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(
                repo.create(make_order("maria@example.com", "1.00", None), None)
                    .expect("create failed")
                    .id,
            );
        }

        let page1 = repo.list(1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);
        assert_eq!(page1.items[0].id, ids[4]);
        assert!(page1.items[0].lines.is_empty());

        let page2 = repo.list(2, 3).expect("list page 2 failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
        assert_eq!(page2.items[1].id, ids[0]);
    }

    #[tokio::test]
    async fn list_by_customer_email_filters() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        repo.create(make_order("maria@example.com", "1.00", None), None)
            .expect("create failed");
        repo.create(make_order("joao@example.com", "2.00", None), None)
            .expect("create failed");

        let orders = repo
            .list_by_customer_email("joao@example.com")
            .expect("list failed");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].customer.email, "joao@example.com");
    }

    #[tokio::test]
    async fn transition_status_only_from_expected_state() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let order = repo
            .create(make_order("maria@example.com", "3.00", None), None)
            .expect("create failed");

        let completed = repo
            .transition_status(order.id, OrderStatus::Pending, OrderStatus::Completed)
            .expect("transition failed")
            .expect("order should have moved");
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(completed.lines.len(), 1);

        let again = repo
            .transition_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .expect("transition failed");
        assert!(again.is_none());

        assert!(repo.delete(order.id).expect("delete failed"));
        assert!(repo.find_by_id(order.id).expect("find failed").is_none());
        assert!(!repo.delete(order.id).expect("delete failed"));
    }
}
