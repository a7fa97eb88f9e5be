use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::schema::products;

use super::models::{NewProductRow, ProductChangeset, ProductRow};

fn new_row(product: NewProduct) -> NewProductRow {
    NewProductRow {
        id: Uuid::new_v4(),
        name: product.name,
        description: product.description,
        price: product.price,
        image_url: product.image_url,
        category: product.category,
        active: product.active,
    }
}

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&new_row(product))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn insert_many(&self, new_products: Vec<NewProduct>) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<NewProductRow> = new_products.into_iter().map(new_row).collect();
        Ok(diesel::insert_into(products::table)
            .values(&rows)
            .execute(&mut conn)?)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn list(&self, active_only: bool) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = products::table
            .select(ProductRow::as_select())
            .order((products::category.asc(), products::name.asc()))
            .into_boxed();
        if active_only {
            query = query.filter(products::active.eq(true));
        }
        let rows = query.load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn count(&self) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(products::table.count().get_result(&mut conn)?)
    }

    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set(&ProductChangeset {
                name: patch.name,
                description: patch.description,
                price: patch.price,
                image_url: patch.image_url,
                category: patch.category,
                active: patch.active,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::DieselProductRepository;
    use crate::domain::ports::ProductRepository;
    use crate::domain::product::{initial_catalog, NewProduct, ProductPatch};
    use crate::infrastructure::test_support::setup_db;

    fn vaccine() -> NewProduct {
        NewProduct {
            name: "Vacina Gripe".to_string(),
            description: "Vacina contra Influenza".to_string(),
            price: BigDecimal::from_str("65.00").expect("valid decimal"),
            image_url: None,
            category: "Vacina".to_string(),
            active: true,
        }
    }

    #[tokio::test]
    async fn insert_update_delete_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProductRepository::new(pool);

        let product = repo.insert(vaccine()).expect("insert failed");
        assert_eq!(repo.find_by_id(product.id).expect("find failed"), Some(product.clone()));

        let updated = repo
            .update(
                product.id,
                ProductPatch {
                    price: Some(BigDecimal::from(70)),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .expect("update failed")
            .expect("product should exist");
        assert_eq!(updated.price, BigDecimal::from(70));
        assert!(!updated.active);
        assert_eq!(updated.name, "Vacina Gripe");

        assert!(repo.list(true).expect("list failed").is_empty());
        assert!(repo.delete(product.id).expect("delete failed"));
        assert!(!repo.delete(product.id).expect("delete failed"));
    }

    #[tokio::test]
    async fn update_unknown_product_returns_none() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProductRepository::new(pool);

        let result = repo
            .update(
                uuid::Uuid::new_v4(),
                ProductPatch {
                    active: Some(true),
                    ..Default::default()
                },
            )
            .expect("update should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn insert_many_and_find_many() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProductRepository::new(pool);

        let catalog = initial_catalog();
        let inserted = repo.insert_many(catalog.clone()).expect("seed failed");
        assert_eq!(inserted, catalog.len());
        assert_eq!(repo.count().expect("count failed"), catalog.len() as i64);

        let all = repo.list(false).expect("list failed");
        let ids: Vec<_> = all.iter().take(3).map(|p| p.id).collect();
        assert_eq!(repo.find_many(&ids).expect("find_many failed").len(), 3);
    }
}
