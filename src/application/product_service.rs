use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use log::info;
use uuid::Uuid;

use super::feed::{ChangeFeed, Topic, Watch};
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{initial_catalog, NewProduct, Product, ProductPatch};

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    feed: ChangeFeed,
}

fn check_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price <= BigDecimal::zero() {
        return Err(DomainError::InvalidInput(
            "price must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, feed: ChangeFeed) -> Self {
        Self { products, feed }
    }

    pub fn list(&self, active_only: bool) -> Result<Vec<Product>, DomainError> {
        self.products.list(active_only)
    }

    pub fn get(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Product"))
    }

    pub fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        check_price(&product.price)?;
        let product = self.products.insert(product)?;
        info!("Created product {} ({})", product.id, product.name);
        self.feed.publish(Topic::Products);
        Ok(product)
    }

    pub fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, DomainError> {
        if let Some(price) = &patch.price {
            check_price(price)?;
        }
        if patch.is_empty() {
            return self.get(id);
        }
        let product = self
            .products
            .update(id, patch)?
            .ok_or(DomainError::NotFound("Product"))?;
        self.feed.publish(Topic::Products);
        Ok(product)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.products.delete(id)? {
            return Err(DomainError::NotFound("Product"));
        }
        info!("Deleted product {}", id);
        self.feed.publish(Topic::Products);
        Ok(())
    }

    /// Insert the launch catalog when the store holds no products yet.
    /// Returns the number of products inserted.
    pub fn seed_if_empty(&self) -> Result<usize, DomainError> {
        if self.products.count()? > 0 {
            return Ok(0);
        }
        let inserted = self.products.insert_many(initial_catalog())?;
        info!("Seeded catalog with {} products", inserted);
        self.feed.publish(Topic::Products);
        Ok(inserted)
    }

    pub fn watch(&self, active_only: bool) -> Result<Watch<Product>, DomainError> {
        let subscription = self.feed.subscribe(Topic::Products);
        Ok(Watch {
            snapshot: self.list(active_only)?,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::infrastructure::memory::MemoryStore;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryStore::new()), ChangeFeed::default())
    }

    fn new_product(price: &str) -> NewProduct {
        NewProduct {
            name: "Acupuntura".to_string(),
            description: "Sessão de acupuntura com especialista".to_string(),
            price: BigDecimal::from_str(price).unwrap(),
            image_url: None,
            category: "Bem-Estar".to_string(),
            active: true,
        }
    }

    #[test]
    fn create_get_update_delete() {
        let svc = service();
        let product = svc.create(new_product("150.00")).unwrap();
        assert_eq!(svc.get(product.id).unwrap(), product);

        let updated = svc
            .update(
                product.id,
                ProductPatch {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.name, "Acupuntura");
        assert!(svc.list(true).unwrap().is_empty());

        svc.delete(product.id).unwrap();
        assert!(matches!(svc.get(product.id), Err(DomainError::NotFound(_))));
        assert!(matches!(svc.delete(product.id), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        let svc = service();
        assert!(matches!(
            svc.create(new_product("0")),
            Err(DomainError::InvalidInput(_))
        ));
        let product = svc.create(new_product("10")).unwrap();
        let patch = ProductPatch {
            price: Some(BigDecimal::from(-5)),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(product.id, patch),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn seeding_only_happens_once() {
        let svc = service();
        let inserted = svc.seed_if_empty().unwrap();
        assert!(inserted > 0);
        assert_eq!(svc.seed_if_empty().unwrap(), 0);
        assert_eq!(svc.list(false).unwrap().len(), inserted);
    }

    #[test]
    fn watch_sees_product_changes() {
        let svc = service();
        let mut watch = svc.watch(false).unwrap();
        assert!(watch.snapshot.is_empty());
        svc.create(new_product("65.00")).unwrap();
        assert!(watch.subscription.has_changed());
    }
}
