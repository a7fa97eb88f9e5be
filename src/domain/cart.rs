use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::commission::round_money;
use super::errors::DomainError;
use super::product::Product;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
}

impl CartLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.product.price * BigDecimal::from(self.quantity)
    }
}

/// Shopping cart priced from catalog entries.
///
/// Adding a product that is already in the cart merges the quantities; a line
/// whose quantity drops to zero is removed.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: Product, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "quantity for '{}' must be positive",
                product.name
            )));
        }
        if !product.active {
            return Err(DomainError::InvalidInput(format!(
                "product '{}' is not available",
                product.name
            )));
        }

        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                    DomainError::InvalidInput(format!("quantity for '{}' is too large", product.name))
                })?
            }
            None => self.lines.push(CartLine { product, quantity }),
        }
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i32) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        match self.lines.iter_mut().find(|l| l.product.id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product.id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn total(&self) -> BigDecimal {
        let sum = self
            .lines
            .iter()
            .fold(BigDecimal::zero(), |acc, l| acc + l.subtotal());
        round_money(&sum)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn product(price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Consulta".to_string(),
            description: String::new(),
            price: BigDecimal::from_str(price).unwrap(),
            image_url: None,
            category: "Consulta".to_string(),
            active: true,
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let mut cart = Cart::new();
        cart.add(product("120.00"), 1).unwrap();
        cart.add(product("89.90"), 2).unwrap();
        assert_eq!(cart.total(), BigDecimal::from_str("299.80").unwrap());
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn adding_same_product_merges_lines() {
        let mut cart = Cart::new();
        let p = product("10.00");
        cart.add(p.clone(), 1).unwrap();
        cart.add(p.clone(), 2).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn zero_quantity_removes_line() {
        let mut cart = Cart::new();
        let p = product("10.00");
        cart.add(p.clone(), 1).unwrap();
        assert!(cart.set_quantity(p.id, 0));
        assert!(cart.is_empty());
        assert!(!cart.remove(p.id));
    }

    #[test]
    fn set_quantity_on_missing_product_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.set_quantity(Uuid::new_v4(), 4));
    }

    #[test]
    fn rejects_inactive_products_and_bad_quantities() {
        let mut cart = Cart::new();
        let mut p = product("10.00");
        assert!(cart.add(p.clone(), 0).is_err());
        assert!(cart.add(p.clone(), -2).is_err());
        p.active = false;
        assert!(cart.add(p, 1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add(product("5.00"), 1).unwrap();
        cart.clear();
        assert_eq!(cart.total(), BigDecimal::zero());
    }
}
