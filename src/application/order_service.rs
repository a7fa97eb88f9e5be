use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use log::{info, warn};
use uuid::Uuid;

use super::coupon_service::{CouponCheck, CouponService};
use crate::domain::cart::Cart;
use crate::domain::commission::commission;
use crate::domain::coupon::{CouponCode, CouponRejection};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    offered_code, Checkout, CheckoutLine, CouponOutcome, Customer, ListResult, NewOrder,
    NewOrderLine, OrderStatus, OrderView, PlacedOrder, Redemption,
};
use crate::domain::ports::{OrderRepository, ProductRepository};

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    coupons: Arc<CouponService>,
}

fn check_customer(customer: &Customer) -> Result<(), DomainError> {
    if customer.name.trim().is_empty() {
        return Err(DomainError::InvalidInput("customer name is required".to_string()));
    }
    if !customer.email.contains('@') {
        return Err(DomainError::InvalidInput(format!(
            "invalid customer email '{}'",
            customer.email
        )));
    }
    if customer.phone.trim().is_empty() {
        return Err(DomainError::InvalidInput("customer phone is required".to_string()));
    }
    Ok(())
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        coupons: Arc<CouponService>,
    ) -> Self {
        Self {
            orders,
            products,
            coupons,
        }
    }

    /// Price the requested lines from the catalog. Client-side prices are
    /// never consulted.
    pub fn price_cart(&self, lines: &[CheckoutLine]) -> Result<Cart, DomainError> {
        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let catalog: HashMap<Uuid, _> = self
            .products
            .find_many(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut cart = Cart::new();
        for line in lines {
            let product = catalog.get(&line.product_id).ok_or_else(|| {
                DomainError::InvalidInput(format!("unknown product {}", line.product_id))
            })?;
            cart.add(product.clone(), line.quantity)?;
        }
        Ok(cart)
    }

    /// Checkout.
    ///
    /// An unusable coupon never blocks the order: it is reported in the
    /// returned outcome and the order is stored without commission. When the
    /// coupon is usable, the order insert and the coupon statistics update
    /// commit together or not at all.
    pub fn place_order(&self, checkout: Checkout) -> Result<PlacedOrder, DomainError> {
        check_customer(&checkout.customer)?;
        let cart = self.price_cart(&checkout.lines)?;
        if cart.is_empty() {
            return Err(DomainError::InvalidInput(
                "order must contain at least one item".to_string(),
            ));
        }
        let total = cart.total();

        let offered = checkout
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let (outcome, redemption) = match offered {
            None => (CouponOutcome::NotProvided, None),
            Some(raw) => match self.coupons.resolve(raw)? {
                CouponCheck::Valid { coupon, seller } => {
                    let amount = commission(&total, &seller.commission_rate);
                    (
                        CouponOutcome::Applied {
                            code: coupon.code,
                            seller_id: seller.id,
                            commission: amount.clone(),
                        },
                        Some(Redemption {
                            coupon_id: coupon.id,
                            commission: amount,
                        }),
                    )
                }
                CouponCheck::Invalid(reason) => {
                    warn!("Ignoring coupon '{}' at checkout: {}", raw, reason);
                    (
                        CouponOutcome::Ignored {
                            code: offered_code(raw),
                            reason,
                        },
                        None,
                    )
                }
            },
        };

        // The offered code stays on the order even when it earned nothing.
        let seller_coupon_code = offered.map(offered_code);
        let seller_commission = match &outcome {
            CouponOutcome::Applied { commission, .. } => commission.clone(),
            _ => BigDecimal::zero(),
        };

        let order = NewOrder {
            lines: cart
                .lines()
                .iter()
                .map(|l| NewOrderLine {
                    product_id: l.product.id,
                    product_name: l.product.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.product.price.clone(),
                })
                .collect(),
            total,
            customer: checkout.customer,
            seller_coupon_code,
            seller_commission,
        };

        match self.orders.create(order.clone(), redemption) {
            Ok(view) => {
                if let CouponOutcome::Applied {
                    code, commission, ..
                } = &outcome
                {
                    info!(
                        "Order {} redeemed coupon {} for commission {}",
                        view.id, code, commission
                    );
                } else {
                    info!("Order {} created", view.id);
                }
                Ok(PlacedOrder {
                    order: view,
                    coupon: outcome,
                })
            }
            Err(DomainError::CouponUnavailable) => {
                let code = order.seller_coupon_code.clone().unwrap_or_default();
                warn!(
                    "Coupon {} became unavailable during checkout; storing order without commission",
                    code
                );
                let view = self.orders.create(
                    NewOrder {
                        seller_commission: BigDecimal::zero(),
                        ..order
                    },
                    None,
                )?;
                Ok(PlacedOrder {
                    order: view,
                    coupon: CouponOutcome::Ignored {
                        code,
                        reason: CouponRejection::UnknownOrInactive,
                    },
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, id: Uuid) -> Result<OrderView, DomainError> {
        self.orders
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Order"))
    }

    pub fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.orders.list(page, limit)
    }

    pub fn by_coupon(&self, raw: &str) -> Result<Vec<OrderView>, DomainError> {
        let code = CouponCode::parse(raw)?;
        self.orders.list_by_coupon(&code)
    }

    pub fn by_customer(&self, email: &str) -> Result<Vec<OrderView>, DomainError> {
        self.orders.list_by_customer_email(email.trim())
    }

    pub fn update_status(&self, id: Uuid, to: OrderStatus) -> Result<OrderView, DomainError> {
        let current = self.get(id)?;
        if !current.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: current.status,
                to,
            });
        }
        match self.orders.transition_status(id, current.status, to)? {
            Some(order) => {
                info!("Order {} moved from {} to {}", id, current.status, to);
                Ok(order)
            }
            // Someone else moved it first.
            None => {
                let now = self.get(id)?;
                Err(DomainError::InvalidTransition {
                    from: now.status,
                    to,
                })
            }
        }
    }

    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.orders.delete(id)? {
            return Err(DomainError::NotFound("Order"));
        }
        info!("Deleted order {}", id);
        Ok(())
    }
}
