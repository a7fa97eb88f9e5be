use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};

use super::errors::DomainError;

/// Currency amounts are kept at cent precision.
pub const MONEY_SCALE: i64 = 2;

/// A seller commission rate expressed as a percentage in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionRate(BigDecimal);

impl CommissionRate {
    pub fn new(percent: BigDecimal) -> Result<Self, DomainError> {
        if percent < BigDecimal::zero() || percent > BigDecimal::from(100) {
            return Err(DomainError::InvalidInput(format!(
                "commission rate {} must be between 0 and 100",
                percent
            )));
        }
        Ok(Self(percent))
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl FromStr for CommissionRate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = BigDecimal::from_str(s.trim()).map_err(|e| {
            DomainError::InvalidInput(format!("invalid commission rate '{}': {}", s, e))
        })?;
        Self::new(percent)
    }
}

/// Round a currency amount to cents, half-to-even.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(MONEY_SCALE, RoundingMode::HalfEven)
}

/// `order_total * rate / 100`, rounded to cents.
///
/// The same function prices the checkout preview and the persisted order, so
/// the two can never disagree.
pub fn commission(order_total: &BigDecimal, rate: &CommissionRate) -> BigDecimal {
    round_money(&(order_total * rate.as_decimal() / BigDecimal::from(100)))
}

/// Parse a non-negative currency amount given as a decimal string.
pub fn parse_amount(field: &str, raw: &str) -> Result<BigDecimal, DomainError> {
    let amount = BigDecimal::from_str(raw.trim())
        .map_err(|e| DomainError::InvalidInput(format!("invalid {} '{}': {}", field, raw, e)))?;
    if amount < BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(round_money(&amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn rate(s: &str) -> CommissionRate {
        s.parse().unwrap()
    }

    #[test]
    fn fifteen_percent_of_two_hundred() {
        assert_eq!(commission(&dec("200.00"), &rate("15")), dec("30.00"));
    }

    #[test]
    fn zero_total_or_zero_rate_yields_zero() {
        assert_eq!(commission(&dec("0"), &rate("50")), dec("0"));
        assert_eq!(commission(&dec("100"), &rate("0")), dec("0"));
    }

    #[test]
    fn ten_percent_of_one_fifty() {
        assert_eq!(commission(&dec("150.00"), &rate("10")), dec("15.00"));
    }

    #[test]
    fn result_is_rounded_half_even_to_cents() {
        // 0.125 -> 0.12, 0.135 -> 0.14
        assert_eq!(commission(&dec("1.25"), &rate("10")), dec("0.12"));
        assert_eq!(commission(&dec("1.35"), &rate("10")), dec("0.14"));
        // 89.90 * 12.5% = 11.2375
        assert_eq!(commission(&dec("89.90"), &rate("12.5")), dec("11.24"));
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        assert!(CommissionRate::new(dec("0")).is_ok());
        assert!(CommissionRate::new(dec("100")).is_ok());
        assert!(matches!(
            CommissionRate::new(dec("100.01")),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            CommissionRate::new(dec("-1")),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn rate_rejects_garbage() {
        assert!("fifteen".parse::<CommissionRate>().is_err());
    }

    #[test]
    fn parse_amount_rounds_and_rejects_negatives() {
        assert_eq!(parse_amount("total", " 10.005 ").unwrap(), dec("10.00"));
        assert!(matches!(
            parse_amount("total", "-3"),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(parse_amount("total", "abc").is_err());
    }
}
