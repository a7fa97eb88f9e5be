use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

pub const CODE_LETTERS: usize = 3;
pub const CODE_DIGITS: usize = 3;
pub const CODE_LEN: usize = CODE_LETTERS + CODE_DIGITS;

/// A seller referral code: three uppercase ASCII letters followed by three
/// decimal digits, e.g. `KQZ407`.
///
/// Input is accepted case-insensitively and surrounding whitespace is ignored;
/// the stored form is always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let normalized = input.trim().to_ascii_uppercase();
        let bytes = normalized.as_bytes();
        let well_formed = bytes.len() == CODE_LEN
            && bytes[..CODE_LETTERS].iter().all(u8::is_ascii_uppercase)
            && bytes[CODE_LETTERS..].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(DomainError::InvalidInput(format!(
                "coupon code '{}' must be {} letters followed by {} digits",
                input.trim(),
                CODE_LETTERS,
                CODE_DIGITS
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CouponCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Draw a candidate code. Uniqueness is not checked here.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> CouponCode {
    let mut code = String::with_capacity(CODE_LEN);
    for _ in 0..CODE_LETTERS {
        code.push(char::from(rng.gen_range(b'A'..=b'Z')));
    }
    for _ in 0..CODE_DIGITS {
        code.push(char::from(rng.gen_range(b'0'..=b'9')));
    }
    CouponCode(code)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SellerCoupon {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub code: CouponCode,
    pub is_active: bool,
    pub used_count: i32,
    pub total_commission: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Why a code offered at checkout did not earn a commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    Malformed,
    UnknownOrInactive,
    SellerUnavailable,
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CouponRejection::Malformed => "malformed code",
            CouponRejection::UnknownOrInactive => "unknown or inactive coupon",
            CouponRejection::SellerUnavailable => "seller missing or inactive",
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn generated_codes_are_three_letters_then_three_digits() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let code = generate_code(&mut rng);
            let s = code.as_str();
            assert_eq!(s.len(), 6);
            assert!(s[..3].chars().all(|c| c.is_ascii_uppercase()), "{s}");
            assert!(s[3..].chars().all(|c| c.is_ascii_digit()), "{s}");
        }
    }

    #[test]
    fn generated_codes_are_mostly_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let codes: HashSet<_> = (0..200).map(|_| generate_code(&mut rng)).collect();
        assert_eq!(codes.len(), 200);
    }

    #[test]
    fn generated_code_parses_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = generate_code(&mut rng);
        assert_eq!(CouponCode::parse(code.as_str()).unwrap(), code);
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let code = CouponCode::parse("  abc123 ").unwrap();
        assert_eq!(code.as_str(), "ABC123");
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        for bad in ["", "AB1234", "ABCD12", "ABC12", "ABC1234", "123ABC", "ÀBC123", "AB 123"] {
            assert!(
                matches!(CouponCode::parse(bad), Err(DomainError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn code_serializes_as_plain_string() {
        let code = CouponCode::parse("xyz999").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XYZ999\"");
    }
}
