//! Value objects: equality by value, not identity.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// instances with the same values are the same value. Contrast with
/// [`Entity`](crate::Entity), which has identity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Fractional digits kept for every stored quantity (`DECIMAL(10, 2)`).
pub const DECIMAL_PLACES: u32 = 2;

/// Total significant digits allowed for a stored quantity.
pub const MAX_DIGITS: u32 = 10;

/// A non-negative decimal amount with fixed two-digit scale.
///
/// Used both for stock balances and for consumed amounts. Construction
/// rejects values that do not fit `DECIMAL(10, 2)` instead of rounding them.
/// Serializes as a string with exactly two fractional digits (`"40.00"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl ValueObject for Quantity {}

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// A balance-like quantity: zero or more.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        let value = check_precision("quantity", value)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self(value))
    }

    /// An amount-like quantity: strictly greater than zero.
    pub fn positive(field: &str, value: Decimal) -> DomainResult<Self> {
        let value = check_precision(field, value)?;
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(format!("{field} must be greater than zero")));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self - other`, or `None` if the result would be negative.
    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        let result = self.0 - other.0;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Quantity(result))
        }
    }

    /// Apply a signed delta, rejecting negative or out-of-range results.
    pub fn apply_delta(self, delta: Decimal) -> DomainResult<Quantity> {
        let delta = check_precision("delta", delta)?;
        let result = self
            .0
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        if result < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "adjustment of {delta} would leave a negative balance (current {self})"
            )));
        }
        Quantity::new(result)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Validate that `value` fits `DECIMAL(MAX_DIGITS, DECIMAL_PLACES)` and return it
/// rescaled to exactly `DECIMAL_PLACES` fractional digits.
pub fn check_precision(field: &str, value: Decimal) -> DomainResult<Decimal> {
    let normalized = value.normalize();
    if normalized.scale() > DECIMAL_PLACES {
        return Err(DomainError::validation(format!(
            "{field}: ensure that there are no more than {DECIMAL_PLACES} decimal places"
        )));
    }

    let whole_digits = MAX_DIGITS - DECIMAL_PLACES;
    let limit = Decimal::from(10_i64.pow(whole_digits));
    if normalized.trunc().abs() >= limit {
        return Err(DomainError::validation(format!(
            "{field}: ensure that there are no more than {whole_digits} digits before the decimal point"
        )));
    }

    let mut rescaled = normalized;
    rescaled.rescale(DECIMAL_PLACES);
    Ok(rescaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rescales_to_two_places() {
        let q = Quantity::new(dec!(40)).unwrap();
        assert_eq!(q.to_string(), "40.00");
        let q = Quantity::new(dec!(12.5000)).unwrap();
        assert_eq!(q.to_string(), "12.50");
    }

    #[test]
    fn rejects_excess_precision_and_magnitude() {
        assert!(matches!(Quantity::new(dec!(0.001)), Err(DomainError::Validation(m)) if m.contains("decimal places")));
        assert!(matches!(Quantity::new(dec!(100000000)), Err(DomainError::Validation(m)) if m.contains("digits before")));
        assert!(Quantity::new(dec!(99999999.99)).is_ok());
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(Quantity::positive("amount_used", dec!(0)).is_err());
        assert!(Quantity::positive("amount_used", dec!(-1.5)).is_err());
        assert!(Quantity::positive("amount_used", dec!(0.01)).is_ok());
    }

    #[test]
    fn new_rejects_negative_balance() {
        assert!(Quantity::new(dec!(-0.01)).is_err());
        assert!(Quantity::new(dec!(0)).unwrap().is_zero());
    }

    #[test]
    fn apply_delta_floors_at_zero() {
        let q = Quantity::new(dec!(10)).unwrap();
        assert_eq!(q.apply_delta(dec!(-10)).unwrap(), Quantity::ZERO);
        assert!(q.apply_delta(dec!(-10.01)).is_err());
        assert_eq!(q.apply_delta(dec!(2.5)).unwrap().to_string(), "12.50");
    }

    #[test]
    fn serializes_as_fixed_point_string() {
        let q = Quantity::new(dec!(7.1)).unwrap();
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"7.10\"");
    }

    proptest! {
        #[test]
        fn checked_sub_never_goes_negative(a in 0i64..1_000_000_000, b in 0i64..1_000_000_000) {
            let qa = Quantity::new(Decimal::new(a, 2)).unwrap();
            let qb = Quantity::new(Decimal::new(b, 2)).unwrap();
            match qa.checked_sub(qb) {
                Some(r) => {
                    prop_assert!(b <= a);
                    prop_assert_eq!(r.value(), Decimal::new(a - b, 2));
                }
                None => prop_assert!(b > a),
            }
        }
    }
}
