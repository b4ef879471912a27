// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Cart totals
//
// Tax is layered over the subtotal by a strategy chosen at startup.

use crate::types::StoreError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Computes the tax owed on a cart subtotal
pub trait PricingStrategy: Send + Sync {
    fn tax(&self, subtotal: Decimal) -> Decimal;

    /// Subtotal plus tax
    fn total(&self, subtotal: Decimal) -> Decimal {
        subtotal.saturating_add(self.tax(subtotal))
    }
}

/// Total equals subtotal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTax;

impl PricingStrategy for NoTax {
    fn tax(&self, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// A single percentage applied to the whole subtotal
#[derive(Debug, Clone, Copy)]
pub struct FlatRateTax {
    rate: Decimal,
}

impl FlatRateTax {
    /// `rate` is a fraction, so 7% is `0.07`
    pub fn new(rate: Decimal) -> Result<Self, StoreError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(StoreError::InvalidConfig(format!(
                "Tax rate must be between 0 and 1, got {}",
                rate
            )));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

impl PricingStrategy for FlatRateTax {
    fn tax(&self, subtotal: Decimal) -> Decimal {
        subtotal * self.rate
    }
}

/// Order summary as shown under the cart list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CartSummary {
    /// Build a summary rounded to cents. Shipping is always free.
    pub fn compute(subtotal: Decimal, strategy: &dyn PricingStrategy) -> Self {
        let tax = round_cents(strategy.tax(subtotal));
        let subtotal = round_cents(subtotal);
        let shipping = Decimal::ZERO;

        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal.saturating_add(tax).saturating_add(shipping),
        }
    }
}

/// Round half away from zero to two decimal places
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tax() {
        let subtotal = Decimal::new(2000, 2);
        assert_eq!(NoTax.total(subtotal), subtotal);
    }

    #[test]
    fn test_flat_rate_tax() {
        let tax = FlatRateTax::new(Decimal::new(7, 2)).unwrap();
        assert_eq!(tax.tax(Decimal::new(100, 0)), Decimal::new(7, 0));
        assert_eq!(tax.total(Decimal::new(100, 0)), Decimal::new(107, 0));
    }

    #[test]
    fn test_flat_rate_bounds() {
        assert!(FlatRateTax::new(Decimal::new(-1, 2)).is_err());
        assert!(FlatRateTax::new(Decimal::new(15, 1)).is_err());
        assert!(FlatRateTax::new(Decimal::ONE).is_ok());
    }

    #[test]
    fn test_summary_rounds_to_cents() {
        let tax = FlatRateTax::new(Decimal::new(7, 2)).unwrap();
        // 9.99 * 0.07 = 0.6993
        let summary = CartSummary::compute(Decimal::new(999, 2), &tax);
        assert_eq!(summary.tax, Decimal::new(70, 2));
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::new(1069, 2));
    }

    #[test]
    fn test_round_cents_midpoint() {
        assert_eq!(round_cents(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_cents(Decimal::new(1015, 3)), Decimal::new(102, 2));
    }
}
