//! # Checkout Configuration
//!
//! Store-level settings that affect checkout totals.
//!
//! Callers construct a [`CheckoutConfig`] once (from file/env in the service
//! layer) and pass it into every operation that needs it. Nothing in this
//! crate looks configuration up on its own.
//!
//! ```text
//! cart subtotal ──► discount (capped) ──► tax ──► sale total ──► schedule
//!                   max_discount_bps      tax_rate / tax_mode
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Rate, TaxMode};
use crate::validation::{validate_rate_bps, ValidationResult};

/// More decimals than this cannot be formatted from `i64` cents.
pub const MAX_CURRENCY_DECIMALS: u8 = 18;

/// Checkout settings passed explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Sales tax applied to the discounted subtotal.
    pub tax_rate: Rate,

    /// Whether prices already include tax.
    pub tax_mode: TaxMode,

    /// Largest discount a cashier may apply, in basis points.
    pub max_discount_bps: u32,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,
}

impl Default for CheckoutConfig {
    /// - Tax: 8.25% exclusive
    /// - Discount cap: 20%
    /// - Currency: USD ($)
    fn default() -> Self {
        CheckoutConfig {
            tax_rate: Rate::from_bps(825),
            tax_mode: TaxMode::Exclusive,
            max_discount_bps: 2000,
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

/// Totals of a cart at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    /// Discount actually applied (after the cap).
    pub discount: Money,
    pub tax: Money,
    /// What the customer owes; the input to the schedule generator.
    pub total: Money,
}

impl CheckoutConfig {
    /// Checks rates are within 0..=100% and decimals within 0..=18.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_rate_bps("tax_rate", self.tax_rate.bps())?;
        validate_rate_bps("max_discount_bps", self.max_discount_bps)?;
        if self.currency_decimals > MAX_CURRENCY_DECIMALS {
            return Err(ValidationError::OutOfRange {
                field: "currency_decimals".to_string(),
                min: 0,
                max: i64::from(MAX_CURRENCY_DECIMALS),
            });
        }
        Ok(())
    }

    /// Computes checkout totals for a cart subtotal.
    ///
    /// The requested discount is silently capped at `max_discount_bps`.
    /// Fails with `InvalidAmount` if the taxed total does not fit in cents.
    ///
    /// ## Example
    /// ```rust
    /// use cuota_core::config::CheckoutConfig;
    /// use cuota_core::money::Money;
    ///
    /// let config = CheckoutConfig::default(); // 8.25% exclusive, 20% cap
    /// let totals = config.checkout_totals(Money::from_cents(10_000), 5000).unwrap();
    ///
    /// assert_eq!(totals.discount.cents(), 2000); // capped at 20%
    /// assert_eq!(totals.tax.cents(), 660);       // 8.25% of $80.00
    /// assert_eq!(totals.total.cents(), 8660);
    /// ```
    pub fn checkout_totals(
        &self,
        subtotal: Money,
        requested_discount_bps: u32,
    ) -> CoreResult<CheckoutTotals> {
        let too_large = || CoreError::invalid_amount("cart total is too large");

        let discount_bps = requested_discount_bps.min(self.max_discount_bps);
        let discount = subtotal
            .checked_apply_rate(Rate::from_bps(discount_bps))
            .ok_or_else(too_large)?;
        let discounted = subtotal - discount;

        let (tax, total) = match self.tax_mode {
            TaxMode::Exclusive => {
                let tax = discounted
                    .checked_apply_rate(self.tax_rate)
                    .ok_or_else(too_large)?;
                (tax, discounted.checked_add(tax).ok_or_else(too_large)?)
            }
            TaxMode::Inclusive => {
                // tax = gross × rate / (1 + rate), rounded half-up
                let bps = i128::from(self.tax_rate.bps());
                let gross = i128::from(discounted.cents());
                let tax = (2 * gross * bps + 10_000 + bps) / (2 * (10_000 + bps));
                let tax = i64::try_from(tax).map_err(|_| too_large())?;
                (Money::from_cents(tax), discounted)
            }
        };

        Ok(CheckoutTotals {
            subtotal,
            discount,
            tax,
            total,
        })
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use cuota_core::config::CheckoutConfig;
    ///
    /// let config = CheckoutConfig::default();
    /// assert_eq!(config.format_currency(2667), "$26.67");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let decimals = self.currency_decimals.min(MAX_CURRENCY_DECIMALS);
        let divisor = 10_i64.pow(u32::from(decimals));
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_tax_totals() {
        let config = CheckoutConfig::default();
        let totals = config.checkout_totals(Money::from_cents(1000), 0).unwrap();
        assert_eq!(totals.discount.cents(), 0);
        assert_eq!(totals.tax.cents(), 83);
        assert_eq!(totals.total.cents(), 1083);
    }

    #[test]
    fn test_inclusive_tax_totals() {
        let config = CheckoutConfig {
            tax_rate: Rate::from_bps(2000),
            tax_mode: TaxMode::Inclusive,
            ..Default::default()
        };
        // $12.00 gross at 20% inclusive = $2.00 tax
        let totals = config.checkout_totals(Money::from_cents(1200), 0).unwrap();
        assert_eq!(totals.tax.cents(), 200);
        assert_eq!(totals.total.cents(), 1200);
    }

    #[test]
    fn test_discount_is_capped() {
        let config = CheckoutConfig {
            tax_rate: Rate::zero(),
            max_discount_bps: 1000,
            ..Default::default()
        };
        let totals = config.checkout_totals(Money::from_cents(10_000), 9000).unwrap();
        assert_eq!(totals.discount.cents(), 1000);
        assert_eq!(totals.total.cents(), 9000);
    }

    #[test]
    fn test_validate_rejects_rates_above_hundred_percent() {
        let config = CheckoutConfig {
            max_discount_bps: 10_001,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(CheckoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_exclusive_tax_overflow_is_an_error() {
        let config = CheckoutConfig::default();
        assert!(matches!(
            config.checkout_totals(Money::from_cents(i64::MAX - 10), 0),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_bounds_currency_decimals() {
        let config = CheckoutConfig {
            currency_decimals: 19,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { ref field, max: 18, .. }) if field == "currency_decimals"
        ));

        // Unvalidated configs still format instead of panicking
        assert_eq!(config.format_currency(5), "$0.000000000000000005");
    }

    #[test]
    fn test_format_currency() {
        let config = CheckoutConfig::default();
        assert_eq!(config.format_currency(1234), "$12.34");
        assert_eq!(config.format_currency(1), "$0.01");
        assert_eq!(config.format_currency(-1234), "-$12.34");
    }
}
