//! # Money
//!
//! Amounts are whole cents in an `i64`. Floating point never touches a
//! ledger amount: splitting $80.00 three ways as floats gives three $26.67
//! payments and a cent out of thin air. Here the split is explicit and the
//! last payment takes whatever the others leave:
//!
//! ```text
//! 8000 / 3  → base 2667 (half-up)
//! 2667 × 2  = 5334
//! last      = 8000 - 5334 = 2666
//! ```
//!
//! ```rust
//! use cuota_core::money::Money;
//!
//! let (base, last) = Money::from_cents(10_000).split_evenly(3);
//! assert_eq!((base.cents(), last.cents()), (3333, 3334));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::Rate;

/// An amount in cents.
///
/// Signed so that validation can compute a difference (for example a down
/// payment larger than the sale) before rejecting it. Stored amounts are
/// always positive; the schema enforces that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `round2(amount * percent / 100)`, half-up to the cent. Used for down
    /// payments, interest and tax.
    ///
    /// ```rust
    /// use cuota_core::money::Money;
    /// use cuota_core::types::Rate;
    ///
    /// // 20% of $100.00
    /// assert_eq!(Money::from_cents(10_000).apply_rate(Rate::from_bps(2000)).cents(), 2000);
    /// // 8.25% of $10.00 is 82.5 cents
    /// assert_eq!(Money::from_cents(1000).apply_rate(Rate::from_bps(825)).cents(), 83);
    /// ```
    ///
    /// Rates up to 100% cannot overflow. Above that, use
    /// [`checked_apply_rate`](Money::checked_apply_rate).
    pub fn apply_rate(&self, rate: Rate) -> Money {
        self.checked_apply_rate(rate)
            .unwrap_or(Money(if self.0 < 0 { i64::MIN } else { i64::MAX }))
    }

    /// `apply_rate`, or `None` if the result does not fit in cents.
    pub fn checked_apply_rate(&self, rate: Rate) -> Option<Money> {
        let scaled = i128::from(self.0) * i128::from(rate.bps());
        i64::try_from((scaled + 5000) / 10_000).ok().map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Splits into `parts` payments as `(base, last)`.
    ///
    /// `parts - 1` payments of `base` plus one `last` always sum to `self`.
    /// `base` is the per-part amount rounded half-up; if that would drive
    /// `last` below zero it is truncated instead. Zero parts means one.
    ///
    /// ```rust
    /// use cuota_core::money::Money;
    ///
    /// let (base, last) = Money::from_cents(8000).split_evenly(3);
    /// assert_eq!((base.cents(), last.cents()), (2667, 2666));
    /// ```
    pub fn split_evenly(&self, parts: u32) -> (Money, Money) {
        let n = i128::from(parts.max(1));
        let total = i128::from(self.0);
        let others = n - 1;

        // floor((2a + n) / 2n) is a / n rounded half-up
        let mut base = (2 * total + n).div_euclid(2 * n);
        if total - base * others < 0 {
            base = total.div_euclid(n);
        }

        (Money(base as i64), Money((total - base * others) as i64))
    }
}

/// `$26.67`, `-$5.50`. For logs; `CheckoutConfig::format_currency` renders
/// for customers.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, count: i64) -> Money {
        Money(self.0 * count)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
