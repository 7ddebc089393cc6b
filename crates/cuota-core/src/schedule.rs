//! # Schedule Generator
//!
//! Turns plan terms and a sale total into a concrete payment schedule.
//!
//! ## Calculation Flow
//! ```text
//! sale total ──► down payment = custom ?? round(total × down%)
//!                    │
//!                    ▼
//!               financed = total - down
//!               interest = round(financed × rate%)
//!                    │
//!                    ▼
//!               to split = financed + interest
//!               payments 1..N-1 = to split / N (nearest cent)
//!               payment N       = to split - base × (N-1)
//!                    │
//!                    ▼
//!               due[i] = today + interval × i
//! ```
//!
//! Everything here is pure. `today` is an argument, never read from a clock.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::{CheckoutConfig, CheckoutTotals};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentSchedule, PlanTerms, ScheduledPayment};
use crate::{MAX_NUMBER_OF_PAYMENTS, MAX_RATE_BPS};

/// A schedule preview for a cart that has not been checked out yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartPreview {
    pub totals: CheckoutTotals,
    pub schedule: PaymentSchedule,
}

/// Generates the payment schedule for a sale.
///
/// ## Arguments
/// * `terms` - Frozen plan parameters
/// * `sale_total` - Amount owed for the sale (must be positive)
/// * `custom_down_payment` - Overrides the plan's down payment percentage
/// * `today` - Date the schedule starts from
///
/// ## Errors
/// - `InvalidPlan` for a payment count outside 1..=120, a non-positive
///   interval, or a down payment or interest rate above 100%
/// - `InvalidAmount` for a non-positive total, an out-of-range custom down
///   payment, or a total too large to finance in cents
/// - `ArithmeticInvariant` if the result does not reconcile
pub fn generate_schedule(
    terms: &PlanTerms,
    sale_total: Money,
    custom_down_payment: Option<Money>,
    today: NaiveDate,
) -> CoreResult<PaymentSchedule> {
    validate_terms(terms)?;

    if !sale_total.is_positive() {
        return Err(CoreError::invalid_amount("sale total must be positive"));
    }

    let down_payment = match custom_down_payment {
        Some(down) if down.is_negative() => {
            return Err(CoreError::invalid_amount("down payment cannot be negative"));
        }
        Some(down) if down > sale_total => {
            return Err(CoreError::invalid_amount(format!(
                "down payment {} exceeds sale total {}",
                down, sale_total
            )));
        }
        Some(down) => down,
        None => sale_total.apply_rate(terms.down_payment),
    };

    let financed = sale_total - down_payment;
    let interest = financed
        .checked_apply_rate(terms.interest_rate)
        .ok_or_else(too_large)?;
    let to_split = financed.checked_add(interest).ok_or_else(too_large)?;
    let total_amount = sale_total.checked_add(interest).ok_or_else(too_large)?;

    let count = terms.number_of_payments as u32;
    let (base, last) = to_split.split_evenly(count);

    let mut installments = Vec::with_capacity(count as usize);
    for sequence in 1..=terms.number_of_payments {
        let amount = if sequence == terms.number_of_payments {
            last
        } else {
            base
        };
        installments.push(ScheduledPayment {
            sequence,
            amount_cents: amount.cents(),
            due_date: due_date(today, terms.interval_days, sequence)?,
        });
    }

    let schedule = PaymentSchedule {
        terms: terms.clone(),
        sale_total_cents: sale_total.cents(),
        down_payment_cents: down_payment.cents(),
        financed_cents: financed.cents(),
        interest_cents: interest.cents(),
        installments,
        total_amount_cents: total_amount.cents(),
    };

    let actual = down_payment + schedule.installments_total();
    if !schedule.is_balanced() {
        return Err(CoreError::ArithmeticInvariant {
            expected_cents: schedule.total_amount_cents,
            actual_cents: actual.cents(),
        });
    }

    Ok(schedule)
}

/// Computes checkout totals for a cart and the schedule for that total.
///
/// The discount is capped and tax applied according to `config`; the
/// resulting sale total is what gets financed.
pub fn preview_for_cart(
    terms: &PlanTerms,
    subtotal: Money,
    discount_bps: u32,
    config: &CheckoutConfig,
    today: NaiveDate,
) -> CoreResult<CartPreview> {
    let totals = config.checkout_totals(subtotal, discount_bps)?;
    let schedule = generate_schedule(terms, totals.total, None, today)?;
    Ok(CartPreview { totals, schedule })
}

fn validate_terms(terms: &PlanTerms) -> CoreResult<()> {
    if terms.number_of_payments < 1 {
        return Err(CoreError::invalid_plan("number of payments must be at least 1"));
    }
    if terms.number_of_payments > MAX_NUMBER_OF_PAYMENTS {
        return Err(CoreError::invalid_plan(format!(
            "number of payments cannot exceed {}",
            MAX_NUMBER_OF_PAYMENTS
        )));
    }
    if terms.interval_days <= 0 {
        return Err(CoreError::invalid_plan("interval must be at least one day"));
    }
    if terms.down_payment.bps() > MAX_RATE_BPS {
        return Err(CoreError::invalid_plan("down payment cannot exceed 100%"));
    }
    if terms.interest_rate.bps() > MAX_RATE_BPS {
        return Err(CoreError::invalid_plan("interest rate cannot exceed 100%"));
    }
    Ok(())
}

fn too_large() -> CoreError {
    CoreError::invalid_amount("sale total is too large to finance")
}

fn due_date(today: NaiveDate, interval_days: i64, sequence: i64) -> CoreResult<NaiveDate> {
    interval_days
        .checked_mul(sequence)
        .and_then(|days| today.checked_add_days(Days::new(days as u64)))
        .ok_or_else(|| CoreError::invalid_plan("due date out of range"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rate, TaxMode};
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn three_by_thirty(interest_bps: u32) -> PlanTerms {
        PlanTerms::new(Rate::from_bps(2000), 3, 30, Rate::from_bps(interest_bps))
    }

    fn amounts(schedule: &PaymentSchedule) -> Vec<i64> {
        schedule.installments.iter().map(|p| p.amount_cents).collect()
    }

    #[test]
    fn test_three_payments_without_interest() {
        let schedule =
            generate_schedule(&three_by_thirty(0), Money::from_cents(10_000), None, today())
                .unwrap();

        assert_eq!(schedule.down_payment_cents, 2000);
        assert_eq!(schedule.financed_cents, 8000);
        assert_eq!(schedule.interest_cents, 0);
        assert_eq!(amounts(&schedule), vec![2667, 2667, 2666]);
        assert_eq!(schedule.total_amount_cents, 10_000);
        assert!(schedule.is_balanced());
    }

    #[test]
    fn test_due_dates_step_by_interval() {
        let schedule =
            generate_schedule(&three_by_thirty(0), Money::from_cents(10_000), None, today())
                .unwrap();

        let dates: Vec<NaiveDate> = schedule.installments.iter().map(|p| p.due_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            ]
        );
        let sequences: Vec<i64> = schedule.installments.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_interest_on_financed_amount() {
        let schedule =
            generate_schedule(&three_by_thirty(1000), Money::from_cents(10_000), None, today())
                .unwrap();

        assert_eq!(schedule.financed_cents, 8000);
        assert_eq!(schedule.interest_cents, 800);
        assert_eq!(schedule.installments_total().cents(), 8800);
        assert_eq!(schedule.total_amount_cents, 10_800);
        assert!(schedule.is_balanced());
    }

    #[test]
    fn test_custom_down_payment_overrides_plan() {
        let schedule = generate_schedule(
            &three_by_thirty(0),
            Money::from_cents(10_000),
            Some(Money::from_cents(4000)),
            today(),
        )
        .unwrap();

        assert_eq!(schedule.down_payment_cents, 4000);
        assert_eq!(amounts(&schedule), vec![2000, 2000, 2000]);
    }

    #[test]
    fn test_full_down_payment_leaves_zero_installments() {
        let schedule = generate_schedule(
            &three_by_thirty(0),
            Money::from_cents(10_000),
            Some(Money::from_cents(10_000)),
            today(),
        )
        .unwrap();

        assert_eq!(amounts(&schedule), vec![0, 0, 0]);
        assert!(schedule.is_balanced());
    }

    #[test]
    fn test_invalid_plans_are_rejected() {
        let total = Money::from_cents(10_000);

        let no_payments = PlanTerms::new(Rate::from_bps(2000), 0, 30, Rate::zero());
        assert!(matches!(
            generate_schedule(&no_payments, total, None, today()),
            Err(CoreError::InvalidPlan { .. })
        ));

        let no_interval = PlanTerms::new(Rate::from_bps(2000), 3, 0, Rate::zero());
        assert!(matches!(
            generate_schedule(&no_interval, total, None, today()),
            Err(CoreError::InvalidPlan { .. })
        ));

        let too_much_down = PlanTerms::new(Rate::from_bps(10_001), 3, 30, Rate::zero());
        assert!(matches!(
            generate_schedule(&too_much_down, total, None, today()),
            Err(CoreError::InvalidPlan { .. })
        ));

        let too_much_interest = PlanTerms::new(Rate::from_bps(2000), 3, 30, Rate::from_bps(10_001));
        assert!(matches!(
            generate_schedule(&too_much_interest, total, None, today()),
            Err(CoreError::InvalidPlan { .. })
        ));
    }

    #[test]
    fn test_invalid_amounts_are_rejected() {
        let terms = three_by_thirty(0);

        assert!(matches!(
            generate_schedule(&terms, Money::zero(), None, today()),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            generate_schedule(&terms, Money::from_cents(1000), Some(Money::from_cents(-1)), today()),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            generate_schedule(&terms, Money::from_cents(1000), Some(Money::from_cents(1001)), today()),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_total_that_overflows_with_interest_is_rejected() {
        let terms = PlanTerms::new(Rate::zero(), 3, 30, Rate::from_bps(1000));

        assert!(matches!(
            generate_schedule(&terms, Money::from_cents(i64::MAX - 10), None, today()),
            Err(CoreError::InvalidAmount { .. })
        ));

        // No interest: the largest total still splits and reconciles
        let interest_free = PlanTerms::new(Rate::zero(), 3, 30, Rate::zero());
        let schedule =
            generate_schedule(&interest_free, Money::from_cents(i64::MAX), None, today()).unwrap();
        assert_eq!(schedule.total_amount_cents, i64::MAX);
        assert!(schedule.is_balanced());
    }

    #[test]
    fn test_plan_id_is_carried_into_schedule() {
        let mut terms = three_by_thirty(0);
        terms.plan_id = Some("plan-1".into());

        let schedule = generate_schedule(&terms, Money::from_cents(500), None, today()).unwrap();
        assert_eq!(schedule.terms.plan_id.as_deref(), Some("plan-1"));
    }

    #[test]
    fn test_preview_for_cart_applies_discount_and_tax() {
        let config = CheckoutConfig {
            tax_rate: Rate::from_bps(1000),
            tax_mode: TaxMode::Exclusive,
            max_discount_bps: 5000,
            ..Default::default()
        };

        // $100 - 10% = $90, + 10% tax = $99
        let preview = preview_for_cart(
            &three_by_thirty(0),
            Money::from_cents(10_000),
            1000,
            &config,
            today(),
        )
        .unwrap();

        assert_eq!(preview.totals.total.cents(), 9900);
        assert_eq!(preview.schedule.sale_total_cents, 9900);
        assert_eq!(preview.schedule.down_payment_cents, 1980);
        assert!(preview.schedule.is_balanced());
    }

    proptest! {
        #[test]
        fn prop_schedule_always_reconciles(
            total in 1i64..100_000_000,
            down_bps in 0u32..=10_000,
            payments in 1i64..=120,
            interval in 1i64..=365,
            interest_bps in 0u32..=5_000,
        ) {
            let terms = PlanTerms::new(
                Rate::from_bps(down_bps),
                payments,
                interval,
                Rate::from_bps(interest_bps),
            );
            let schedule = generate_schedule(&terms, Money::from_cents(total), None, today()).unwrap();

            prop_assert_eq!(schedule.installments.len() as i64, payments);
            prop_assert!(schedule.installments.iter().all(|p| p.amount_cents >= 0));
            prop_assert_eq!(
                schedule.down_payment_cents + schedule.installments_total().cents(),
                schedule.total_amount_cents
            );
            if interest_bps == 0 {
                prop_assert_eq!(schedule.total_amount_cents, total);
            }
        }
    }
}
