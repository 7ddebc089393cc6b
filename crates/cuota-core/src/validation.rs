//! Rules checked before a ledger record or plan is written.
//!
//! The SQLite schema repeats the hard limits as CHECK constraints. These
//! functions run first and name the offending field, which a constraint
//! failure cannot.
//!
//! ## Usage
//! ```rust
//! use cuota_core::validation::{validate_amount_cents, validate_customer_id};
//!
//! assert!(validate_customer_id("cust-42").is_ok());
//! assert!(validate_amount_cents("amount", 0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{NewDeposit, NewInstallment, PlanDraft};
use crate::{MAX_NOTE_LENGTH, MAX_NUMBER_OF_PAYMENTS, MAX_RATE_BPS};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an external identifier (customer, sale, draft).
const MAX_ID_LENGTH: usize = 64;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a customer identifier.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 64 characters
pub fn validate_customer_id(id: &str) -> ValidationResult<()> {
    validate_reference("customer_id", id)
}

/// Validates an external reference id (sale, draft, plan).
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use cuota_core::validation::validate_uuid;
///
/// assert!(validate_uuid("draft_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("draft_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Value Validators
// =============================================================================

/// Validates a ledger amount in cents.
///
/// ## Rules
/// - Must be positive (> 0); zero-value obligations are not recorded
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Unwraps a date that the form must supply.
pub fn validate_required_date(field: &str, date: Option<NaiveDate>) -> ValidationResult<NaiveDate> {
    date.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

/// Validates an optional free-text note.
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    if let Some(note) = note {
        if note.chars().count() > MAX_NOTE_LENGTH {
            return Err(ValidationError::TooLong {
                field: "note".to_string(),
                max: MAX_NOTE_LENGTH,
            });
        }
    }

    Ok(())
}

/// Validates a rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > MAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

/// A record can be tagged with a sale or with a checkout draft, not both.
fn validate_owner(sale_id: Option<&str>, draft_id: Option<&str>) -> ValidationResult<()> {
    match (sale_id, draft_id) {
        (Some(_), Some(_)) => Err(ValidationError::MutuallyExclusive {
            first: "sale_id".to_string(),
            second: "draft_id".to_string(),
        }),
        (Some(sale_id), None) => validate_reference("sale_id", sale_id),
        (None, Some(draft_id)) => validate_reference("draft_id", draft_id),
        (None, None) => Ok(()),
    }
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a new deposit and returns its date.
pub fn validate_new_deposit(input: &NewDeposit) -> ValidationResult<NaiveDate> {
    validate_customer_id(&input.customer_id)?;
    validate_owner(input.sale_id.as_deref(), input.draft_id.as_deref())?;
    validate_amount_cents("amount", input.amount_cents)?;
    validate_note(input.note.as_deref())?;
    validate_required_date("date", input.date)
}

/// Validates a new installment and returns its due date.
pub fn validate_new_installment(input: &NewInstallment) -> ValidationResult<NaiveDate> {
    validate_customer_id(&input.customer_id)?;
    validate_owner(input.sale_id.as_deref(), input.draft_id.as_deref())?;
    validate_amount_cents("amount", input.amount_cents)?;
    validate_note(input.note.as_deref())?;

    if let Some(sequence) = input.sequence {
        if sequence < 1 {
            return Err(ValidationError::MustBePositive {
                field: "sequence".to_string(),
            });
        }
    }

    validate_required_date("due_date", input.due_date)
}

/// Validates a plan template before it is stored.
///
/// ## Rules
/// - Name: 1..=100 characters
/// - Down payment and interest: 0..=100%
/// - Payments: 1..=120
/// - Interval: at least one day
pub fn validate_plan_draft(draft: &PlanDraft) -> ValidationResult<()> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }

    validate_rate_bps("down_payment_bps", draft.down_payment_bps)?;
    validate_rate_bps("interest_rate_bps", draft.interest_rate_bps)?;

    if !(1..=MAX_NUMBER_OF_PAYMENTS).contains(&draft.number_of_payments) {
        return Err(ValidationError::OutOfRange {
            field: "number_of_payments".to_string(),
            min: 1,
            max: MAX_NUMBER_OF_PAYMENTS,
        });
    }

    if draft.interval_days <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "interval_days".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn deposit() -> NewDeposit {
        NewDeposit {
            customer_id: "cust-1".into(),
            amount_cents: 2000,
            date: Some(date()),
            method: PaymentMethod::Cash,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_customer_id() {
        assert!(validate_customer_id("cust-1").is_ok());
        assert!(validate_customer_id("").is_err());
        assert!(validate_customer_id("   ").is_err());
        assert!(validate_customer_id(&"c".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents("amount", 1).is_ok());
        assert!(validate_amount_cents("amount", 0).is_err());
        assert!(validate_amount_cents("amount", -100).is_err());
    }

    #[test]
    fn test_validate_new_deposit() {
        assert_eq!(validate_new_deposit(&deposit()).unwrap(), date());

        let missing_date = NewDeposit {
            date: None,
            ..deposit()
        };
        assert!(matches!(
            validate_new_deposit(&missing_date),
            Err(ValidationError::Required { field }) if field == "date"
        ));

        let both_owners = NewDeposit {
            sale_id: Some("sale-1".into()),
            draft_id: Some("draft-1".into()),
            ..deposit()
        };
        assert!(matches!(
            validate_new_deposit(&both_owners),
            Err(ValidationError::MutuallyExclusive { .. })
        ));
    }

    #[test]
    fn test_validate_new_installment() {
        let input = NewInstallment {
            customer_id: "cust-1".into(),
            amount_cents: 2667,
            due_date: Some(date()),
            sequence: Some(1),
            ..Default::default()
        };
        assert!(validate_new_installment(&input).is_ok());

        let no_due_date = NewInstallment {
            due_date: None,
            ..input.clone()
        };
        assert!(validate_new_installment(&no_due_date).is_err());

        let bad_sequence = NewInstallment {
            sequence: Some(0),
            ..input
        };
        assert!(validate_new_installment(&bad_sequence).is_err());
    }

    #[test]
    fn test_validate_note() {
        assert!(validate_note(None).is_ok());
        assert!(validate_note(Some("layaway for blue sofa")).is_ok());
        assert!(validate_note(Some(&"x".repeat(MAX_NOTE_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_validate_plan_draft() {
        let draft = PlanDraft {
            name: "3 x 30 days".into(),
            down_payment_bps: 2000,
            number_of_payments: 3,
            interval_days: 30,
            interest_rate_bps: 0,
            is_active: true,
        };
        assert!(validate_plan_draft(&draft).is_ok());

        assert!(validate_plan_draft(&PlanDraft { number_of_payments: 0, ..draft.clone() }).is_err());
        assert!(validate_plan_draft(&PlanDraft { interval_days: 0, ..draft.clone() }).is_err());
        assert!(validate_plan_draft(&PlanDraft { down_payment_bps: 10_001, ..draft.clone() }).is_err());
        assert!(validate_plan_draft(&PlanDraft { name: " ".into(), ..draft }).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
