//! Business-rule errors.
//!
//! [`ValidationError`] covers malformed input; [`CoreError`] covers input
//! that is well formed but breaks an installment rule. The db crate wraps
//! both in `DbError::Rejected` and the service maps each variant to its own
//! wire code, so callers can tell "already paid" from "bad plan".

use thiserror::Error;

use crate::types::InstallmentStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Fewer than one or more than 120 payments, a non-positive interval,
    /// or a down payment above 100%.
    #[error("Invalid installment plan: {reason}")]
    InvalidPlan { reason: String },

    /// Deactivated plans stay readable for old ledgers but cannot start
    /// new schedules.
    #[error("Installment plan {plan_id} is not active")]
    PlanInactive { plan_id: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The settle update matched no pending row. `status` is what the row
    /// holds now, so a double click reports `paid` rather than failing.
    #[error("Installment {installment_id} is already {status}")]
    AlreadyPaid {
        installment_id: String,
        status: InstallmentStatus,
    },

    /// Records another sale claimed first. Reported, never fatal: the sale
    /// stands and the ids go to reconciliation.
    #[error("{} record(s) could not be linked to sale {sale_id}", .skipped_ids.len())]
    LinkingConflict {
        sale_id: String,
        skipped_ids: Vec<String>,
    },

    /// Down payment plus installments did not add up to the total. A bug
    /// in the generator; input cannot cause it.
    #[error("Schedule does not reconcile: expected {expected_cents} cents, got {actual_cents}")]
    ArithmeticInvariant {
        expected_cents: i64,
        actual_cents: i64,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_plan(reason: impl Into<String>) -> Self {
        CoreError::InvalidPlan {
            reason: reason.into(),
        }
    }

    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }
}

/// Checked before anything is written. `field` names the offending input
/// as the caller sent it.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, or blank after trimming.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Ids that are not UUIDs, dates that do not parse.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A record owned by both a sale and a checkout draft.
    #[error("{first} and {second} cannot both be set")]
    MutuallyExclusive { first: String, second: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_violation_messages() {
        let err = CoreError::AlreadyPaid {
            installment_id: "inst-1".to_string(),
            status: InstallmentStatus::Paid,
        };
        assert_eq!(err.to_string(), "Installment inst-1 is already paid");

        let err = CoreError::LinkingConflict {
            sale_id: "sale-9".to_string(),
            skipped_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 record(s) could not be linked to sale sale-9"
        );
    }

    #[test]
    fn test_input_error_messages() {
        let err = ValidationError::Required {
            field: "customer_id".to_string(),
        };
        assert_eq!(err.to_string(), "customer_id is required");

        let err = ValidationError::MutuallyExclusive {
            first: "sale_id".to_string(),
            second: "draft_id".to_string(),
        };
        assert_eq!(err.to_string(), "sale_id and draft_id cannot both be set");
    }

    #[test]
    fn test_input_error_wraps_into_rule_error() {
        let err: CoreError = ValidationError::MustBePositive {
            field: "amount_cents".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(ValidationError::MustBePositive { .. })));
        assert_eq!(err.to_string(), "Validation error: amount_cents must be positive");
    }
}
