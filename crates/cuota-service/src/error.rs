//! # API Error Type
//!
//! Unified error type for installment commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Cuota                                  │
//! │                                                                         │
//! │  Checkout UI                 Service                                    │
//! │  ───────────                 ───────                                    │
//! │                                                                         │
//! │  mark_installment_paid(id)                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage failure? ─── DbError::QueryFailed ──────────┐          │  │
//! │  │         │             (logged, generic message)      │          │  │
//! │  │         ▼                                            ▼          │  │
//! │  │  Rule violation? ─── CoreError::AlreadyPaid ──── ApiError ─────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  e.code    = "ALREADY_PAID"                                             │
//! │  e.message = "Installment 9f2c... is already paid"                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use cuota_core::CoreError;
use cuota_db::DbError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Installment not found: 9f2c..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Plan parameters cannot produce a schedule
    InvalidPlan,

    /// Sale total or down payment out of range
    InvalidAmount,

    /// Plan has been retired
    PlanInactive,

    /// Installment already settled
    AlreadyPaid,

    /// Records claimed by another sale
    LinkingConflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Rejected(core) => core.into(),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Value out of range")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidPlan { .. } => ApiError::new(ErrorCode::InvalidPlan, message),
            CoreError::PlanInactive { .. } => ApiError::new(ErrorCode::PlanInactive, message),
            CoreError::InvalidAmount { .. } => ApiError::new(ErrorCode::InvalidAmount, message),
            CoreError::AlreadyPaid { .. } => ApiError::new(ErrorCode::AlreadyPaid, message),
            CoreError::LinkingConflict { .. } => {
                ApiError::new(ErrorCode::LinkingConflict, message)
            }
            CoreError::ArithmeticInvariant { .. } => {
                tracing::error!("{}", message);
                ApiError::internal("Schedule could not be reconciled")
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Startup Errors
// =============================================================================

/// Errors that stop the service from starting or shutting down cleanly.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Overdue monitor channel closed")]
    ChannelClosed,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cuota_core::{InstallmentStatus, ValidationError};

    #[test]
    fn test_already_paid_maps_to_code() {
        let err: ApiError = DbError::Rejected(CoreError::AlreadyPaid {
            installment_id: "inst-1".into(),
            status: InstallmentStatus::Paid,
        })
        .into();

        assert_eq!(err.code, ErrorCode::AlreadyPaid);
        assert!(err.message.contains("inst-1"));
    }

    #[test]
    fn test_query_failure_hides_details() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_validation_maps_to_validation_code() {
        let err: ApiError = DbError::from(ValidationError::Required {
            field: "customer_id".into(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "customer_id is required");
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::not_found("Installment", "abc");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Installment not found: abc");
    }

    #[test]
    fn test_linking_conflict_code() {
        let err: ApiError = CoreError::LinkingConflict {
            sale_id: "sale-1".into(),
            skipped_ids: vec!["a".into(), "b".into()],
        }
        .into();

        assert_eq!(err.code, ErrorCode::LinkingConflict);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "LINKING_CONFLICT");
    }
}
