//! Errors from the ledger store.
//!
//! Two sources feed [`DbError`]: SQLite itself, via `From<sqlx::Error>`, and
//! business rules checked before a write, wrapped as [`DbError::Rejected`].
//! The service layer turns both into its wire error; a rejection keeps the
//! original [`CoreError`] so the caller sees e.g. `ALREADY_PAID` rather than
//! a generic database failure.

use cuota_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id. Raised by lookups that take an explicit id,
    /// such as settling an installment or reading a plan.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{field} must be unique, '{value}' is taken")]
    UniqueViolation { field: String, value: String },

    /// An installment names a plan that does not exist.
    #[error("Dangling reference: {message}")]
    ForeignKeyViolation { message: String },

    /// A column CHECK failed: non-positive amount, unknown status, down
    /// payment outside 0..=10000 basis points.
    #[error("Check failed: {message}")]
    CheckViolation { message: String },

    /// Refused before touching the database.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("Cannot open database: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Statement failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed. Nothing from the transaction was written.
    #[error("Transaction aborted: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("No database connection available")]
    PoolExhausted,

    #[error("Unexpected database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the business-rule error, if this is a rejection.
    pub fn as_rejection(&self) -> Option<&CoreError> {
        match self {
            DbError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Rejected(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify_constraint(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".into()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

/// Maps SQLite's constraint messages onto variants; anything else is a
/// plain statement failure.
fn classify_constraint(msg: &str) -> DbError {
    if let Some(column) = msg.strip_prefix("UNIQUE constraint failed: ") {
        return DbError::UniqueViolation {
            field: column.to_string(),
            value: "unknown".to_string(),
        };
    }

    let message = msg.to_string();
    if msg.starts_with("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation { message }
    } else if msg.starts_with("CHECK constraint failed") {
        DbError::CheckViolation { message }
    } else {
        DbError::QueryFailed(message)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
