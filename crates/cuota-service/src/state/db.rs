//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! ```rust,ignore
//! async fn get_by_sale(db: &DbState, sale_id: String) -> Result<Vec<LedgerEntry>, ApiError> {
//!     let records = db.inner().ledger().get_by_sale(&sale_id).await?;
//!     ...
//! }
//! ```

use cuota_db::Database;

/// Wrapper around `Database` for command state.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
