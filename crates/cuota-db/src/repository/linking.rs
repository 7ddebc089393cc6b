//! # Linking Repository
//!
//! Attaches unlinked ledger records to a completed sale.
//!
//! ## Claim Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Per-row compare-and-set                            │
//! │                                                                         │
//! │  1. SELECT id ... WHERE <customer|draft> = ? AND sale_id IS NULL       │
//! │       (outside the transaction: candidate list, may go stale)          │
//! │                                                                         │
//! │  2. BEGIN                                                              │
//! │     for each candidate:                                                │
//! │       UPDATE ... SET sale_id = ?, linked_at = ?                        │
//! │       WHERE id = ? AND sale_id IS NULL                                 │
//! │         rows_affected = 1 → linked                                     │
//! │         rows_affected = 0 → skipped (claimed by another sale)          │
//! │     COMMIT                                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement inside the transaction is a write, so SQLite takes
//! the write lock up front and a concurrent linker waits on the busy
//! timeout instead of failing with a stale snapshot. A record is therefore
//! linked to exactly one sale, and repeating a call links nothing new.
//!
//! Keys are trimmed before they are bound, matching how records store them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use cuota_core::validation::{validate_customer_id, validate_reference};
use cuota_core::CoreError;

/// Result of a linking call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub sale_id: String,
    /// Records this call attached to the sale.
    pub linked_ids: Vec<String>,
    /// Candidates another sale claimed first.
    pub skipped_ids: Vec<String>,
}

impl LinkOutcome {
    pub fn linked_count(&self) -> usize {
        self.linked_ids.len()
    }

    /// The skipped records as a conflict, if there were any.
    pub fn conflict(&self) -> Option<CoreError> {
        if self.skipped_ids.is_empty() {
            return None;
        }

        Some(CoreError::LinkingConflict {
            sale_id: self.sale_id.clone(),
            skipped_ids: self.skipped_ids.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Deposits,
    Installments,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Deposits => "deposits",
            Table::Installments => "installments",
        }
    }
}

/// Repository for sale linking.
#[derive(Debug, Clone)]
pub struct LinkingRepository {
    pool: SqlitePool,
}

impl LinkingRepository {
    /// Creates a new LinkingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LinkingRepository { pool }
    }

    /// Links every unlinked record of a customer to `sale_id`.
    pub async fn link_to_sale(&self, customer_id: &str, sale_id: &str) -> DbResult<LinkOutcome> {
        validate_customer_id(customer_id)?;
        validate_reference("sale_id", sale_id)?;
        let (customer_id, sale_id) = (customer_id.trim(), sale_id.trim());

        let candidates = self.candidates("customer_id", customer_id).await?;
        debug!(
            customer_id = %customer_id,
            sale_id = %sale_id,
            candidates = candidates.len(),
            "Linking customer records"
        );

        self.claim(sale_id, candidates).await
    }

    /// Links every unlinked record created by a checkout draft to `sale_id`.
    pub async fn link_draft_to_sale(&self, draft_id: &str, sale_id: &str) -> DbResult<LinkOutcome> {
        validate_reference("draft_id", draft_id)?;
        validate_reference("sale_id", sale_id)?;
        let (draft_id, sale_id) = (draft_id.trim(), sale_id.trim());

        let candidates = self.candidates("draft_id", draft_id).await?;
        debug!(
            draft_id = %draft_id,
            sale_id = %sale_id,
            candidates = candidates.len(),
            "Linking draft records"
        );

        self.claim(sale_id, candidates).await
    }

    async fn candidates(&self, column: &str, key: &str) -> DbResult<Vec<(Table, String)>> {
        let mut candidates = Vec::new();

        for table in [Table::Deposits, Table::Installments] {
            let sql = format!(
                "SELECT id FROM {} WHERE {} = ?1 AND sale_id IS NULL ORDER BY created_at, id",
                table.name(),
                column
            );
            let ids: Vec<String> = sqlx::query_scalar(&sql)
                .bind(key)
                .fetch_all(&self.pool)
                .await?;

            candidates.extend(ids.into_iter().map(|id| (table, id)));
        }

        Ok(candidates)
    }

    async fn claim(&self, sale_id: &str, candidates: Vec<(Table, String)>) -> DbResult<LinkOutcome> {
        let mut outcome = LinkOutcome {
            sale_id: sale_id.to_string(),
            ..Default::default()
        };

        if candidates.is_empty() {
            return Ok(outcome);
        }

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (table, id) in candidates {
            let sql = format!(
                "UPDATE {} SET sale_id = ?1, linked_at = ?2 WHERE id = ?3 AND sale_id IS NULL",
                table.name()
            );
            let result = sqlx::query(&sql)
                .bind(sale_id)
                .bind(now)
                .bind(&id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 1 {
                outcome.linked_ids.push(id);
            } else {
                outcome.skipped_ids.push(id);
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if outcome.skipped_ids.is_empty() {
            info!(
                sale_id = %sale_id,
                linked = outcome.linked_count(),
                "Records linked to sale"
            );
        } else {
            warn!(
                sale_id = %sale_id,
                linked = outcome.linked_count(),
                skipped = ?outcome.skipped_ids,
                "Some records were claimed by another sale"
            );
        }

        Ok(outcome)
    }
}
