//! # Linking Commands
//!
//! Attaching deposits and installments to the sale they paid for.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open_checkout_draft() ──► draftId                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  record_schedule(owner: Draft(draftId)) ──► deposit + installments      │
//! │       │                                    (sale_id still NULL)         │
//! │       ▼                                                                 │
//! │  Sales completes the sale ──► CompletedSale { id, customerId, total }   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  complete_checkout(sale, draftId)                                       │
//! │       ├── draftId given  → link_draft_to_sale(draftId, sale.id)        │
//! │       └── no draftId     → link_to_sale(sale.customerId, sale.id)      │
//! │                                                                         │
//! │  The sale is already committed. Linking problems are logged and         │
//! │  reported, never returned as errors.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::DbState;
use cuota_core::CompletedSale;
use cuota_db::LinkOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkToSaleResponse {
    pub sale_id: String,
    pub linked_count: usize,
    pub linked_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
}

impl From<LinkOutcome> for LinkToSaleResponse {
    fn from(o: LinkOutcome) -> Self {
        LinkToSaleResponse {
            linked_count: o.linked_count(),
            sale_id: o.sale_id,
            linked_ids: o.linked_ids,
            skipped_ids: o.skipped_ids,
        }
    }
}

/// What happened to the ledger when a sale completed.
///
/// `error` is set when linking failed outright; `skippedIds` lists records
/// another sale claimed first. Both need manual reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLinkReport {
    pub sale_id: String,
    pub draft_id: Option<String>,
    pub linked_count: usize,
    pub skipped_ids: Vec<String>,
    pub error: Option<ApiError>,
}

impl CheckoutLinkReport {
    pub fn needs_reconciliation(&self) -> bool {
        self.error.is_some() || !self.skipped_ids.is_empty()
    }
}

pub async fn link_to_sale(
    db: &DbState,
    customer_id: String,
    sale_id: String,
) -> Result<LinkToSaleResponse, ApiError> {
    debug!(customer_id = %customer_id, sale_id = %sale_id, "link_to_sale command");

    let outcome = db.inner().linking().link_to_sale(&customer_id, &sale_id).await?;
    Ok(outcome.into())
}

/// Starts a checkout session; records created under the returned id are
/// linked together when the sale completes.
pub fn open_checkout_draft() -> String {
    let draft_id = Uuid::new_v4().to_string();
    debug!(draft_id = %draft_id, "Checkout draft opened");
    draft_id
}

/// Links the ledger records of a completed sale. Never fails.
pub async fn complete_checkout(
    db: &DbState,
    sale: CompletedSale,
    draft_id: Option<String>,
) -> CheckoutLinkReport {
    debug!(
        sale_id = %sale.id,
        customer_id = %sale.customer_id,
        draft_id = ?draft_id,
        "complete_checkout command"
    );

    let linking = db.inner().linking();
    let result = match draft_id.as_deref() {
        Some(draft) => linking.link_draft_to_sale(draft, &sale.id).await,
        None => linking.link_to_sale(&sale.customer_id, &sale.id).await,
    };

    match result {
        Ok(outcome) => {
            if let Some(conflict) = outcome.conflict() {
                warn!(sale_id = %sale.id, "{}", conflict);
            } else {
                info!(
                    sale_id = %sale.id,
                    linked = outcome.linked_count(),
                    total_cents = sale.total_cents,
                    "Checkout ledger linked"
                );
            }

            CheckoutLinkReport {
                sale_id: sale.id,
                draft_id,
                linked_count: outcome.linked_count(),
                skipped_ids: outcome.skipped_ids,
                error: None,
            }
        }
        Err(e) => {
            error!(sale_id = %sale.id, error = %e, "Failed to link ledger records to completed sale");

            CheckoutLinkReport {
                sale_id: sale.id,
                draft_id,
                linked_count: 0,
                skipped_ids: Vec::new(),
                error: Some(e.into()),
            }
        }
    }
}
