//! # Overdue State
//!
//! The latest overdue snapshot, shared between the monitor task and the
//! `overdue_snapshot` command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use cuota_core::OverdueReport;

/// An overdue report and when it was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueSnapshot {
    pub report: OverdueReport,
    pub refreshed_at: DateTime<Utc>,
}

/// Shared slot holding the latest snapshot. Empty until the first scan.
#[derive(Debug, Clone, Default)]
pub struct OverdueState {
    latest: Arc<RwLock<Option<OverdueSnapshot>>>,
}

impl OverdueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the latest snapshot.
    pub async fn latest(&self) -> Option<OverdueSnapshot> {
        self.latest.read().await.clone()
    }

    /// Replaces the latest snapshot.
    pub async fn publish(&self, snapshot: OverdueSnapshot) {
        *self.latest.write().await = Some(snapshot);
    }
}
