//! # Overdue Monitor
//!
//! Periodically scans pending installments past their due date and publishes
//! an [`OverdueSnapshot`] for the UI.
//!
//! ## Monitor Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   interval.tick() ──► overdue_installments(today)                       │
//! │        ▲                       │                                        │
//! │        │                       ▼                                        │
//! │        │              overdue_report(rows, today)                       │
//! │        │                       │                                        │
//! │        │                       ▼                                        │
//! │        └──────────── OverdueState::publish(snapshot)                    │
//! │                                                                         │
//! │   shutdown_rx.recv() ──► break                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The monitor only reads the ledger. Stored installment status is never
//! changed to "overdue"; that state exists only in the snapshot.

use chrono::{NaiveDate, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{ServiceError, ServiceResult};
use crate::state::{ConfigState, DbState, OverdueSnapshot, OverdueState};
use cuota_core::overdue_report;
use cuota_db::{Database, DbResult};

/// Scans the ledger once and returns a fresh snapshot.
pub async fn scan(db: &Database, today: NaiveDate) -> DbResult<OverdueSnapshot> {
    let installments = db.ledger().overdue_installments(today).await?;
    let report = overdue_report(&installments, today);

    debug!(
        as_of = %today,
        overdue = report.len(),
        total_cents = report.total_overdue_cents,
        "Overdue scan complete"
    );

    Ok(OverdueSnapshot {
        report,
        refreshed_at: Utc::now(),
    })
}

/// Background task that keeps [`OverdueState`] current.
pub struct OverdueMonitor {
    db: DbState,
    config: ConfigState,
    state: OverdueState,
    period: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the monitor.
#[derive(Clone)]
pub struct OverdueMonitorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl OverdueMonitorHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> ServiceResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| ServiceError::ChannelClosed)
    }
}

impl OverdueMonitor {
    /// Creates a monitor using the configured scan interval.
    pub fn new(
        db: DbState,
        config: ConfigState,
        state: OverdueState,
    ) -> (Self, OverdueMonitorHandle) {
        let period = Duration::from_secs(config.config().overdue.interval_secs.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let monitor = OverdueMonitor {
            db,
            config,
            state,
            period,
            shutdown_rx,
        };

        (monitor, OverdueMonitorHandle { shutdown_tx })
    }

    /// Runs until shutdown. The first scan happens immediately.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(period_secs = self.period.as_secs(), "Overdue monitor starting");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.refresh().await {
                        error!(?e, "Failed to refresh overdue snapshot");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Overdue monitor shutting down");
                    break;
                }
            }
        }

        info!("Overdue monitor stopped");
    }

    async fn refresh(&self) -> DbResult<()> {
        let snapshot = scan(self.db.inner(), self.config.today()).await?;
        self.state.publish(snapshot).await;
        Ok(())
    }
}
