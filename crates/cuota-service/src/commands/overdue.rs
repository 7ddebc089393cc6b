//! # Overdue Commands

use tracing::debug;

use crate::error::ApiError;
use crate::overdue::scan;
use crate::state::{ConfigState, DbState, OverdueSnapshot, OverdueState};

/// Latest snapshot published by the monitor, if a scan has run.
pub async fn overdue_snapshot(overdue: &OverdueState) -> Option<OverdueSnapshot> {
    debug!("overdue_snapshot command");
    overdue.latest().await
}

/// Scans now and publishes the result.
pub async fn refresh_overdue(
    db: &DbState,
    config: &ConfigState,
    overdue: &OverdueState,
) -> Result<OverdueSnapshot, ApiError> {
    debug!("refresh_overdue command");

    let snapshot = scan(db.inner(), config.today()).await?;
    overdue.publish(snapshot.clone()).await;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cuota_core::NewInstallment;
    use cuota_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_refresh_then_snapshot() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let config = ConfigState::default().with_today(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        let overdue = OverdueState::new();

        db.inner()
            .ledger()
            .create_installment(&NewInstallment {
                customer_id: "cust-1".into(),
                amount_cents: 1200,
                due_date: NaiveDate::from_ymd_opt(2026, 2, 1),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(overdue_snapshot(&overdue).await.is_none());

        let refreshed = refresh_overdue(&db, &config, &overdue).await.unwrap();
        assert_eq!(refreshed.report.entries[0].days_overdue, 28);

        let latest = overdue_snapshot(&overdue).await.unwrap();
        assert_eq!(latest, refreshed);

        let json = serde_json::to_value(&latest).unwrap();
        assert!(json.get("refreshedAt").is_some());
    }
}
