//! # Cuota Service
//!
//! Command layer and host process for the installment ledger.
//!
//! ## Module Organization
//! ```text
//! cuota_service/
//! ├── lib.rs          ◄─── You are here (startup, logging)
//! ├── config.rs       ◄─── ServiceConfig: toml file + CUOTA_* env
//! ├── error.rs        ◄─── ApiError for commands, ServiceError for startup
//! ├── overdue.rs      ◄─── OverdueMonitor background task
//! ├── state/
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── config.rs   ◄─── Read-only config + business date
//! │   └── overdue.rs  ◄─── Latest overdue snapshot
//! └── commands/
//!     ├── schedule.rs ◄─── Plans, schedule calculation
//!     ├── ledger.rs   ◄─── Deposits, installments, payments
//!     ├── linking.rs  ◄─── Checkout drafts, sale linking
//!     └── overdue.rs  ◄─── Overdue snapshot
//! ```
//!
//! ## Startup Sequence
//! ```text
//! 1. init_tracing()            RUST_LOG or "info,cuota=debug,sqlx=warn"
//! 2. ServiceConfig::load       defaults → cuota.toml → CUOTA_* → validate
//! 3. open_database()           data dir, WAL, migrations
//! 4. OverdueMonitor::run       spawned when [overdue] enabled = true
//! 5. wait for Ctrl-C           then stop the monitor and close the pool
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod overdue;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use overdue::{OverdueMonitor, OverdueMonitorHandle};
pub use state::{ConfigState, DbState, OverdueSnapshot, OverdueState};

use cuota_db::{Database, DbConfig};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cuota=trace` - Show trace for cuota crates only
/// - Default: INFO, DEBUG for cuota crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cuota=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Opens (creating if needed) the ledger database named by the config.
pub async fn open_database(config: &ServiceConfig) -> ServiceResult<Database> {
    let path = config.database_path();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!(?path, "Opening ledger database");
    let db = Database::new(DbConfig::new(path).max_connections(config.database.max_connections)).await?;
    Ok(db)
}

/// Runs the service until Ctrl-C.
pub async fn serve(config: ServiceConfig) -> ServiceResult<()> {
    let db = DbState::new(open_database(&config).await?);
    let config = ConfigState::new(config);
    let overdue = OverdueState::new();

    let monitor = if config.config().overdue.enabled {
        let (monitor, handle) = OverdueMonitor::new(db.clone(), config.clone(), overdue.clone());
        Some((tokio::spawn(monitor.run()), handle))
    } else {
        info!("Overdue monitor disabled");
        None
    };

    info!("Cuota service ready");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    if let Some((task, handle)) = monitor {
        handle.shutdown().await?;
        if let Err(e) = task.await {
            tracing::error!(?e, "Overdue monitor task failed");
        }
    }

    db.inner().close().await;
    info!("Cuota service stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::default();
        config.database.path = Some(dir.path().join("data").join("cuota.db"));

        let db = open_database(&config).await.unwrap();
        assert!(db.health_check().await);
        assert!(dir.path().join("data").join("cuota.db").exists());

        db.close().await;
    }
}
