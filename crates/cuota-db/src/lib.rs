//! # cuota-db: Database Layer for Cuota
//!
//! SQLite persistence for installment plans, deposits and installments.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cuota Data Flow                                  │
//! │                                                                         │
//! │  Service command (create_deposit, link_to_sale, ...)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cuota-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│ PlanRepo       │   │  (embedded)  │   │   │
//! │  │   │  SqlitePool   │    │ LedgerRepo     │   │ 001_ledger   │   │   │
//! │  │   │  WAL, FKs on  │    │ LinkingRepo    │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (cuota.db)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Plan, ledger and linking repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cuota_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cuota.db")).await?;
//!
//! let deposit = db.ledger().create_deposit(&input).await?;
//! let outcome = db.linking().link_draft_to_sale(&draft_id, &sale.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::ledger::{LedgerRepository, RecordedSchedule};
pub use repository::linking::{LinkOutcome, LinkingRepository};
pub use repository::plan::PlanRepository;
