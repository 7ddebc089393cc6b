//! # State Module
//!
//! Shared state handed to commands and the overdue monitor.
//!
//! Each command takes only the state it needs:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │   DbState    │  │   ConfigState    │  │      OverdueState        │  │
//! │  │              │  │                  │  │                          │  │
//! │  │  Database    │  │  Arc<Service     │  │  Arc<RwLock<Option<      │  │
//! │  │  (SQLite     │  │    Config>       │  │    OverdueSnapshot>>>    │  │
//! │  │   pool)      │  │  today()         │  │                          │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • ConfigState: Read-only after initialization                         │
//! │  • OverdueState: Written only by the monitor or an explicit refresh    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod overdue;

pub use config::ConfigState;
pub use db::DbState;
pub use overdue::{OverdueSnapshot, OverdueState};
