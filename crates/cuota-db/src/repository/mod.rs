//! # Repository Module
//!
//! Repositories over the installment tables.
//!
//! ```text
//! Service command
//!      │
//!      │  db.ledger().mark_as_paid(id, date)
//!      ▼
//! LedgerRepository ──► SQL (compare-and-set on status) ──► SQLite
//! ```
//!
//! ## Available Repositories
//!
//! - [`plan::PlanRepository`] - Plan template CRUD
//! - [`ledger::LedgerRepository`] - Deposits, installments, payment status
//! - [`linking::LinkingRepository`] - Attaching unlinked records to a sale

pub mod ledger;
pub mod linking;
pub mod plan;
