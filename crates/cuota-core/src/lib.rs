//! # cuota-core: Pure Installment Logic for Cuota
//!
//! This crate is the **heart** of the installment plan engine. It contains the
//! schedule arithmetic, status derivation and validation rules as pure
//! functions with zero I/O dependencies.
//!
//! ```text
//! checkout UI ──► cuota-service ──► cuota-db ──► SQLite
//!                      │               │
//!                      └──── cuota-core ┘   (no I/O, no clock)
//! ```
//!
//! Callers pass `today` and the [`CheckoutConfig`] in. Nothing in this
//! crate reads the clock or performs I/O.
//!
//! - [`schedule`] turns plan terms and a sale total into a down payment and
//!   dated installments, and previews a whole cart.
//! - [`status`] derives `overdue` and aggregates a customer's ledger.
//! - [`money`] holds amounts as integer cents.
//! - [`validation`] checks input before the db crate writes it.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use cuota_core::money::Money;
//! use cuota_core::schedule::generate_schedule;
//! use cuota_core::types::{PlanTerms, Rate};
//!
//! let terms = PlanTerms::new(Rate::from_bps(2000), 3, 30, Rate::zero());
//! let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//!
//! let schedule = generate_schedule(&terms, Money::from_cents(10_000), None, today).unwrap();
//!
//! assert_eq!(schedule.down_payment_cents, 2000);
//! let amounts: Vec<i64> = schedule.installments.iter().map(|p| p.amount_cents).collect();
//! assert_eq!(amounts, vec![2667, 2667, 2666]);
//! ```

pub mod config;
pub mod error;
pub mod money;
pub mod schedule;
pub mod status;
pub mod types;
pub mod validation;

pub use config::{CheckoutConfig, CheckoutTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use schedule::{generate_schedule, preview_for_cart, CartPreview};
pub use status::{aggregate, effective_status, overdue_report, LedgerSummary, OverdueEntry, OverdueReport};
pub use types::*;

/// 100%, in basis points.
pub const MAX_RATE_BPS: u32 = 10_000;

/// Ten years of monthly payments.
pub const MAX_NUMBER_OF_PAYMENTS: i64 = 120;

pub const MAX_NOTE_LENGTH: usize = 500;
