//! # Commands Module
//!
//! Every operation the checkout UI can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── schedule.rs  ◄─── Plans, schedule calculation and cart previews
//! ├── ledger.rs    ◄─── Deposits, installments, payments, lookups
//! ├── linking.rs   ◄─── Checkout drafts and sale linking
//! └── overdue.rs   ◄─── Overdue snapshot
//! ```
//!
//! ## How Commands Work
//! ```text
//! UI request (camelCase JSON)
//!      │
//!      ▼
//! async fn mark_installment_paid(
//!     db: &DbState,            ◄── Only the state it needs
//!     id: String,
//!     paid_date: NaiveDate,
//! ) -> Result<InstallmentDto, ApiError>
//!      │
//!      ▼
//! UI receives the DTO, or { code, message }
//! ```

pub mod ledger;
pub mod linking;
pub mod overdue;
pub mod schedule;

pub use ledger::{
    create_deposit, create_installment, customer_summary, get_by_customer, get_by_sale,
    mark_installment_paid, mark_installment_prepaid, record_schedule, LedgerEntryDto,
    RecordScheduleRequest,
};
pub use linking::{complete_checkout, link_to_sale, open_checkout_draft, CheckoutLinkReport, LinkToSaleResponse};
pub use overdue::{overdue_snapshot, refresh_overdue};
pub use schedule::{
    calculate_schedule, create_plan, deactivate_plan, list_plans, preview_cart_schedule,
    ScheduleResponse,
};
