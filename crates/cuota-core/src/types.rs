//! # Domain Types
//!
//! Core domain types of the installment plan engine.
//!
//! ```text
//! InstallmentPlan ──terms()──► PlanTerms ──generate──► PaymentSchedule
//!   (template)                  (frozen)                down + N payments
//!                                                             │
//!                                                         recorded as
//!                                                             ▼
//!                                               Deposit + Installment × N
//!                                               status: pending → paid | prepaid
//!                                               overdue: derived, never stored
//! ```
//!
//! ## Ownership of Ledger Records
//! A record belongs to a customer from the start. It may additionally carry
//! a checkout `draft_id` (the checkout session that created it) and, once the
//! sale exists, a `sale_id`. `sale_id` is written exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage in basis points: 2000 is a 20% down payment, 825 is 8.25%
/// tax. Whole bps keep `apply_rate` in integer math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }
}

// =============================================================================
// Installment Plan
// =============================================================================

/// A reusable template describing how a sale splits into a down payment and
/// N future payments.
///
/// Editing a plan never touches ledger records created from it: schedules
/// copy its [`PlanTerms`] at generation time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InstallmentPlan {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the plan picker ("3 × 30 days").
    pub name: String,

    /// Down payment in basis points of the sale total (0..=10000).
    pub down_payment_bps: u32,

    /// Number of future installments (≥ 1).
    pub number_of_payments: i64,

    /// Days between installments (> 0).
    pub interval_days: i64,

    /// Interest on the financed amount in basis points (≥ 0).
    pub interest_rate_bps: u32,

    /// Whether the plan can be offered at checkout.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InstallmentPlan {
    /// Returns a frozen copy of this plan's parameters.
    pub fn terms(&self) -> PlanTerms {
        PlanTerms {
            plan_id: Some(self.id.clone()),
            down_payment: Rate::from_bps(self.down_payment_bps),
            number_of_payments: self.number_of_payments,
            interval_days: self.interval_days,
            interest_rate: Rate::from_bps(self.interest_rate_bps),
        }
    }
}

/// Input for creating or editing a plan template.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanDraft {
    pub name: String,
    pub down_payment_bps: u32,
    pub number_of_payments: i64,
    pub interval_days: i64,
    pub interest_rate_bps: u32,
    pub is_active: bool,
}

/// The parameter set a schedule was generated from.
///
/// Copied into every [`PaymentSchedule`] so later plan edits cannot change
/// an already generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanTerms {
    /// Source template, if the terms came from a stored plan.
    pub plan_id: Option<String>,
    pub down_payment: Rate,
    pub number_of_payments: i64,
    pub interval_days: i64,
    pub interest_rate: Rate,
}

impl PlanTerms {
    /// Creates ad-hoc terms not tied to a stored plan.
    pub fn new(
        down_payment: Rate,
        number_of_payments: i64,
        interval_days: i64,
        interest_rate: Rate,
    ) -> Self {
        PlanTerms {
            plan_id: None,
            down_payment,
            number_of_payments,
            interval_days,
            interest_rate,
        }
    }
}

// =============================================================================
// Payment Schedule
// =============================================================================

/// One future payment of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScheduledPayment {
    /// 1-based position in the schedule.
    pub sequence: i64,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
}

impl ScheduledPayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A concrete payment schedule for one sale (computed, never stored as-is).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSchedule {
    pub terms: PlanTerms,
    pub sale_total_cents: i64,
    pub down_payment_cents: i64,
    /// `sale_total - down_payment`
    pub financed_cents: i64,
    pub interest_cents: i64,
    pub installments: Vec<ScheduledPayment>,
    /// `down_payment + Σ installments` (= sale total + interest)
    pub total_amount_cents: i64,
}

impl PaymentSchedule {
    /// Sum of all future installments.
    pub fn installments_total(&self) -> Money {
        self.installments.iter().map(ScheduledPayment::amount).sum()
    }

    /// Checks `down_payment + Σ installments == total_amount`.
    pub fn is_balanced(&self) -> bool {
        Money::from_cents(self.down_payment_cents) + self.installments_total()
            == Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a deposit was tendered.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer.
    BankTransfer,
    /// Paper check.
    Check,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Installment Status
// =============================================================================

/// Stored status of an installment.
///
/// ```text
///            ┌──► Paid     (terminal)
/// Pending ───┤
///            └──► Prepaid  (terminal)
/// ```
///
/// "Overdue" is deliberately NOT a stored state; see [`EffectiveStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Awaiting payment.
    Pending,
    /// Paid on or after its due date.
    Paid,
    /// Paid ahead of its due date.
    Prepaid,
}

impl InstallmentStatus {
    /// Returns the database/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Prepaid => "prepaid",
        }
    }

    /// Paid and prepaid are terminal.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, InstallmentStatus::Pending)
    }
}

impl Default for InstallmentStatus {
    fn default() -> Self {
        InstallmentStatus::Pending
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status as shown to users, derived at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Pending,
    /// Pending and past its due date.
    Overdue,
    Paid,
    Prepaid,
}

impl EffectiveStatus {
    /// True for paid and prepaid.
    pub const fn is_settled(&self) -> bool {
        matches!(self, EffectiveStatus::Paid | EffectiveStatus::Prepaid)
    }
}

// =============================================================================
// Ledger Records
// =============================================================================

/// An immediate partial payment recorded against a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Deposit {
    pub id: String,
    pub customer_id: String,
    /// Owning sale; null until linked.
    pub sale_id: Option<String>,
    /// Checkout session that created the record.
    pub draft_id: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// When `sale_id` was set.
    #[ts(as = "Option<String>")]
    pub linked_at: Option<DateTime<Utc>>,
}

impl Deposit {
    /// Returns the deposit amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A scheduled future payment obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Installment {
    pub id: String,
    pub customer_id: String,
    /// Owning sale; null until linked.
    pub sale_id: Option<String>,
    /// Checkout session that created the record.
    pub draft_id: Option<String>,
    /// Plan the amount was derived from (informational, never re-read).
    pub plan_id: Option<String>,
    /// Position within its schedule, if created from one.
    pub sequence: Option<i64>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub paid_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub linked_at: Option<DateTime<Utc>>,
}

impl Installment {
    /// Returns the installment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Either kind of ledger entry, as returned by customer/sale queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerRecord {
    Deposit(Deposit),
    Installment(Installment),
}

impl LedgerRecord {
    pub fn id(&self) -> &str {
        match self {
            LedgerRecord::Deposit(d) => &d.id,
            LedgerRecord::Installment(i) => &i.id,
        }
    }

    pub fn customer_id(&self) -> &str {
        match self {
            LedgerRecord::Deposit(d) => &d.customer_id,
            LedgerRecord::Installment(i) => &i.customer_id,
        }
    }

    pub fn sale_id(&self) -> Option<&str> {
        match self {
            LedgerRecord::Deposit(d) => d.sale_id.as_deref(),
            LedgerRecord::Installment(i) => i.sale_id.as_deref(),
        }
    }

    pub fn amount(&self) -> Money {
        match self {
            LedgerRecord::Deposit(d) => d.amount(),
            LedgerRecord::Installment(i) => i.amount(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            LedgerRecord::Deposit(d) => d.created_at,
            LedgerRecord::Installment(i) => i.created_at,
        }
    }
}

/// Input for recording a deposit.
///
/// `date` is optional here so that a missing date surfaces as a validation
/// error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDeposit {
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub draft_id: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    pub method: PaymentMethod,
    pub note: Option<String>,
}

/// Input for recording an installment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInstallment {
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub draft_id: Option<String>,
    pub plan_id: Option<String>,
    pub sequence: Option<i64>,
    pub amount_cents: i64,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// `create(kind, data)`: the kind is the enum variant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewLedgerEntry {
    Deposit(NewDeposit),
    Installment(NewInstallment),
}

/// Who a batch of new records belongs to besides the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RecordOwner {
    /// Customer only; linked later by customer.
    Unassigned,
    /// A checkout session whose sale does not exist yet.
    Draft(String),
    /// An existing sale.
    Sale(String),
}

impl RecordOwner {
    /// Splits into `(sale_id, draft_id)` columns.
    pub fn columns(&self) -> (Option<String>, Option<String>) {
        match self {
            RecordOwner::Unassigned => (None, None),
            RecordOwner::Draft(id) => (None, Some(id.trim().to_string())),
            RecordOwner::Sale(id) => (Some(id.trim().to_string()), None),
        }
    }
}

// =============================================================================
// Sale (external)
// =============================================================================

/// What the Sales collaborator hands over once a checkout completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompletedSale {
    pub id: String,
    pub customer_id: String,
    pub total_cents: i64,
}

/// Tax calculation mode for the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Price + tax shown separately (USA model).
    Exclusive,
    /// Price includes tax (EU/UK model).
    Inclusive,
}

impl Default for TaxMode {
    fn default() -> Self {
        TaxMode::Exclusive
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_serializes_as_bps() {
        assert_eq!(serde_json::to_string(&Rate::from_bps(825)).unwrap(), "825");
        assert_eq!(Rate::default(), Rate::zero());
    }

    #[test]
    fn test_installment_status_is_terminal() {
        assert!(!InstallmentStatus::Pending.is_terminal());
        assert!(InstallmentStatus::Paid.is_terminal());
        assert!(InstallmentStatus::Prepaid.is_terminal());
        assert_eq!(InstallmentStatus::default(), InstallmentStatus::Pending);
    }

    #[test]
    fn test_record_owner_columns() {
        assert_eq!(RecordOwner::Unassigned.columns(), (None, None));
        assert_eq!(
            RecordOwner::Draft("d-1".into()).columns(),
            (None, Some("d-1".to_string()))
        );
        assert_eq!(
            RecordOwner::Sale("s-1".into()).columns(),
            (Some("s-1".to_string()), None)
        );
    }

    #[test]
    fn test_plan_terms_are_copied() {
        let now = Utc::now();
        let mut plan = InstallmentPlan {
            id: "plan-1".into(),
            name: "3 x 30".into(),
            down_payment_bps: 2000,
            number_of_payments: 3,
            interval_days: 30,
            interest_rate_bps: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let terms = plan.terms();
        plan.number_of_payments = 6;

        assert_eq!(terms.number_of_payments, 3);
        assert_eq!(terms.plan_id.as_deref(), Some("plan-1"));
    }

    #[test]
    fn test_ledger_record_serializes_with_kind_tag() {
        let deposit = Deposit {
            id: "dep-1".into(),
            customer_id: "cust-1".into(),
            sale_id: None,
            draft_id: None,
            amount_cents: 2000,
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            method: PaymentMethod::Cash,
            note: None,
            created_at: Utc::now(),
            linked_at: None,
        };
        let json = serde_json::to_value(LedgerRecord::Deposit(deposit)).unwrap();
        assert_eq!(json["kind"], "deposit");
        assert_eq!(json["method"], "cash");
    }
}
