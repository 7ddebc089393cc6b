//! # Status Engine
//!
//! Read-time views over ledger records.
//!
//! "Overdue" is never written to the database. An installment is overdue when
//! its stored status is still `pending` and its due date is before `today`.
//! Nothing in this module mutates a record.
//!
//! ```text
//! stored status      due_date vs today      effective status
//! ─────────────      ─────────────────      ────────────────
//! pending            due_date <  today  ──► overdue
//! pending            due_date >= today  ──► pending
//! paid               (any)              ──► paid
//! prepaid            (any)              ──► prepaid
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{EffectiveStatus, Installment, InstallmentStatus, LedgerRecord};

/// Derives the status shown to users.
pub fn effective_status(installment: &Installment, today: NaiveDate) -> EffectiveStatus {
    match installment.status {
        InstallmentStatus::Paid => EffectiveStatus::Paid,
        InstallmentStatus::Prepaid => EffectiveStatus::Prepaid,
        InstallmentStatus::Pending if installment.due_date < today => EffectiveStatus::Overdue,
        InstallmentStatus::Pending => EffectiveStatus::Pending,
    }
}

/// Totals over a set of ledger records.
///
/// - `paid_amount` = deposits + paid/prepaid installments
/// - `remaining_amount` = pending + overdue installments
/// - `pending_count` excludes overdue installments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerSummary {
    pub total_deposits_cents: i64,
    pub total_installments_cents: i64,
    pub paid_amount_cents: i64,
    pub remaining_amount_cents: i64,
    pub pending_count: usize,
    pub overdue_count: usize,
}

/// Aggregates records using their effective status as of `today`.
///
/// ## Example
/// ```rust
/// use cuota_core::status::aggregate;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let summary = aggregate(&[], today);
/// assert_eq!(summary.paid_amount_cents, 0);
/// ```
pub fn aggregate(records: &[LedgerRecord], today: NaiveDate) -> LedgerSummary {
    let mut deposits = Money::zero();
    let mut installments = Money::zero();
    let mut settled = Money::zero();
    let mut remaining = Money::zero();
    let mut summary = LedgerSummary::default();

    for record in records {
        match record {
            LedgerRecord::Deposit(deposit) => deposits += deposit.amount(),
            LedgerRecord::Installment(installment) => {
                installments += installment.amount();
                match effective_status(installment, today) {
                    EffectiveStatus::Paid | EffectiveStatus::Prepaid => {
                        settled += installment.amount();
                    }
                    EffectiveStatus::Overdue => {
                        remaining += installment.amount();
                        summary.overdue_count += 1;
                    }
                    EffectiveStatus::Pending => {
                        remaining += installment.amount();
                        summary.pending_count += 1;
                    }
                }
            }
        }
    }

    summary.total_deposits_cents = deposits.cents();
    summary.total_installments_cents = installments.cents();
    summary.paid_amount_cents = (deposits + settled).cents();
    summary.remaining_amount_cents = remaining.cents();
    summary
}

/// One overdue installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverdueEntry {
    pub installment_id: String,
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

/// Overdue installments as of a date, most overdue first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverdueReport {
    #[ts(as = "String")]
    pub as_of: NaiveDate,
    pub entries: Vec<OverdueEntry>,
    pub total_overdue_cents: i64,
}

impl OverdueReport {
    /// Number of overdue installments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the overdue report; non-overdue installments are ignored.
pub fn overdue_report(installments: &[Installment], today: NaiveDate) -> OverdueReport {
    let mut entries: Vec<OverdueEntry> = installments
        .iter()
        .filter(|i| effective_status(i, today) == EffectiveStatus::Overdue)
        .map(|i| OverdueEntry {
            installment_id: i.id.clone(),
            customer_id: i.customer_id.clone(),
            sale_id: i.sale_id.clone(),
            amount_cents: i.amount_cents,
            due_date: i.due_date,
            days_overdue: (today - i.due_date).num_days(),
        })
        .collect();

    entries.sort_by(|a, b| {
        b.days_overdue
            .cmp(&a.days_overdue)
            .then_with(|| a.installment_id.cmp(&b.installment_id))
    });

    let total_overdue_cents = entries.iter().map(|e| e.amount_cents).sum();

    OverdueReport {
        as_of: today,
        entries,
        total_overdue_cents,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Deposit, PaymentMethod};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn installment(id: &str, cents: i64, due: NaiveDate, status: InstallmentStatus) -> Installment {
        Installment {
            id: id.into(),
            customer_id: "cust-1".into(),
            sale_id: Some("sale-1".into()),
            draft_id: None,
            plan_id: None,
            sequence: None,
            amount_cents: cents,
            due_date: due,
            paid_date: None,
            status,
            note: None,
            created_at: Utc::now(),
            linked_at: None,
        }
    }

    fn deposit(cents: i64) -> Deposit {
        Deposit {
            id: "dep-1".into(),
            customer_id: "cust-1".into(),
            sale_id: Some("sale-1".into()),
            draft_id: None,
            amount_cents: cents,
            date: date(2026, 1, 1),
            method: PaymentMethod::Cash,
            note: None,
            created_at: Utc::now(),
            linked_at: None,
        }
    }

    #[test]
    fn test_effective_status() {
        let today = date(2026, 3, 1);

        let past = installment("i1", 100, date(2026, 2, 28), InstallmentStatus::Pending);
        let due_today = installment("i2", 100, today, InstallmentStatus::Pending);
        let paid_late = installment("i3", 100, date(2026, 1, 1), InstallmentStatus::Paid);
        let prepaid = installment("i4", 100, date(2026, 1, 1), InstallmentStatus::Prepaid);

        assert_eq!(effective_status(&past, today), EffectiveStatus::Overdue);
        assert_eq!(effective_status(&due_today, today), EffectiveStatus::Pending);
        assert_eq!(effective_status(&paid_late, today), EffectiveStatus::Paid);
        assert_eq!(effective_status(&prepaid, today), EffectiveStatus::Prepaid);
    }

    #[test]
    fn test_aggregate_counts_overdue_without_mutating() {
        let today = date(2026, 3, 1);
        let records = vec![
            LedgerRecord::Deposit(deposit(2000)),
            LedgerRecord::Installment(installment(
                "i1",
                2667,
                date(2026, 1, 31),
                InstallmentStatus::Paid,
            )),
            LedgerRecord::Installment(installment(
                "i2",
                2667,
                date(2026, 2, 15),
                InstallmentStatus::Pending,
            )),
            LedgerRecord::Installment(installment(
                "i3",
                2666,
                date(2026, 4, 1),
                InstallmentStatus::Pending,
            )),
        ];

        let summary = aggregate(&records, today);

        assert_eq!(summary.total_deposits_cents, 2000);
        assert_eq!(summary.total_installments_cents, 8000);
        assert_eq!(summary.paid_amount_cents, 4667);
        assert_eq!(summary.remaining_amount_cents, 5333);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.pending_count, 1);

        match &records[2] {
            LedgerRecord::Installment(i) => assert_eq!(i.status, InstallmentStatus::Pending),
            LedgerRecord::Deposit(_) => unreachable!(),
        }
    }

    #[test]
    fn test_overdue_report_sorted_most_overdue_first() {
        let today = date(2026, 3, 1);
        let installments = vec![
            installment("recent", 500, date(2026, 2, 27), InstallmentStatus::Pending),
            installment("oldest", 700, date(2026, 1, 1), InstallmentStatus::Pending),
            installment("paid", 900, date(2025, 12, 1), InstallmentStatus::Paid),
            installment("future", 300, date(2026, 3, 5), InstallmentStatus::Pending),
        ];

        let report = overdue_report(&installments, today);

        let ids: Vec<&str> = report.entries.iter().map(|e| e.installment_id.as_str()).collect();
        assert_eq!(ids, vec!["oldest", "recent"]);
        assert_eq!(report.entries[0].days_overdue, 59);
        assert_eq!(report.entries[1].days_overdue, 2);
        assert_eq!(report.total_overdue_cents, 1200);
        assert_eq!(report.as_of, today);
    }

    #[test]
    fn test_overdue_report_empty() {
        let report = overdue_report(&[], date(2026, 3, 1));
        assert!(report.is_empty());
        assert_eq!(report.total_overdue_cents, 0);
    }
}
