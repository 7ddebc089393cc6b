//! # Ledger Commands
//!
//! Deposits, installments and their payment status.
//!
//! Every installment returned to the UI carries its effective status for
//! the store's current business date; the stored status only ever reads
//! pending, paid or prepaid.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use cuota_core::validation::{validate_customer_id, validate_reference};
use cuota_core::{
    aggregate, effective_status, generate_schedule, CoreError, Deposit, EffectiveStatus,
    Installment, InstallmentStatus, LedgerRecord, LedgerSummary, Money, NewDeposit,
    NewInstallment, PaymentMethod, RecordOwner,
};
use cuota_db::RecordedSchedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDto {
    pub id: String,
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub draft_id: Option<String>,
    pub amount_cents: i64,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub linked_at: Option<DateTime<Utc>>,
}

impl From<Deposit> for DepositDto {
    fn from(d: Deposit) -> Self {
        DepositDto {
            id: d.id,
            customer_id: d.customer_id,
            sale_id: d.sale_id,
            draft_id: d.draft_id,
            amount_cents: d.amount_cents,
            date: d.date,
            method: d.method,
            note: d.note,
            created_at: d.created_at,
            linked_at: d.linked_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentDto {
    pub id: String,
    pub customer_id: String,
    pub sale_id: Option<String>,
    pub draft_id: Option<String>,
    pub plan_id: Option<String>,
    pub sequence: Option<i64>,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
    /// Status as of today; `overdue` is only ever shown here.
    pub effective_status: EffectiveStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub linked_at: Option<DateTime<Utc>>,
}

impl InstallmentDto {
    pub fn new(i: Installment, today: NaiveDate) -> Self {
        let effective_status = effective_status(&i, today);
        InstallmentDto {
            id: i.id,
            customer_id: i.customer_id,
            sale_id: i.sale_id,
            draft_id: i.draft_id,
            plan_id: i.plan_id,
            sequence: i.sequence,
            amount_cents: i.amount_cents,
            due_date: i.due_date,
            paid_date: i.paid_date,
            status: i.status,
            effective_status,
            note: i.note,
            created_at: i.created_at,
            linked_at: i.linked_at,
        }
    }
}

/// A deposit or an installment, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LedgerEntryDto {
    Deposit(DepositDto),
    Installment(InstallmentDto),
}

impl LedgerEntryDto {
    pub fn new(record: LedgerRecord, today: NaiveDate) -> Self {
        match record {
            LedgerRecord::Deposit(d) => LedgerEntryDto::Deposit(d.into()),
            LedgerRecord::Installment(i) => LedgerEntryDto::Installment(InstallmentDto::new(i, today)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub total_deposits_cents: i64,
    pub total_installments_cents: i64,
    pub paid_amount_cents: i64,
    pub remaining_amount_cents: i64,
    pub pending_count: usize,
    pub overdue_count: usize,
}

impl From<LedgerSummary> for SummaryDto {
    fn from(s: LedgerSummary) -> Self {
        SummaryDto {
            total_deposits_cents: s.total_deposits_cents,
            total_installments_cents: s.total_installments_cents,
            paid_amount_cents: s.paid_amount_cents,
            remaining_amount_cents: s.remaining_amount_cents,
            pending_count: s.pending_count,
            overdue_count: s.overdue_count,
        }
    }
}

/// Records a schedule for a customer under a stored plan.
///
/// The schedule is regenerated from the plan here rather than accepted
/// from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordScheduleRequest {
    pub customer_id: String,
    pub plan_id: String,
    pub sale_total_cents: i64,
    #[serde(default)]
    pub custom_down_payment_cents: Option<i64>,
    /// Draft or sale the records belong to.
    pub owner: RecordOwner,
    /// How the down payment was tendered.
    #[serde(default)]
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedScheduleDto {
    pub deposit: Option<DepositDto>,
    pub installments: Vec<InstallmentDto>,
    pub total_amount_cents: i64,
}

impl RecordedScheduleDto {
    fn new(recorded: RecordedSchedule, total_amount_cents: i64, today: NaiveDate) -> Self {
        RecordedScheduleDto {
            deposit: recorded.deposit.map(DepositDto::from),
            installments: recorded
                .installments
                .into_iter()
                .map(|i| InstallmentDto::new(i, today))
                .collect(),
            total_amount_cents,
        }
    }
}

pub async fn create_deposit(db: &DbState, data: NewDeposit) -> Result<DepositDto, ApiError> {
    debug!(customer_id = %data.customer_id, amount_cents = data.amount_cents, "create_deposit command");

    let deposit = db.inner().ledger().create_deposit(&data).await?;

    info!(deposit_id = %deposit.id, amount_cents = deposit.amount_cents, "Deposit created");
    Ok(deposit.into())
}

pub async fn create_installment(
    db: &DbState,
    config: &ConfigState,
    data: NewInstallment,
) -> Result<InstallmentDto, ApiError> {
    debug!(customer_id = %data.customer_id, amount_cents = data.amount_cents, "create_installment command");

    let installment = db.inner().ledger().create_installment(&data).await?;

    info!(installment_id = %installment.id, due_date = %installment.due_date, "Installment created");
    Ok(InstallmentDto::new(installment, config.today()))
}

/// Generates a schedule and writes its deposit and installments atomically.
pub async fn record_schedule(
    db: &DbState,
    config: &ConfigState,
    request: RecordScheduleRequest,
) -> Result<RecordedScheduleDto, ApiError> {
    debug!(
        customer_id = %request.customer_id,
        plan_id = %request.plan_id,
        sale_total_cents = request.sale_total_cents,
        "record_schedule command"
    );

    let today = config.today();
    let terms = db.inner().plans().active_terms(&request.plan_id).await?;
    let schedule = generate_schedule(
        &terms,
        Money::from_cents(request.sale_total_cents),
        request.custom_down_payment_cents.map(Money::from_cents),
        today,
    )?;

    let recorded = db
        .inner()
        .ledger()
        .record_schedule(
            &request.customer_id,
            &schedule,
            &request.owner,
            request.method,
            today,
        )
        .await?;

    info!(
        customer_id = %request.customer_id,
        installments = recorded.installments.len(),
        total_cents = schedule.total_amount_cents,
        "Schedule recorded"
    );

    Ok(RecordedScheduleDto::new(recorded, schedule.total_amount_cents, today))
}

pub async fn mark_installment_paid(
    db: &DbState,
    config: &ConfigState,
    id: String,
    paid_date: NaiveDate,
) -> Result<InstallmentDto, ApiError> {
    debug!(installment_id = %id, paid_date = %paid_date, "mark_installment_paid command");

    let installment = db.inner().ledger().mark_as_paid(&id, paid_date).await?;
    Ok(InstallmentDto::new(installment, config.today()))
}

pub async fn mark_installment_prepaid(
    db: &DbState,
    config: &ConfigState,
    id: String,
    paid_date: NaiveDate,
) -> Result<InstallmentDto, ApiError> {
    debug!(installment_id = %id, paid_date = %paid_date, "mark_installment_prepaid command");

    let installment = db.inner().ledger().mark_as_prepaid(&id, paid_date).await?;
    Ok(InstallmentDto::new(installment, config.today()))
}

pub async fn get_by_customer(
    db: &DbState,
    config: &ConfigState,
    customer_id: String,
) -> Result<Vec<LedgerEntryDto>, ApiError> {
    debug!(customer_id = %customer_id, "get_by_customer command");
    validate_customer_id(&customer_id).map_err(CoreError::from)?;

    let today = config.today();
    let records = db.inner().ledger().get_by_customer(customer_id.trim()).await?;
    Ok(records.into_iter().map(|r| LedgerEntryDto::new(r, today)).collect())
}

pub async fn get_by_sale(
    db: &DbState,
    config: &ConfigState,
    sale_id: String,
) -> Result<Vec<LedgerEntryDto>, ApiError> {
    debug!(sale_id = %sale_id, "get_by_sale command");
    validate_reference("sale_id", &sale_id).map_err(CoreError::from)?;

    let today = config.today();
    let records = db.inner().ledger().get_by_sale(&sale_id).await?;
    Ok(records.into_iter().map(|r| LedgerEntryDto::new(r, today)).collect())
}

/// Totals and counts for a customer as of today.
pub async fn customer_summary(
    db: &DbState,
    config: &ConfigState,
    customer_id: String,
) -> Result<SummaryDto, ApiError> {
    debug!(customer_id = %customer_id, "customer_summary command");
    validate_customer_id(&customer_id).map_err(CoreError::from)?;

    let records = db.inner().ledger().get_by_customer(customer_id.trim()).await?;
    Ok(aggregate(&records, config.today()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use cuota_core::PlanDraft;
    use cuota_db::{Database, DbConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup(today: NaiveDate) -> (DbState, ConfigState, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let plan = db
            .plans()
            .insert(&PlanDraft {
                name: "3 x 30 days".into(),
                down_payment_bps: 2000,
                number_of_payments: 3,
                interval_days: 30,
                interest_rate_bps: 0,
                is_active: true,
            })
            .await
            .unwrap();

        (
            DbState::new(db),
            ConfigState::default().with_today(today),
            plan.id,
        )
    }

    fn request(plan_id: &str, owner: RecordOwner) -> RecordScheduleRequest {
        RecordScheduleRequest {
            customer_id: "cust-1".into(),
            plan_id: plan_id.into(),
            sale_total_cents: 10_000,
            custom_down_payment_cents: None,
            owner,
            method: PaymentMethod::Card,
        }
    }

    #[tokio::test]
    async fn test_record_schedule() {
        let (db, config, plan_id) = setup(date(2026, 1, 1)).await;

        let recorded = record_schedule(&db, &config, request(&plan_id, RecordOwner::Sale("sale-1".into())))
            .await
            .unwrap();

        let deposit = recorded.deposit.unwrap();
        assert_eq!(deposit.amount_cents, 2000);
        assert_eq!(deposit.method, PaymentMethod::Card);
        assert_eq!(recorded.installments.len(), 3);
        assert_eq!(recorded.total_amount_cents, 10_000);
        assert!(recorded
            .installments
            .iter()
            .all(|i| i.effective_status == EffectiveStatus::Pending));

        let entries = get_by_sale(&db, &config, "sale-1".into()).await.unwrap();
        assert_eq!(entries.len(), 4);
    }

    #[tokio::test]
    async fn test_mark_paid_twice_is_already_paid() {
        let (db, config, plan_id) = setup(date(2026, 1, 1)).await;
        let recorded = record_schedule(&db, &config, request(&plan_id, RecordOwner::Unassigned))
            .await
            .unwrap();
        let id = recorded.installments[0].id.clone();

        let paid = mark_installment_paid(&db, &config, id.clone(), date(2026, 2, 1))
            .await
            .unwrap();
        assert_eq!(paid.status, InstallmentStatus::Paid);
        assert_eq!(paid.effective_status, EffectiveStatus::Paid);

        let err = mark_installment_paid(&db, &config, id.clone(), date(2026, 2, 5))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyPaid);

        let stored = db.inner().ledger().get_installment(&id).await.unwrap().unwrap();
        assert_eq!(stored.paid_date, Some(date(2026, 2, 1)));
    }

    #[tokio::test]
    async fn test_mark_prepaid() {
        let (db, config, plan_id) = setup(date(2026, 1, 1)).await;
        let recorded = record_schedule(&db, &config, request(&plan_id, RecordOwner::Unassigned))
            .await
            .unwrap();
        let last = recorded.installments[2].id.clone();

        let prepaid = mark_installment_prepaid(&db, &config, last.clone(), date(2026, 1, 10))
            .await
            .unwrap();
        assert_eq!(prepaid.status, InstallmentStatus::Prepaid);

        let err = mark_installment_prepaid(&db, &config, "missing".into(), date(2026, 1, 10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_summary_counts_overdue_without_storing_it() {
        let (db, config, plan_id) = setup(date(2026, 1, 1)).await;
        record_schedule(&db, &config, request(&plan_id, RecordOwner::Unassigned))
            .await
            .unwrap();

        // Two months later the first installment (due 2026-01-31) is late
        let later = ConfigState::default().with_today(date(2026, 3, 1));
        let summary = customer_summary(&db, &later, "cust-1".into()).await.unwrap();

        assert_eq!(summary.total_deposits_cents, 2000);
        assert_eq!(summary.total_installments_cents, 8000);
        assert_eq!(summary.paid_amount_cents, 2000);
        assert_eq!(summary.remaining_amount_cents, 8000);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.pending_count, 2);

        let entries = get_by_customer(&db, &later, "cust-1".into()).await.unwrap();
        let statuses: Vec<(InstallmentStatus, EffectiveStatus)> = entries
            .iter()
            .filter_map(|e| match e {
                LedgerEntryDto::Installment(i) => Some((i.status, i.effective_status)),
                LedgerEntryDto::Deposit(_) => None,
            })
            .collect();
        assert_eq!(statuses[0], (InstallmentStatus::Pending, EffectiveStatus::Overdue));
    }

    #[tokio::test]
    async fn test_create_and_validate() {
        let (db, config, _) = setup(date(2026, 1, 1)).await;

        let deposit = create_deposit(
            &db,
            NewDeposit {
                customer_id: "cust-2".into(),
                amount_cents: 500,
                date: Some(date(2026, 1, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(deposit.sale_id.is_none());

        let installment = create_installment(
            &db,
            &config,
            NewInstallment {
                customer_id: "cust-2".into(),
                amount_cents: 700,
                due_date: Some(date(2026, 2, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(installment.effective_status, EffectiveStatus::Pending);

        let err = create_deposit(
            &db,
            NewDeposit {
                customer_id: "cust-2".into(),
                amount_cents: 0,
                date: Some(date(2026, 1, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = get_by_customer(&db, &config, "  ".into()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_entry_is_tagged_by_kind() {
        let now = Utc::now();
        let entry = LedgerEntryDto::Deposit(DepositDto {
            id: "d-1".into(),
            customer_id: "cust-1".into(),
            sale_id: None,
            draft_id: None,
            amount_cents: 100,
            date: date(2026, 1, 1),
            method: PaymentMethod::BankTransfer,
            note: None,
            created_at: now,
            linked_at: None,
        });

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "deposit");
        assert_eq!(json["customerId"], "cust-1");
        assert_eq!(json["method"], "bank_transfer");
    }
}
