//! # Ledger Repository
//!
//! Deposits and installments recorded against a customer.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ledger Record Lifecycle                           │
//! │                                                                         │
//! │  1. CREATE (during checkout or against an existing sale)               │
//! │     └── create_deposit()      → Deposit     { sale_id: None }          │
//! │     └── create_installment()  → Installment { status: pending }        │
//! │     └── record_schedule()     → both, in one transaction               │
//! │                                                                         │
//! │  2. LINK (LinkingRepository)                                           │
//! │     └── sale_id: None → Some(sale) exactly once                        │
//! │                                                                         │
//! │  3. SETTLE                                                             │
//! │     └── mark_as_paid()     pending → paid                              │
//! │     └── mark_as_prepaid()  pending → prepaid (before due date)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status changes are compare-and-set on `status = 'pending'`, so two
//! cashiers settling the same installment cannot both succeed.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use cuota_core::validation::{
    validate_customer_id, validate_new_deposit, validate_new_installment, validate_reference,
};
use cuota_core::{
    CoreError, Deposit, Installment, InstallmentStatus, LedgerRecord, NewDeposit, NewInstallment,
    NewLedgerEntry, PaymentMethod, PaymentSchedule, RecordOwner,
};

const DEPOSIT_COLUMNS: &str = r#"
    id, customer_id, sale_id, draft_id, amount_cents, date, method, note,
    created_at, linked_at
"#;

const INSTALLMENT_COLUMNS: &str = r#"
    id, customer_id, sale_id, draft_id, plan_id, sequence, amount_cents,
    due_date, paid_date, status, note, created_at, linked_at
"#;

/// What `record_schedule` wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedSchedule {
    /// The down payment, absent when it was zero.
    pub deposit: Option<Deposit>,
    /// One pending installment per non-zero scheduled payment.
    pub installments: Vec<Installment>,
}

/// Column a record lookup filters on.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Customer,
    Sale,
    Draft,
}

impl Scope {
    fn column(self) -> &'static str {
        match self {
            Scope::Customer => "customer_id",
            Scope::Sale => "sale_id",
            Scope::Draft => "draft_id",
        }
    }
}

/// Repository for deposit and installment records.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a deposit or an installment.
    pub async fn create(&self, entry: NewLedgerEntry) -> DbResult<LedgerRecord> {
        match entry {
            NewLedgerEntry::Deposit(input) => {
                self.create_deposit(&input).await.map(LedgerRecord::Deposit)
            }
            NewLedgerEntry::Installment(input) => self
                .create_installment(&input)
                .await
                .map(LedgerRecord::Installment),
        }
    }

    /// Records a deposit.
    ///
    /// `sale_id` stays null unless the input names a sale.
    pub async fn create_deposit(&self, input: &NewDeposit) -> DbResult<Deposit> {
        let date = validate_new_deposit(input)?;

        let deposit = Deposit {
            id: Uuid::new_v4().to_string(),
            customer_id: input.customer_id.trim().to_string(),
            sale_id: trimmed(&input.sale_id),
            draft_id: trimmed(&input.draft_id),
            amount_cents: input.amount_cents,
            date,
            method: input.method,
            note: input.note.clone(),
            created_at: Utc::now(),
            linked_at: input.sale_id.as_ref().map(|_| Utc::now()),
        };

        insert_deposit(&self.pool, &deposit).await?;

        debug!(
            id = %deposit.id,
            customer_id = %deposit.customer_id,
            amount_cents = deposit.amount_cents,
            "Deposit recorded"
        );

        Ok(deposit)
    }

    /// Records a pending installment.
    pub async fn create_installment(&self, input: &NewInstallment) -> DbResult<Installment> {
        let due_date = validate_new_installment(input)?;

        let installment = Installment {
            id: Uuid::new_v4().to_string(),
            customer_id: input.customer_id.trim().to_string(),
            sale_id: trimmed(&input.sale_id),
            draft_id: trimmed(&input.draft_id),
            plan_id: input.plan_id.clone(),
            sequence: input.sequence,
            amount_cents: input.amount_cents,
            due_date,
            paid_date: None,
            status: InstallmentStatus::Pending,
            note: input.note.clone(),
            created_at: Utc::now(),
            linked_at: input.sale_id.as_ref().map(|_| Utc::now()),
        };

        insert_installment(&self.pool, &installment).await?;

        debug!(
            id = %installment.id,
            customer_id = %installment.customer_id,
            amount_cents = installment.amount_cents,
            due_date = %installment.due_date,
            "Installment recorded"
        );

        Ok(installment)
    }

    /// Persists a generated schedule in one transaction.
    ///
    /// The down payment becomes a deposit dated `today` (skipped when zero);
    /// each scheduled payment becomes a pending installment carrying the
    /// plan id and its sequence. Zero-amount payments are skipped.
    pub async fn record_schedule(
        &self,
        customer_id: &str,
        schedule: &PaymentSchedule,
        owner: &RecordOwner,
        method: PaymentMethod,
        today: NaiveDate,
    ) -> DbResult<RecordedSchedule> {
        validate_customer_id(customer_id)?;
        match owner {
            RecordOwner::Unassigned => {}
            RecordOwner::Draft(id) => validate_reference("draft_id", id)?,
            RecordOwner::Sale(id) => validate_reference("sale_id", id)?,
        }
        if !schedule.is_balanced() {
            return Err(CoreError::ArithmeticInvariant {
                expected_cents: schedule.total_amount_cents,
                actual_cents: schedule.down_payment_cents + schedule.installments_total().cents(),
            }
            .into());
        }

        let customer_id = customer_id.trim().to_string();
        let (sale_id, draft_id) = owner.columns();
        let now = Utc::now();
        let linked_at = sale_id.as_ref().map(|_| now);

        let deposit = (schedule.down_payment_cents > 0).then(|| Deposit {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.clone(),
            sale_id: sale_id.clone(),
            draft_id: draft_id.clone(),
            amount_cents: schedule.down_payment_cents,
            date: today,
            method,
            note: None,
            created_at: now,
            linked_at,
        });

        let installments: Vec<Installment> = schedule
            .installments
            .iter()
            .filter(|payment| payment.amount_cents > 0)
            .map(|payment| Installment {
                id: Uuid::new_v4().to_string(),
                customer_id: customer_id.clone(),
                sale_id: sale_id.clone(),
                draft_id: draft_id.clone(),
                plan_id: schedule.terms.plan_id.clone(),
                sequence: Some(payment.sequence),
                amount_cents: payment.amount_cents,
                due_date: payment.due_date,
                paid_date: None,
                status: InstallmentStatus::Pending,
                note: None,
                created_at: now,
                linked_at,
            })
            .collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if let Some(deposit) = &deposit {
            insert_deposit(&mut *tx, deposit).await?;
        }
        for installment in &installments {
            insert_installment(&mut *tx, installment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            customer_id = %customer_id,
            deposit_cents = schedule.down_payment_cents,
            installments = installments.len(),
            "Schedule recorded"
        );

        Ok(RecordedSchedule {
            deposit,
            installments,
        })
    }

    /// Marks a pending installment as paid.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `Rejected(AlreadyPaid)` if the installment is already paid or
    ///   prepaid; the stored paid date is left unchanged
    pub async fn mark_as_paid(&self, id: &str, paid_date: NaiveDate) -> DbResult<Installment> {
        self.settle(id, InstallmentStatus::Paid, paid_date).await
    }

    /// Marks a pending installment as paid ahead of its due date.
    ///
    /// `paid_date` must be strictly before the due date.
    pub async fn mark_as_prepaid(&self, id: &str, paid_date: NaiveDate) -> DbResult<Installment> {
        let current = self
            .get_installment(id)
            .await?
            .ok_or_else(|| DbError::not_found("Installment", id))?;

        if current.status.is_terminal() {
            return Err(already_settled(current));
        }
        if paid_date >= current.due_date {
            return Err(CoreError::invalid_amount(format!(
                "prepayment date {} must be before due date {}",
                paid_date, current.due_date
            ))
            .into());
        }

        self.settle(id, InstallmentStatus::Prepaid, paid_date).await
    }

    async fn settle(
        &self,
        id: &str,
        status: InstallmentStatus,
        paid_date: NaiveDate,
    ) -> DbResult<Installment> {
        let result = sqlx::query(
            "UPDATE installments SET status = ?2, paid_date = ?3 WHERE id = ?1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status)
        .bind(paid_date)
        .execute(&self.pool)
        .await?;

        let installment = self
            .get_installment(id)
            .await?
            .ok_or_else(|| DbError::not_found("Installment", id))?;

        if result.rows_affected() == 0 {
            return Err(already_settled(installment));
        }

        info!(id = %id, status = %status, paid_date = %paid_date, "Installment settled");
        Ok(installment)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All records of a customer, in creation order.
    pub async fn get_by_customer(&self, customer_id: &str) -> DbResult<Vec<LedgerRecord>> {
        self.records(Scope::Customer, customer_id).await
    }

    /// All records linked to a sale, in creation order.
    pub async fn get_by_sale(&self, sale_id: &str) -> DbResult<Vec<LedgerRecord>> {
        self.records(Scope::Sale, sale_id).await
    }

    /// All records created by a checkout draft, in creation order.
    pub async fn get_by_draft(&self, draft_id: &str) -> DbResult<Vec<LedgerRecord>> {
        self.records(Scope::Draft, draft_id).await
    }

    /// Gets an installment by ID.
    pub async fn get_installment(&self, id: &str) -> DbResult<Option<Installment>> {
        let sql = format!("SELECT {} FROM installments WHERE id = ?1", INSTALLMENT_COLUMNS);

        let installment = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(installment)
    }

    /// Gets a deposit by ID.
    pub async fn get_deposit(&self, id: &str) -> DbResult<Option<Deposit>> {
        let sql = format!("SELECT {} FROM deposits WHERE id = ?1", DEPOSIT_COLUMNS);

        let deposit = sqlx::query_as::<_, Deposit>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(deposit)
    }

    /// Pending installments due before `today`, oldest first.
    pub async fn overdue_installments(&self, today: NaiveDate) -> DbResult<Vec<Installment>> {
        let sql = format!(
            "SELECT {} FROM installments WHERE status = 'pending' AND due_date < ?1 ORDER BY due_date, id",
            INSTALLMENT_COLUMNS
        );

        let installments = sqlx::query_as::<_, Installment>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        Ok(installments)
    }

    async fn records(&self, scope: Scope, key: &str) -> DbResult<Vec<LedgerRecord>> {
        let key = key.trim();
        let deposit_sql = format!(
            "SELECT {} FROM deposits WHERE {} = ?1 ORDER BY created_at, id",
            DEPOSIT_COLUMNS,
            scope.column()
        );
        let installment_sql = format!(
            "SELECT {} FROM installments WHERE {} = ?1 ORDER BY created_at, sequence, id",
            INSTALLMENT_COLUMNS,
            scope.column()
        );

        let deposits = sqlx::query_as::<_, Deposit>(&deposit_sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        let installments = sqlx::query_as::<_, Installment>(&installment_sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;

        let mut records: Vec<LedgerRecord> = deposits
            .into_iter()
            .map(LedgerRecord::Deposit)
            .chain(installments.into_iter().map(LedgerRecord::Installment))
            .collect();

        // Stable: a down payment stays ahead of installments created with it
        records.sort_by_key(|record| record.created_at());

        Ok(records)
    }
}

fn already_settled(installment: Installment) -> DbError {
    CoreError::AlreadyPaid {
        installment_id: installment.id,
        status: installment.status,
    }
    .into()
}

async fn insert_deposit<'e, E>(executor: E, deposit: &Deposit) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO deposits (
            id, customer_id, sale_id, draft_id, amount_cents,
            date, method, note, created_at, linked_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&deposit.id)
    .bind(&deposit.customer_id)
    .bind(&deposit.sale_id)
    .bind(&deposit.draft_id)
    .bind(deposit.amount_cents)
    .bind(deposit.date)
    .bind(deposit.method)
    .bind(&deposit.note)
    .bind(deposit.created_at)
    .bind(deposit.linked_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_installment<'e, E>(executor: E, installment: &Installment) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO installments (
            id, customer_id, sale_id, draft_id, plan_id, sequence,
            amount_cents, due_date, paid_date, status, note,
            created_at, linked_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&installment.id)
    .bind(&installment.customer_id)
    .bind(&installment.sale_id)
    .bind(&installment.draft_id)
    .bind(&installment.plan_id)
    .bind(installment.sequence)
    .bind(installment.amount_cents)
    .bind(installment.due_date)
    .bind(installment.paid_date)
    .bind(installment.status)
    .bind(&installment.note)
    .bind(installment.created_at)
    .bind(installment.linked_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Ids are stored trimmed; lookups and claims trim the same way.
fn trimmed(id: &Option<String>) -> Option<String> {
    id.as_deref().map(|id| id.trim().to_string())
}
