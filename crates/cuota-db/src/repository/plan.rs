//! # Plan Repository
//!
//! Storage for installment plan templates.
//!
//! Plans are never deleted: retired plans are deactivated so historical
//! installments keep a valid `plan_id`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use cuota_core::validation::{validate_plan_draft, validate_reference};
use cuota_core::{CoreError, InstallmentPlan, PlanDraft, PlanTerms};

const PLAN_COLUMNS: &str = r#"
    id, name, down_payment_bps, number_of_payments, interval_days,
    interest_rate_bps, is_active, created_at, updated_at
"#;

/// Repository for plan templates.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    /// Creates a new PlanRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Gets a plan by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InstallmentPlan>> {
        let sql = format!("SELECT {} FROM installment_plans WHERE id = ?1", PLAN_COLUMNS);

        let plan = sqlx::query_as::<_, InstallmentPlan>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(plan)
    }

    /// Lists plans that can be offered at checkout, by name.
    pub async fn list_active(&self) -> DbResult<Vec<InstallmentPlan>> {
        let sql = format!(
            "SELECT {} FROM installment_plans WHERE is_active = 1 ORDER BY name",
            PLAN_COLUMNS
        );

        let plans = sqlx::query_as::<_, InstallmentPlan>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(plans)
    }

    /// Returns the frozen terms of an active plan.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `Rejected(PlanInactive)` for a retired plan
    pub async fn active_terms(&self, id: &str) -> DbResult<PlanTerms> {
        let plan = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Installment plan", id))?;

        if !plan.is_active {
            return Err(CoreError::PlanInactive {
                plan_id: plan.id,
            }
            .into());
        }

        Ok(plan.terms())
    }

    /// Inserts a new plan template.
    pub async fn insert(&self, draft: &PlanDraft) -> DbResult<InstallmentPlan> {
        validate_plan_draft(draft)?;

        let now = Utc::now();
        let plan = InstallmentPlan {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            down_payment_bps: draft.down_payment_bps,
            number_of_payments: draft.number_of_payments,
            interval_days: draft.interval_days,
            interest_rate_bps: draft.interest_rate_bps,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %plan.id, name = %plan.name, "Inserting installment plan");

        sqlx::query(
            r#"
            INSERT INTO installment_plans (
                id, name, down_payment_bps, number_of_payments, interval_days,
                interest_rate_bps, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&plan.id)
        .bind(&plan.name)
        .bind(plan.down_payment_bps)
        .bind(plan.number_of_payments)
        .bind(plan.interval_days)
        .bind(plan.interest_rate_bps)
        .bind(plan.is_active)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(plan)
    }

    /// Replaces a plan's parameters.
    ///
    /// Ledger records created from the old parameters are not touched.
    pub async fn update(&self, id: &str, draft: &PlanDraft) -> DbResult<InstallmentPlan> {
        validate_reference("plan_id", id)?;
        validate_plan_draft(draft)?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE installment_plans SET
                name = ?2,
                down_payment_bps = ?3,
                number_of_payments = ?4,
                interval_days = ?5,
                interest_rate_bps = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(draft.name.trim())
        .bind(draft.down_payment_bps)
        .bind(draft.number_of_payments)
        .bind(draft.interval_days)
        .bind(draft.interest_rate_bps)
        .bind(draft.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Installment plan", id));
        }

        info!(id = %id, "Installment plan updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Installment plan", id))
    }

    /// Retires a plan so it is no longer offered.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE installment_plans SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Installment plan", id));
        }

        info!(id = %id, "Installment plan deactivated");
        Ok(())
    }

    /// Counts all plan templates (active or not).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM installment_plans")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
