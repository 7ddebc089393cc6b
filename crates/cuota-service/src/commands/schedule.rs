//! # Schedule Commands
//!
//! Plan templates and schedule calculation.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  calculate_schedule(planId, saleTotal, customDownPayment?)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plans().active_terms(planId) ── unknown / retired ──► error            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  generate_schedule(terms, total, down?, today)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { success: true, schedule } | { success: false, error }               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calculation never writes. Schedules become ledger records only through
//! `record_schedule`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use cuota_core::{
    generate_schedule, preview_for_cart, CheckoutTotals, InstallmentPlan, Money, PaymentSchedule,
    PlanDraft, ScheduledPayment,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub id: String,
    pub name: String,
    pub down_payment_bps: u32,
    pub number_of_payments: i64,
    pub interval_days: i64,
    pub interest_rate_bps: u32,
    pub is_active: bool,
}

impl From<InstallmentPlan> for PlanDto {
    fn from(p: InstallmentPlan) -> Self {
        PlanDto {
            id: p.id,
            name: p.name,
            down_payment_bps: p.down_payment_bps,
            number_of_payments: p.number_of_payments,
            interval_days: p.interval_days,
            interest_rate_bps: p.interest_rate_bps,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPaymentDto {
    pub sequence: i64,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
}

impl From<ScheduledPayment> for ScheduledPaymentDto {
    fn from(p: ScheduledPayment) -> Self {
        ScheduledPaymentDto {
            sequence: p.sequence,
            amount_cents: p.amount_cents,
            due_date: p.due_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub plan_id: Option<String>,
    pub sale_total_cents: i64,
    pub down_payment_cents: i64,
    pub financed_cents: i64,
    pub interest_cents: i64,
    pub total_amount_cents: i64,
    pub interval_days: i64,
    pub installments: Vec<ScheduledPaymentDto>,
}

impl From<PaymentSchedule> for ScheduleDto {
    fn from(s: PaymentSchedule) -> Self {
        ScheduleDto {
            plan_id: s.terms.plan_id,
            sale_total_cents: s.sale_total_cents,
            down_payment_cents: s.down_payment_cents,
            financed_cents: s.financed_cents,
            interest_cents: s.interest_cents,
            total_amount_cents: s.total_amount_cents,
            interval_days: s.terms.interval_days,
            installments: s.installments.into_iter().map(ScheduledPaymentDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsDto {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl From<CheckoutTotals> for TotalsDto {
    fn from(t: CheckoutTotals) -> Self {
        TotalsDto {
            subtotal_cents: t.subtotal.cents(),
            discount_cents: t.discount.cents(),
            tax_cents: t.tax.cents(),
            total_cents: t.total.cents(),
        }
    }
}

/// Result envelope for schedule calculation.
///
/// Failures are reported in-band so the checkout screen can show the
/// message next to the plan picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<TotalsDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ScheduleResponse {
    fn ok(schedule: PaymentSchedule, totals: Option<CheckoutTotals>) -> Self {
        ScheduleResponse {
            success: true,
            schedule: Some(schedule.into()),
            totals: totals.map(TotalsDto::from),
            error: None,
        }
    }

    fn failed(error: ApiError) -> Self {
        ScheduleResponse {
            success: false,
            schedule: None,
            totals: None,
            error: Some(error),
        }
    }
}

/// Calculates the schedule for a sale total under a stored plan.
pub async fn calculate_schedule(
    db: &DbState,
    config: &ConfigState,
    plan_id: String,
    sale_total_cents: i64,
    custom_down_payment_cents: Option<i64>,
) -> ScheduleResponse {
    debug!(
        plan_id = %plan_id,
        sale_total_cents,
        custom_down_payment_cents,
        "calculate_schedule command"
    );

    let terms = match db.inner().plans().active_terms(&plan_id).await {
        Ok(terms) => terms,
        Err(e) => return ScheduleResponse::failed(e.into()),
    };

    match generate_schedule(
        &terms,
        Money::from_cents(sale_total_cents),
        custom_down_payment_cents.map(Money::from_cents),
        config.today(),
    ) {
        Ok(schedule) => ScheduleResponse::ok(schedule, None),
        Err(e) => ScheduleResponse::failed(e.into()),
    }
}

/// Prices a cart (discount cap, tax) and calculates the schedule for the
/// resulting total.
pub async fn preview_cart_schedule(
    db: &DbState,
    config: &ConfigState,
    plan_id: String,
    subtotal_cents: i64,
    discount_bps: u32,
) -> ScheduleResponse {
    debug!(plan_id = %plan_id, subtotal_cents, discount_bps, "preview_cart_schedule command");

    let terms = match db.inner().plans().active_terms(&plan_id).await {
        Ok(terms) => terms,
        Err(e) => return ScheduleResponse::failed(e.into()),
    };

    match preview_for_cart(
        &terms,
        Money::from_cents(subtotal_cents),
        discount_bps,
        config.checkout(),
        config.today(),
    ) {
        Ok(preview) => ScheduleResponse::ok(preview.schedule, Some(preview.totals)),
        Err(e) => ScheduleResponse::failed(e.into()),
    }
}

/// Lists plans offered at checkout.
pub async fn list_plans(db: &DbState) -> Result<Vec<PlanDto>, ApiError> {
    debug!("list_plans command");

    let plans = db.inner().plans().list_active().await?;
    Ok(plans.into_iter().map(PlanDto::from).collect())
}

/// Stores a new plan template.
pub async fn create_plan(db: &DbState, draft: PlanDraft) -> Result<PlanDto, ApiError> {
    debug!(name = %draft.name, "create_plan command");

    let plan = db.inner().plans().insert(&draft).await?;

    info!(plan_id = %plan.id, name = %plan.name, "Installment plan created");
    Ok(plan.into())
}

/// Retires a plan. Existing installments are unaffected.
pub async fn deactivate_plan(db: &DbState, plan_id: String) -> Result<(), ApiError> {
    debug!(plan_id = %plan_id, "deactivate_plan command");

    db.inner().plans().deactivate(&plan_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use cuota_db::{Database, DbConfig};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    async fn setup() -> (DbState, ConfigState, String) {
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
            ConfigState::default().with_today(today()),
            plan.id,
        )
    }

    #[tokio::test]
    async fn test_calculate_schedule() {
        let (db, config, plan_id) = setup().await;

        let response = calculate_schedule(&db, &config, plan_id.clone(), 10_000, None).await;
        assert!(response.success);

        let schedule = response.schedule.unwrap();
        assert_eq!(schedule.plan_id.as_deref(), Some(plan_id.as_str()));
        assert_eq!(schedule.down_payment_cents, 2000);
        let amounts: Vec<i64> = schedule.installments.iter().map(|p| p.amount_cents).collect();
        assert_eq!(amounts, vec![2667, 2667, 2666]);
        assert_eq!(
            schedule.installments[0].due_date,
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
    }

    #[tokio::test]
    async fn test_calculate_schedule_reports_errors_in_band() {
        let (db, config, plan_id) = setup().await;

        let response = calculate_schedule(&db, &config, plan_id, 0, None).await;
        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, ErrorCode::InvalidAmount);

        let response = calculate_schedule(&db, &config, "missing".into(), 10_000, None).await;
        assert_eq!(response.error.unwrap().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_retired_plan_is_rejected() {
        let (db, config, plan_id) = setup().await;
        deactivate_plan(&db, plan_id.clone()).await.unwrap();

        let response = calculate_schedule(&db, &config, plan_id, 10_000, None).await;
        assert_eq!(response.error.unwrap().code, ErrorCode::PlanInactive);
        assert!(list_plans(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_cart_schedule() {
        let (db, config, plan_id) = setup().await;

        // $100.00, 10% off, 8.25% tax on $90.00 = $7.43 (half-up)
        let response = preview_cart_schedule(&db, &config, plan_id, 10_000, 1000).await;
        assert!(response.success);

        let totals = response.totals.unwrap();
        assert_eq!(totals.discount_cents, 1000);
        assert_eq!(totals.tax_cents, 743);
        assert_eq!(totals.total_cents, 9743);

        let schedule = response.schedule.unwrap();
        assert_eq!(schedule.sale_total_cents, 9743);
        let sum: i64 = schedule.installments.iter().map(|p| p.amount_cents).sum();
        assert_eq!(schedule.down_payment_cents + sum, 9743);
    }

    #[tokio::test]
    async fn test_response_shape() {
        let (db, config, plan_id) = setup().await;
        let response = calculate_schedule(&db, &config, plan_id, 10_000, Some(5000)).await;

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["schedule"]["downPaymentCents"], 5000);
        assert_eq!(json["schedule"]["installments"][0]["dueDate"], "2026-01-31");
        assert!(json.get("error").is_none());
    }
}
