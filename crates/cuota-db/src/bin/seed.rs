//! # Seed Data Generator
//!
//! Populates the database with the store's standard installment plans and,
//! optionally, a few demo customers with open schedules.
//!
//! ## Usage
//! ```bash
//! # Plan templates only
//! cargo run -p cuota-db --bin seed
//!
//! # Plans plus demo customers
//! cargo run -p cuota-db --bin seed -- --customers 25
//!
//! # Specify database path
//! cargo run -p cuota-db --bin seed -- --db ./data/cuota.db
//! ```

use chrono::{Days, Utc};
use cuota_core::{generate_schedule, Money, PaymentMethod, PlanDraft, RecordOwner};
use cuota_db::{Database, DbConfig};
use std::env;

/// (name, down payment bps, payments, interval days, interest bps)
const PLANS: &[(&str, u32, i64, i64, u32)] = &[
    ("Layaway 3 x 30 days", 2000, 3, 30, 0),
    ("Layaway 6 x 30 days", 1500, 6, 30, 0),
    ("Weekly 8 x 7 days", 1000, 8, 7, 0),
    ("Biweekly 6 x 14 days", 1000, 6, 14, 250),
    ("Financed 12 x 30 days", 1000, 12, 30, 1200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut customers: usize = 0;
    let mut db_path = String::from("./cuota_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customers = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cuota Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --customers <N>  Demo customers with open schedules (default: 0)");
                println!("  -d, --db <PATH>      Database file path (default: ./cuota_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cuota Seed Data Generator");
    println!("===========================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", customers);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.plans().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} plans", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut plans = Vec::with_capacity(PLANS.len());
    for (name, down, payments, interval, interest) in PLANS {
        let plan = db
            .plans()
            .insert(&PlanDraft {
                name: name.to_string(),
                down_payment_bps: *down,
                number_of_payments: *payments,
                interval_days: *interval,
                interest_rate_bps: *interest,
                is_active: true,
            })
            .await?;
        println!("  + {}", plan.name);
        plans.push(plan);
    }

    if customers > 0 {
        println!();
        println!("Generating demo schedules...");

        // Start some schedules in the past so the overdue views have data
        let today = Utc::now().date_naive();
        for n in 0..customers {
            let plan = &plans[n % plans.len()];
            let start = today
                .checked_sub_days(Days::new(((n * 11) % 90) as u64))
                .unwrap_or(today);
            let total = Money::from_cents(4_999 + ((n * 7_919) % 95_000) as i64);

            let schedule = generate_schedule(&plan.terms(), total, None, start)?;
            db.ledger()
                .record_schedule(
                    &format!("demo-customer-{:03}", n + 1),
                    &schedule,
                    &RecordOwner::Sale(format!("demo-sale-{:03}", n + 1)),
                    PaymentMethod::Cash,
                    start,
                )
                .await?;
        }

        let overdue = db.ledger().overdue_installments(today).await?;
        println!("✓ {} customers, {} installments overdue today", customers, overdue.len());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
