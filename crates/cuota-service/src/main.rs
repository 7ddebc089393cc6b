//! # Cuota Service Entry Point
//!
//! ## Usage
//! ```bash
//! # Run the service (overdue monitor in the background)
//! cuota serve --config ./cuota.toml
//!
//! # Print today's overdue report as JSON and exit
//! cuota overdue
//!
//! # Write the effective configuration to the config file
//! cuota init-config
//! ```

use std::path::PathBuf;

use cuota_service::config::ServiceConfig;
use cuota_service::state::{ConfigState, DbState};
use cuota_service::{init_tracing, open_database, overdue, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut command = String::from("serve");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cuota installment service");
                println!();
                println!("Usage: cuota [OPTIONS] [COMMAND]");
                println!();
                println!("Commands:");
                println!("  serve        Run the service (default)");
                println!("  overdue      Print the overdue report as JSON");
                println!("  init-config  Write the effective config file");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => command = other.to_string(),
        }
        i += 1;
    }

    init_tracing();

    let config = ServiceConfig::load_or_default(config_path.clone());

    match command.as_str() {
        "serve" => serve(config).await?,
        "overdue" => {
            let db = DbState::new(open_database(&config).await?);
            let today = ConfigState::new(config).today();
            let snapshot = overdue::scan(db.inner(), today).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            db.inner().close().await;
        }
        "init-config" => config.save(config_path)?,
        other => {
            eprintln!("Unknown command: {} (try --help)", other);
            std::process::exit(2);
        }
    }

    Ok(())
}
