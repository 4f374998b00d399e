//! Operator CLI for the redressal service.
//!
//! The HTTP surface lives elsewhere; this binary covers the operator-side
//! actions: running a batch auto-assignment pass, dumping assignment
//! statistics, and checking store health.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redressal::config::RedressalConfig;
use redressal::database::Database;
use redressal::distribution::DistributionEngine;
use redressal::error::{RedressalError, Result};
use redressal::stats::StatsCollector;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing with configurable log levels, e.g.
    //   RUST_LOG=debug           - debug logging for all modules
    //   RUST_LOG=redressal=debug - debug logging for this crate only
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_default();
    if command.is_empty() {
        eprintln!("usage: redressal <auto-assign | stats | health>");
        return Err(RedressalError::InvalidInput("missing command".to_string()));
    }

    let config = RedressalConfig::from_env()?;
    let db = Arc::new(Database::new(&config.database_path).await?);
    tracing::info!(path = %config.database_path, "Database initialized");

    match command.as_str() {
        "auto-assign" => {
            let engine = DistributionEngine::new(db);
            let report = engine.auto_assign_unassigned().await?;
            println!(
                "batch complete: {} total, {} assigned, {} failed",
                report.total, report.assigned, report.failed
            );
            for error in &report.errors {
                println!("  {} (token {}): {}", error.complaint_id, error.token, error.error);
            }
        }
        "stats" => {
            let collector = StatsCollector::new(db);
            let report = collector.assignment_stats().await;
            let json = serde_json::to_string_pretty(&report)?;
            println!("{json}");
        }
        "health" => {
            db.health_check().await?;
            println!("ok");
        }
        other => {
            eprintln!("unknown command: {other}");
            eprintln!("usage: redressal <auto-assign | stats | health>");
            return Err(RedressalError::InvalidInput(format!(
                "unknown command: {other}"
            )));
        }
    }

    Ok(())
}
