//! # consolidate
//!
//! Batch entry point for duplicate-item consolidation.
//!
//! ## Usage
//! ```bash
//! MEDSTOCK_DB_PATH=./medstock.db cargo run -p medstock-consolidate
//!
//! # Only print the groups that would be merged
//! MEDSTOCK_DRY_RUN=1 cargo run -p medstock-consolidate
//! ```
//!
//! The JSON report goes to stdout, logs to stderr. Exit status is 1 when the
//! run could not start (missing link table, unreadable catalog).

use std::sync::Arc;

use anyhow::Context;
use medstock_consolidate::{ConsolidateConfig, Consolidator};
use medstock_db::{Database, DbConfig};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Consolidation failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ConsolidateConfig::load()?;
    info!(
        path = %config.database_path.display(),
        call_timeout = ?config.call_timeout,
        dry_run = config.dry_run,
        "Configuration loaded"
    );

    // Migrations are not applied here; a missing link table must stop the run.
    let db_config = DbConfig::new(&config.database_path)
        .run_migrations(false)
        .busy_timeout(config.call_timeout);
    let db = Database::new(db_config)
        .await
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, finishing current group");
            let _ = cancel_tx.send(true);
        }
    });

    let engine = Consolidator::new(Arc::new(db.clone()), &config).with_cancellation(cancel_rx);

    if config.dry_run {
        let plan = engine.plan().await?;
        info!(groups = plan.len(), "Dry run, nothing written");
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let report = engine.run().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    db.close().await;
    Ok(())
}

/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,medstock=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
