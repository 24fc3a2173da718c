//! # Credit Cache Reconciliation
//!
//! Recomputes every customer's cached `credit_cents` from the store credit
//! ledger and reports the customers whose cache had drifted.
//!
//! ## Usage
//! ```bash
//! cargo run -p fomezero-receivables --bin reconcile
//! cargo run -p fomezero-receivables --bin reconcile -- --config ./fomezero.toml
//! FOMEZERO_DATABASE_PATH=./fomezero_dev.db cargo run -p fomezero-receivables --bin reconcile
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show per-entry debug output
//! - Default: INFO level

use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use fomezero_core::Money;
use fomezero_receivables::{Receivables, ReceivablesConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

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
                println!("Fome Zero Credit Reconciliation");
                println!();
                println!("Usage: reconcile [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = ReceivablesConfig::load(config_path)?;
    let receivables = Receivables::open(&config).await?;

    info!(path = %config.database.path.display(), "Reconciling credit caches");
    let drifts = receivables.reconcile_credit_counters().await?;

    if drifts.is_empty() {
        println!("✅ Every cached balance matches the ledger");
    } else {
        println!("⚠️  Fixed {} drifted balance(s):", drifts.len());
        for drift in &drifts {
            println!(
                "   {}  cached {}  ledger {}",
                drift.customer_id,
                Money::from_cents(drift.cached_cents),
                Money::from_cents(drift.ledger_cents)
            );
        }
    }

    receivables.db().close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fomezero=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
